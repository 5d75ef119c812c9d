use super::{
    CallbackSender, NativeCallback, NativeCallbackKind, NativeHost, NativeViewId, Orientation,
    PresentationId, PresentationOptions, ViewAttribute,
};
use crate::error::HostError;
use crate::layout::Rect;
use crate::tag::Tag;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write;
use tracing::debug;

/// Operations received by a [`RecordingHost`], in call order
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateView {
        view: NativeViewId,
        class: String,
    },
    DestroyView {
        view: NativeViewId,
    },
    InsertSubview {
        parent: NativeViewId,
        child: NativeViewId,
        index: usize,
    },
    RemoveFromSuperview {
        view: NativeViewId,
    },
    SetFrame {
        view: NativeViewId,
        frame: Rect,
    },
    SetAttribute {
        view: NativeViewId,
        attribute: ViewAttribute,
    },
    ResetView {
        view: NativeViewId,
    },
    LayoutIfNeeded {
        view: NativeViewId,
    },
    CreatePresentation {
        presentation: PresentationId,
    },
    Present {
        presentation: PresentationId,
        options: PresentationOptions,
    },
    Dismiss {
        presentation: PresentationId,
        animated: bool,
    },
    ReleasePresentation {
        presentation: PresentationId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeAttributes {
    pub opacity: f32,
    pub background_color: Option<u32>,
    pub hidden: bool,
    pub clips_to_bounds: bool,
    pub border_radius: f32,
    pub test_id: Option<String>,
    pub accessibility_label: Option<String>,
}

impl Default for NativeAttributes {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            background_color: None,
            hidden: false,
            clips_to_bounds: false,
            border_radius: 0.0,
            test_id: None,
            accessibility_label: None,
        }
    }
}

impl NativeAttributes {
    fn apply(&mut self, attribute: ViewAttribute) {
        match attribute {
            ViewAttribute::Opacity(v) => self.opacity = v,
            ViewAttribute::BackgroundColor(v) => self.background_color = v,
            ViewAttribute::Hidden(v) => self.hidden = v,
            ViewAttribute::ClipsToBounds(v) => self.clips_to_bounds = v,
            ViewAttribute::BorderRadius(v) => self.border_radius = v,
            ViewAttribute::TestId(v) => self.test_id = v,
            ViewAttribute::AccessibilityLabel(v) => self.accessibility_label = v,
        }
    }

    fn is_default(&self) -> bool {
        *self == NativeAttributes::default()
    }
}

#[derive(Debug, Clone)]
pub struct NativeViewRecord {
    pub class: String,
    pub superview: Option<NativeViewId>,
    pub subviews: Vec<NativeViewId>,
    pub frame: Rect,
    pub attributes: NativeAttributes,
    pub layout_passes: usize,
}

#[derive(Debug, Clone)]
struct PresentationRecord {
    root: NativeViewId,
    presented: bool,
    observer: Option<Tag>,
    options: Option<PresentationOptions>,
}

/// In-memory native host. Keeps a real view tree, records every operation
/// and holds presentation transitions until the test (or replay script)
/// completes them.
pub struct RecordingHost {
    views: BTreeMap<NativeViewId, NativeViewRecord>,
    presentations: BTreeMap<PresentationId, PresentationRecord>,
    root: NativeViewId,
    next_view: u64,
    next_presentation: u64,
    callbacks: CallbackSender,
    pending: VecDeque<NativeCallback>,
    ops: Vec<HostOp>,
    surface_available: bool,
    auto_complete: bool,
}

impl RecordingHost {
    pub fn new(callbacks: CallbackSender) -> Self {
        let root = NativeViewId(0);
        let mut views = BTreeMap::new();
        views.insert(root, NativeViewRecord::new("RootView"));
        Self {
            views,
            presentations: BTreeMap::new(),
            root,
            next_view: 1,
            next_presentation: 1,
            callbacks,
            pending: VecDeque::new(),
            ops: Vec::new(),
            surface_available: true,
            auto_complete: false,
        }
    }

    /// Deliver transition completions immediately instead of holding them
    pub fn with_auto_complete(mut self) -> Self {
        self.auto_complete = true;
        self
    }

    /// Simulates a window without a hosting surface; presentations fail
    pub fn set_surface_available(&mut self, available: bool) {
        self.surface_available = available;
    }

    pub fn callback_sender(&self) -> CallbackSender {
        self.callbacks.clone()
    }

    /// Sends every held transition completion. Returns how many were sent.
    pub fn complete_transitions(&mut self) -> usize {
        let mut sent = 0;
        while let Some(callback) = self.pending.pop_front() {
            self.send(callback);
            sent += 1;
        }
        sent
    }

    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    /// Platform-driven dismissal, e.g. a swipe-down on a sheet
    pub fn dismiss_externally(&mut self, presentation: PresentationId) -> bool {
        let Some(record) = self.presentations.get_mut(&presentation) else {
            return false;
        };
        if !record.presented {
            return false;
        }
        record.presented = false;
        if let Some(tag) = record.observer {
            self.send(NativeCallback {
                tag,
                presentation,
                kind: NativeCallbackKind::DismissedExternally,
            });
        }
        true
    }

    pub fn attempt_dismiss(&mut self, presentation: PresentationId) -> bool {
        self.notify(presentation, NativeCallbackKind::DismissAttempted)
    }

    pub fn rotate(&mut self, presentation: PresentationId, orientation: Orientation) -> bool {
        self.notify(
            presentation,
            NativeCallbackKind::OrientationChanged(orientation),
        )
    }

    pub fn presentation_for(&self, tag: Tag) -> Option<PresentationId> {
        self.presentations
            .iter()
            .find(|(_, record)| record.observer == Some(tag))
            .map(|(id, _)| *id)
    }

    pub fn is_presented(&self, presentation: PresentationId) -> bool {
        self.presentations
            .get(&presentation)
            .is_some_and(|record| record.presented)
    }

    pub fn presentation_options(&self, presentation: PresentationId) -> Option<&PresentationOptions> {
        self.presentations
            .get(&presentation)
            .and_then(|record| record.options.as_ref())
    }

    pub fn presentation_count(&self) -> usize {
        self.presentations.len()
    }

    pub fn observer_count(&self) -> usize {
        self.presentations
            .values()
            .filter(|record| record.observer.is_some())
            .count()
    }

    pub fn view(&self, view: NativeViewId) -> Option<&NativeViewRecord> {
        self.views.get(&view)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn subviews(&self, view: NativeViewId) -> &[NativeViewId] {
        self.views
            .get(&view)
            .map(|record| record.subviews.as_slice())
            .unwrap_or(&[])
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Text rendering of the attached view tree and every presentation.
    /// Ids are left out so two hosts with different allocation histories
    /// produce the same text for the same visible state.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_view(&mut out, self.root, 0);
        for record in self.presentations.values() {
            let _ = writeln!(
                out,
                "presentation presented={} observed={}",
                record.presented,
                record.observer.is_some()
            );
            self.describe_view(&mut out, record.root, 1);
        }
        out
    }

    fn describe_view(&self, out: &mut String, view: NativeViewId, depth: usize) {
        let Some(record) = self.views.get(&view) else {
            return;
        };
        let frame = record.frame;
        let _ = write!(
            out,
            "{}{} [{} {} {} {}]",
            "  ".repeat(depth),
            record.class,
            frame.x,
            frame.y,
            frame.width,
            frame.height
        );
        if !record.attributes.is_default() {
            let _ = write!(out, " {:?}", record.attributes);
        }
        out.push('\n');
        for child in &record.subviews {
            self.describe_view(out, *child, depth + 1);
        }
    }

    fn notify(&mut self, presentation: PresentationId, kind: NativeCallbackKind) -> bool {
        let Some(tag) = self
            .presentations
            .get(&presentation)
            .filter(|record| record.presented)
            .and_then(|record| record.observer)
        else {
            return false;
        };
        self.send(NativeCallback {
            tag,
            presentation,
            kind,
        });
        true
    }

    fn queue_transition(&mut self, presentation: PresentationId, kind: NativeCallbackKind) {
        let Some(tag) = self
            .presentations
            .get(&presentation)
            .and_then(|record| record.observer)
        else {
            return;
        };
        let callback = NativeCallback {
            tag,
            presentation,
            kind,
        };
        if self.auto_complete {
            self.send(callback);
        } else {
            self.pending.push_back(callback);
        }
    }

    fn send(&self, callback: NativeCallback) {
        if self.callbacks.send(callback).is_err() {
            debug!("callback receiver dropped, discarding native callback");
        }
    }

    fn detach(&mut self, view: NativeViewId) {
        let Some(parent) = self.views.get_mut(&view).and_then(|r| r.superview.take()) else {
            return;
        };
        if let Some(parent) = self.views.get_mut(&parent) {
            parent.subviews.retain(|v| *v != view);
        }
    }

    fn allocate_view(&mut self, class: &str) -> NativeViewId {
        let id = NativeViewId(self.next_view);
        self.next_view += 1;
        self.views.insert(id, NativeViewRecord::new(class));
        id
    }
}

impl NativeViewRecord {
    fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
            superview: None,
            subviews: Vec::new(),
            frame: Rect::default(),
            attributes: NativeAttributes::default(),
            layout_passes: 0,
        }
    }
}

impl NativeHost for RecordingHost {
    fn root_view(&self) -> NativeViewId {
        self.root
    }

    fn create_view(&mut self, class: &str) -> NativeViewId {
        let view = self.allocate_view(class);
        self.ops.push(HostOp::CreateView {
            view,
            class: class.to_string(),
        });
        view
    }

    fn destroy_view(&mut self, view: NativeViewId) {
        self.detach(view);
        if let Some(record) = self.views.remove(&view) {
            for child in record.subviews {
                if let Some(child) = self.views.get_mut(&child) {
                    child.superview = None;
                }
            }
        }
        self.ops.push(HostOp::DestroyView { view });
    }

    fn insert_subview(&mut self, parent: NativeViewId, child: NativeViewId, index: usize) {
        if !self.views.contains_key(&parent) || !self.views.contains_key(&child) {
            debug!(?parent, ?child, "insert_subview on a destroyed view");
            return;
        }
        self.detach(child);
        if let Some(record) = self.views.get_mut(&parent) {
            let at = index.min(record.subviews.len());
            record.subviews.insert(at, child);
        }
        if let Some(record) = self.views.get_mut(&child) {
            record.superview = Some(parent);
        }
        self.ops.push(HostOp::InsertSubview {
            parent,
            child,
            index,
        });
    }

    fn remove_from_superview(&mut self, view: NativeViewId) {
        self.detach(view);
        self.ops.push(HostOp::RemoveFromSuperview { view });
    }

    fn set_frame(&mut self, view: NativeViewId, frame: Rect) {
        if let Some(record) = self.views.get_mut(&view) {
            record.frame = frame;
        }
        self.ops.push(HostOp::SetFrame { view, frame });
    }

    fn set_attribute(&mut self, view: NativeViewId, attribute: ViewAttribute) {
        if let Some(record) = self.views.get_mut(&view) {
            record.attributes.apply(attribute.clone());
        }
        self.ops.push(HostOp::SetAttribute { view, attribute });
    }

    fn reset_view(&mut self, view: NativeViewId) {
        if let Some(record) = self.views.get_mut(&view) {
            record.frame = Rect::default();
            record.attributes = NativeAttributes::default();
        }
        self.ops.push(HostOp::ResetView { view });
    }

    fn layout_if_needed(&mut self, view: NativeViewId) {
        if let Some(record) = self.views.get_mut(&view) {
            record.layout_passes += 1;
        }
        self.ops.push(HostOp::LayoutIfNeeded { view });
    }

    fn create_presentation(&mut self) -> Result<PresentationId, HostError> {
        if !self.surface_available {
            return Err(HostError::NoHostingSurface);
        }
        let presentation = PresentationId(self.next_presentation);
        self.next_presentation += 1;
        let root = self.allocate_view("PresentationRoot");
        self.presentations.insert(
            presentation,
            PresentationRecord {
                root,
                presented: false,
                observer: None,
                options: None,
            },
        );
        self.ops.push(HostOp::CreatePresentation { presentation });
        Ok(presentation)
    }

    fn presentation_root(&self, presentation: PresentationId) -> Option<NativeViewId> {
        self.presentations.get(&presentation).map(|r| r.root)
    }

    fn present(
        &mut self,
        presentation: PresentationId,
        options: &PresentationOptions,
    ) -> Result<(), HostError> {
        if !self.surface_available {
            return Err(HostError::NoHostingSurface);
        }
        let record = self
            .presentations
            .get_mut(&presentation)
            .ok_or(HostError::UnknownPresentation(presentation))?;
        if record.presented {
            return Err(HostError::AlreadyPresented(presentation));
        }
        record.presented = true;
        record.options = Some(options.clone());
        self.ops.push(HostOp::Present {
            presentation,
            options: options.clone(),
        });
        self.queue_transition(presentation, NativeCallbackKind::PresentCompleted);
        Ok(())
    }

    fn dismiss(&mut self, presentation: PresentationId, animated: bool) -> Result<(), HostError> {
        let record = self
            .presentations
            .get_mut(&presentation)
            .ok_or(HostError::UnknownPresentation(presentation))?;
        if !record.presented {
            return Err(HostError::NotPresented(presentation));
        }
        record.presented = false;
        self.ops.push(HostOp::Dismiss {
            presentation,
            animated,
        });
        self.queue_transition(presentation, NativeCallbackKind::DismissCompleted);
        Ok(())
    }

    fn release_presentation(&mut self, presentation: PresentationId) {
        if let Some(record) = self.presentations.remove(&presentation) {
            let subviews = self
                .views
                .get(&record.root)
                .map(|r| r.subviews.clone())
                .unwrap_or_default();
            for child in subviews {
                self.detach(child);
            }
            self.views.remove(&record.root);
        }
        self.ops.push(HostOp::ReleasePresentation { presentation });
    }

    fn observe_presentation(&mut self, presentation: PresentationId, tag: Tag) {
        if let Some(record) = self.presentations.get_mut(&presentation) {
            record.observer = Some(tag);
        }
    }

    fn unobserve_presentation(&mut self, presentation: PresentationId) {
        if let Some(record) = self.presentations.get_mut(&presentation) {
            record.observer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_insert_and_remove_subviews() {
        let (tx, _rx) = unbounded();
        let mut host = RecordingHost::new(tx);
        let root = host.root_view();
        let a = host.create_view("View");
        let b = host.create_view("View");

        host.insert_subview(root, a, 0);
        host.insert_subview(root, b, 0);
        assert_eq!(host.subviews(root), &[b, a]);

        // Re-inserting moves rather than duplicates
        host.insert_subview(root, a, 0);
        assert_eq!(host.subviews(root), &[a, b]);

        host.remove_from_superview(a);
        assert_eq!(host.subviews(root), &[b]);
        assert_eq!(host.view(a).unwrap().superview, None);
    }

    #[test]
    fn test_presentation_transitions_are_held() {
        let (tx, rx) = unbounded();
        let mut host = RecordingHost::new(tx);
        let p = host.create_presentation().unwrap();
        host.observe_presentation(p, Tag(3));

        host.present(p, &PresentationOptions::default()).unwrap();
        assert!(host.is_presented(p));
        assert!(rx.try_recv().is_err());
        assert_eq!(host.pending_transitions(), 1);

        assert_eq!(host.complete_transitions(), 1);
        let callback = rx.try_recv().unwrap();
        assert_eq!(callback.tag, Tag(3));
        assert_eq!(callback.kind, NativeCallbackKind::PresentCompleted);
    }

    #[test]
    fn test_present_twice_fails() {
        let (tx, _rx) = unbounded();
        let mut host = RecordingHost::new(tx);
        let p = host.create_presentation().unwrap();

        host.present(p, &PresentationOptions::default()).unwrap();
        assert_eq!(
            host.present(p, &PresentationOptions::default()),
            Err(HostError::AlreadyPresented(p))
        );
    }

    #[test]
    fn test_no_surface() {
        let (tx, _rx) = unbounded();
        let mut host = RecordingHost::new(tx);
        host.set_surface_available(false);
        assert_eq!(host.create_presentation(), Err(HostError::NoHostingSurface));
    }

    #[test]
    fn test_external_dismiss_notifies_observer() {
        let (tx, rx) = unbounded();
        let mut host = RecordingHost::new(tx).with_auto_complete();
        let p = host.create_presentation().unwrap();
        host.observe_presentation(p, Tag(9));
        host.present(p, &PresentationOptions::default()).unwrap();
        let _ = rx.try_recv();

        assert!(host.dismiss_externally(p));
        assert!(!host.dismiss_externally(p));
        let callback = rx.try_recv().unwrap();
        assert_eq!(callback.kind, NativeCallbackKind::DismissedExternally);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_release_detaches_children() {
        let (tx, _rx) = unbounded();
        let mut host = RecordingHost::new(tx);
        let p = host.create_presentation().unwrap();
        let root = host.presentation_root(p).unwrap();
        let child = host.create_view("View");
        host.insert_subview(root, child, 0);

        host.release_presentation(p);
        assert!(host.view(root).is_none());
        assert_eq!(host.view(child).unwrap().superview, None);
    }
}
