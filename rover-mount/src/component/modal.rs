use super::{
    ChildView, ComponentView, Lifecycle, MODAL_HOST_VIEW, MountContext, ViewCore, ViewSnapshot,
};
use crate::error::HostError;
use crate::events::BridgeEventKind;
use crate::host::{
    NativeCallback, NativeCallbackKind, NativeHost, NativeViewId, Orientation, PresentationId,
    PresentationOptions, PresentationStyle, TransitionStyle,
};
use crate::layout::{LayoutMetrics, Rect};
use crate::props::Props;
use serde::Deserialize;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationType {
    #[default]
    None,
    Slide,
    Fade,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModalHostProps {
    #[serde(alias = "visibility")]
    pub visible: bool,
    pub animation_type: AnimationType,
    pub presentation_style: PresentationStyle,
    pub transparent: bool,
    pub supported_orientations: Vec<Orientation>,
}

impl Default for ModalHostProps {
    fn default() -> Self {
        Self {
            visible: true,
            animation_type: AnimationType::None,
            presentation_style: PresentationStyle::FullScreen,
            transparent: false,
            supported_orientations: vec![Orientation::Portrait],
        }
    }
}

impl ModalHostProps {
    /// Host options for these props. `animate` is the global switch.
    pub fn presentation_options(&self, animate: bool) -> PresentationOptions {
        let style = if self.transparent {
            PresentationStyle::OverFullScreen
        } else {
            self.presentation_style
        };
        let transition = match self.animation_type {
            AnimationType::Fade => TransitionStyle::CrossDissolve,
            AnimationType::Slide | AnimationType::None => TransitionStyle::CoverVertical,
        };
        PresentationOptions {
            style,
            transition,
            animated: animate && self.animation_type != AnimationType::None,
            supported_orientations: self.supported_orientations.clone(),
        }
    }
}

/// Where the overlay is in its present/dismiss cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationPhase {
    #[default]
    Idle,
    Presenting,
    Presented,
    Dismissing,
    Dismissed,
}

/// Hosts its children in a detached presentation context instead of its
/// parent's view tree.
///
/// The own native view stays in the parent hierarchy as a zero-size
/// placeholder. Children go under the presentation root.
#[derive(Debug)]
pub struct ModalHostComponentView {
    core: ViewCore,
    props: ModalHostProps,
    presentation: Option<PresentationId>,
    phase: PresentationPhase,
    /// A `show` event went out and its `dismiss` has not yet
    shown: bool,
    /// Dismissed by the platform or by a failure; stays down until
    /// `visible` toggles
    suppressed: bool,
    observing: bool,
}

impl ModalHostComponentView {
    pub fn new(host: &mut dyn NativeHost) -> Self {
        let native = host.create_view(MODAL_HOST_VIEW);
        Self {
            core: ViewCore::new(MODAL_HOST_VIEW, native),
            props: ModalHostProps::default(),
            presentation: None,
            phase: PresentationPhase::Idle,
            shown: false,
            suppressed: false,
            observing: false,
        }
    }

    pub fn boxed(host: &mut dyn NativeHost) -> Box<dyn ComponentView> {
        Box::new(Self::new(host))
    }

    pub fn phase(&self) -> PresentationPhase {
        self.phase
    }

    pub fn presentation(&self) -> Option<PresentationId> {
        self.presentation
    }

    pub fn modal_props(&self) -> &ModalHostProps {
        &self.props
    }

    fn options(&self, ctx: &MountContext<'_>) -> PresentationOptions {
        self.props.presentation_options(ctx.config.animate_presentations)
    }

    fn presentation_root(&self, ctx: &MountContext<'_>) -> Option<NativeViewId> {
        self.presentation.and_then(|p| ctx.host.presentation_root(p))
    }

    /// Allocates the presentation context on first use and moves already
    /// mounted children under its root
    fn ensure_presentation(
        &mut self,
        ctx: &mut MountContext<'_>,
    ) -> Result<PresentationId, HostError> {
        if let Some(presentation) = self.presentation {
            return Ok(presentation);
        }
        let Some(tag) = self.core.tag() else {
            return Err(HostError::Platform("modal host has no tag".to_string()));
        };
        let presentation = ctx.host.create_presentation()?;
        ctx.host.observe_presentation(presentation, tag);
        self.presentation = Some(presentation);
        self.observing = true;

        if let Some(root) = ctx.host.presentation_root(presentation) {
            let frame = self.core.layout().frame;
            ctx.host.set_frame(root, Rect::sized(frame.width, frame.height));
            for (index, child) in self.core.children().iter().enumerate() {
                ctx.host.insert_subview(root, child.native, index);
            }
        }
        debug!(%tag, ?presentation, "allocated presentation context");
        Ok(presentation)
    }

    fn reconcile(&mut self, ctx: &mut MountContext<'_>) {
        if !self.core.lifecycle().is_mounted() {
            return;
        }
        let want = self.props.visible && !self.suppressed;
        match self.phase {
            PresentationPhase::Idle | PresentationPhase::Dismissed if want => self.present(ctx),
            PresentationPhase::Presented if !want => self.dismiss(ctx),
            _ => {}
        }
    }

    fn present(&mut self, ctx: &mut MountContext<'_>) {
        let Some(tag) = self.core.tag() else {
            return;
        };
        let options = self.options(ctx);
        let result = self
            .ensure_presentation(ctx)
            .and_then(|p| ctx.host.present(p, &options));
        match result {
            Ok(()) => self.phase = PresentationPhase::Presenting,
            Err(err) => {
                warn!(%tag, %err, "modal presentation failed");
                self.phase = PresentationPhase::Dismissed;
                self.suppressed = true;
                self.shown = false;
                ctx.emit(tag, BridgeEventKind::Dismiss);
            }
        }
    }

    fn dismiss(&mut self, ctx: &mut MountContext<'_>) {
        let (Some(tag), Some(presentation)) = (self.core.tag(), self.presentation) else {
            return;
        };
        let animated = self.options(ctx).animated;
        match ctx.host.dismiss(presentation, animated) {
            Ok(()) => self.phase = PresentationPhase::Dismissing,
            Err(err) => {
                warn!(%tag, %err, "modal dismissal failed");
                self.phase = PresentationPhase::Dismissed;
                self.finish_dismiss(ctx);
            }
        }
    }

    fn finish_dismiss(&mut self, ctx: &mut MountContext<'_>) {
        if let (true, Some(tag)) = (self.shown, self.core.tag()) {
            ctx.emit(tag, BridgeEventKind::Dismiss);
        }
        self.shown = false;
    }

    /// Tears the presentation down without emitting anything
    fn release(&mut self, ctx: &mut MountContext<'_>) {
        let Some(presentation) = self.presentation.take() else {
            return;
        };
        if self.observing {
            ctx.host.unobserve_presentation(presentation);
            self.observing = false;
        }
        if matches!(
            self.phase,
            PresentationPhase::Presenting | PresentationPhase::Presented | PresentationPhase::Dismissing
        ) {
            if let Err(err) = ctx.host.dismiss(presentation, false) {
                trace!(%err, "presentation already gone");
            }
        }
        ctx.host.release_presentation(presentation);
        self.phase = PresentationPhase::Idle;
        self.shown = false;
    }
}

impl ComponentView for ModalHostComponentView {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn mount(&mut self, ctx: &mut MountContext<'_>) {
        if self.core.lifecycle().is_mounted() {
            return;
        }
        self.core.set_lifecycle(Lifecycle::Mounted);
        if let Err(err) = self.ensure_presentation(ctx) {
            warn!(tag = ?self.core.tag(), %err, "could not allocate presentation context");
        }
        self.reconcile(ctx);
    }

    fn unmount(&mut self, ctx: &mut MountContext<'_>) {
        if !self.core.lifecycle().is_mounted() {
            return;
        }
        self.release(ctx);
        self.core.set_lifecycle(Lifecycle::Unmounting);
    }

    fn mount_child(&mut self, ctx: &mut MountContext<'_>, child: ChildView, index: usize) {
        let at = self.core.insert_child(index, child);
        if let Some(root) = self.presentation_root(ctx) {
            ctx.host.insert_subview(root, child.native, at);
        }
    }

    fn unmount_child(&mut self, ctx: &mut MountContext<'_>, child: ChildView, _index: usize) {
        if self.core.remove_child(child.tag).is_some() {
            ctx.host.remove_from_superview(child.native);
        }
    }

    fn update_props(&mut self, ctx: &mut MountContext<'_>, _old: &Props, new: Props) {
        let next: ModalHostProps = new.decode_or(self.core.tag(), &self.props);
        if !next.visible {
            self.suppressed = false;
        }
        self.props = next;
        self.core.set_props(new);
        self.core.begin_update();
        self.reconcile(ctx);
    }

    fn update_layout_metrics(
        &mut self,
        ctx: &mut MountContext<'_>,
        old: &LayoutMetrics,
        new: LayoutMetrics,
    ) {
        if old.frame.width != new.frame.width || old.frame.height != new.frame.height {
            if let Some(root) = self.presentation_root(ctx) {
                ctx.host
                    .set_frame(root, Rect::sized(new.frame.width, new.frame.height));
            }
        }
        self.core.set_layout(new);
        self.core.begin_update();
    }

    fn handle_native_callback(&mut self, ctx: &mut MountContext<'_>, callback: &NativeCallback) {
        if self.presentation != Some(callback.presentation) {
            trace!(
                tag = %callback.tag,
                presentation = ?callback.presentation,
                "stale presentation callback"
            );
            return;
        }
        let tag = callback.tag;
        match (callback.kind, self.phase) {
            (NativeCallbackKind::PresentCompleted, PresentationPhase::Presenting) => {
                self.phase = PresentationPhase::Presented;
                self.shown = true;
                ctx.emit(tag, BridgeEventKind::Show);
                self.reconcile(ctx);
            }
            (NativeCallbackKind::DismissCompleted, PresentationPhase::Dismissing)
            | (NativeCallbackKind::DismissedExternally, PresentationPhase::Dismissing) => {
                self.phase = PresentationPhase::Dismissed;
                self.finish_dismiss(ctx);
                self.reconcile(ctx);
            }
            (
                NativeCallbackKind::DismissedExternally,
                PresentationPhase::Presenting | PresentationPhase::Presented,
            ) => {
                debug!(%tag, "modal dismissed by the platform");
                self.phase = PresentationPhase::Dismissed;
                self.shown = false;
                self.suppressed = true;
                ctx.emit(tag, BridgeEventKind::Dismiss);
            }
            (NativeCallbackKind::DismissAttempted, _) => {
                ctx.emit(tag, BridgeEventKind::RequestClose);
            }
            (NativeCallbackKind::OrientationChanged(orientation), _) => {
                ctx.emit(tag, BridgeEventKind::OrientationChange { orientation });
            }
            (kind, phase) => {
                trace!(%tag, ?kind, ?phase, "ignoring presentation callback");
            }
        }
    }

    fn prepare_for_recycle(&mut self, ctx: &mut MountContext<'_>) {
        self.release(ctx);
        self.core.recycle(ctx);
        self.props = ModalHostProps::default();
        self.phase = PresentationPhase::Idle;
        self.shown = false;
        self.suppressed = false;
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            registered_callbacks: usize::from(self.observing),
            presentation: Some(self.phase),
            ..self.core.snapshot()
        }
    }
}
