//! Component views: the native-view-owning side of one logical node.
//!
//! Every variant implements [`ComponentView`]. Shared bookkeeping (tag,
//! lifecycle, current props/layout/state, mounted children) lives in
//! [`ViewCore`] and the provided trait methods implement the plain-view
//! behavior on top of it. Variants override only what differs.

mod modal;
mod view;

pub use modal::{AnimationType, ModalHostComponentView, ModalHostProps, PresentationPhase};
pub use view::{Overflow, ViewComponentView, ViewProps};

use crate::config::MountConfig;
use crate::events::{BridgeEventKind, EventSink};
use crate::host::{NativeCallback, NativeHost, NativeViewId, ViewAttribute};
use crate::layout::LayoutMetrics;
use crate::mutation::ComponentType;
use crate::props::{Props, State};
use crate::tag::Tag;
use smallvec::SmallVec;
use tracing::trace;

pub const VIEW: &str = "View";
pub const MODAL_HOST_VIEW: &str = "ModalHostView";

/// Everything a component view may touch while handling an operation
pub struct MountContext<'a> {
    pub host: &'a mut dyn NativeHost,
    pub events: &'a EventSink,
    pub config: &'a MountConfig,
}

impl<'a> MountContext<'a> {
    pub fn new(
        host: &'a mut dyn NativeHost,
        events: &'a EventSink,
        config: &'a MountConfig,
    ) -> Self {
        Self {
            host,
            events,
            config,
        }
    }

    pub fn emit(&self, tag: Tag, kind: BridgeEventKind) {
        self.events.emit(tag, kind);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Pooled, no tag
    Unassociated,
    /// Has a tag but is not inserted anywhere yet
    Created,
    Mounted,
    /// Received prop/layout/state updates this transaction
    Updating,
    /// Removed from its parent, waiting for Delete (or a re-insert)
    Unmounting,
}

impl Lifecycle {
    pub fn is_mounted(self) -> bool {
        matches!(self, Lifecycle::Mounted | Lifecycle::Updating)
    }
}

/// A mounted child as seen by its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildView {
    pub tag: Tag,
    pub native: NativeViewId,
}

/// What changed for a tag during one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateMask {
    pub props: bool,
    pub layout: bool,
    pub state: bool,
    pub children: bool,
}

impl UpdateMask {
    pub fn is_empty(&self) -> bool {
        !(self.props || self.layout || self.state || self.children)
    }
}

/// Observable state of a component view, used to check that a recycled
/// instance is indistinguishable from a fresh one
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub component: ComponentType,
    pub tag: Option<Tag>,
    pub lifecycle: Lifecycle,
    pub props: Props,
    pub layout: LayoutMetrics,
    pub state: State,
    pub children: Vec<Tag>,
    pub registered_callbacks: usize,
    pub presentation: Option<PresentationPhase>,
}

impl ViewSnapshot {
    pub fn is_pristine(&self) -> bool {
        self.tag.is_none()
            && self.lifecycle == Lifecycle::Unassociated
            && self.props.is_empty()
            && self.layout == LayoutMetrics::default()
            && self.state.is_null()
            && self.children.is_empty()
            && self.registered_callbacks == 0
            && matches!(self.presentation, None | Some(PresentationPhase::Idle))
    }
}

/// Bookkeeping shared by all component view variants
#[derive(Debug)]
pub struct ViewCore {
    component: ComponentType,
    native: NativeViewId,
    tag: Option<Tag>,
    lifecycle: Lifecycle,
    props: Props,
    layout: LayoutMetrics,
    state: State,
    children: SmallVec<[ChildView; 4]>,
}

impl ViewCore {
    pub fn new(component: &str, native: NativeViewId) -> Self {
        Self {
            component: component.into(),
            native,
            tag: None,
            lifecycle: Lifecycle::Unassociated,
            props: Props::empty(),
            layout: LayoutMetrics::default(),
            state: State::default(),
            children: SmallVec::new(),
        }
    }

    pub fn component(&self) -> &ComponentType {
        &self.component
    }

    pub fn native_view(&self) -> NativeViewId {
        self.native
    }

    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn layout(&self) -> &LayoutMetrics {
        &self.layout
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn children(&self) -> &[ChildView] {
        &self.children
    }

    pub fn index_of(&self, tag: Tag) -> Option<usize> {
        self.children.iter().position(|c| c.tag == tag)
    }

    pub fn as_child(&self) -> Option<ChildView> {
        self.tag.map(|tag| ChildView {
            tag,
            native: self.native,
        })
    }

    pub(crate) fn associate(&mut self, tag: Tag) {
        self.tag = Some(tag);
        self.lifecycle = Lifecycle::Created;
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        trace!(tag = ?self.tag, from = ?self.lifecycle, to = ?lifecycle, "lifecycle");
        self.lifecycle = lifecycle;
    }

    /// Moves a mounted view into the updating state; other states keep
    /// their lifecycle
    pub(crate) fn begin_update(&mut self) {
        if self.lifecycle == Lifecycle::Mounted {
            self.set_lifecycle(Lifecycle::Updating);
        }
    }

    pub(crate) fn set_props(&mut self, props: Props) {
        self.props = props;
    }

    pub(crate) fn set_layout(&mut self, layout: LayoutMetrics) {
        self.layout = layout;
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// Inserts at `index` clamped to the child count, returns the position used
    pub(crate) fn insert_child(&mut self, index: usize, child: ChildView) -> usize {
        let at = index.min(self.children.len());
        self.children.insert(at, child);
        at
    }

    pub(crate) fn remove_child(&mut self, tag: Tag) -> Option<usize> {
        let at = self.index_of(tag)?;
        self.children.remove(at);
        Some(at)
    }

    pub(crate) fn take_children(&mut self) -> SmallVec<[ChildView; 4]> {
        std::mem::take(&mut self.children)
    }

    /// Detaches children and the view itself, then resets the native view
    /// and all bookkeeping
    pub(crate) fn recycle(&mut self, ctx: &mut MountContext<'_>) {
        for child in self.take_children() {
            ctx.host.remove_from_superview(child.native);
        }
        ctx.host.remove_from_superview(self.native);
        ctx.host.reset_view(self.native);
        self.reset();
    }

    pub(crate) fn reset(&mut self) {
        self.tag = None;
        self.lifecycle = Lifecycle::Unassociated;
        self.props = Props::empty();
        self.layout = LayoutMetrics::default();
        self.state = State::default();
        self.children.clear();
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            component: self.component.clone(),
            tag: self.tag,
            lifecycle: self.lifecycle,
            props: self.props.clone(),
            layout: self.layout,
            state: self.state.clone(),
            children: self.children.iter().map(|c| c.tag).collect(),
            registered_callbacks: 0,
            presentation: None,
        }
    }
}

/// Mounting contract for one logical node's native view.
///
/// Every operation runs on the mounting context. Only the modal variant's
/// presentation transitions have side effects beyond the view tree.
pub trait ComponentView {
    fn core(&self) -> &ViewCore;

    fn core_mut(&mut self) -> &mut ViewCore;

    /// Attached to the live hierarchy. Idempotent.
    fn mount(&mut self, _ctx: &mut MountContext<'_>) {
        let core = self.core_mut();
        if !core.lifecycle().is_mounted() {
            core.set_lifecycle(Lifecycle::Mounted);
        }
    }

    /// Detached from the live hierarchy. Idempotent.
    fn unmount(&mut self, _ctx: &mut MountContext<'_>) {
        let core = self.core_mut();
        if core.lifecycle().is_mounted() {
            core.set_lifecycle(Lifecycle::Unmounting);
        }
    }

    fn mount_child(&mut self, ctx: &mut MountContext<'_>, child: ChildView, index: usize) {
        let core = self.core_mut();
        let at = core.insert_child(index, child);
        ctx.host.insert_subview(core.native_view(), child.native, at);
    }

    fn unmount_child(&mut self, ctx: &mut MountContext<'_>, child: ChildView, _index: usize) {
        if self.core_mut().remove_child(child.tag).is_some() {
            ctx.host.remove_from_superview(child.native);
        }
    }

    fn update_props(&mut self, ctx: &mut MountContext<'_>, old: &Props, new: Props);

    fn update_state(&mut self, _ctx: &mut MountContext<'_>, _old: &State, new: State) {
        let core = self.core_mut();
        core.set_state(new);
        core.begin_update();
    }

    fn update_layout_metrics(
        &mut self,
        ctx: &mut MountContext<'_>,
        old: &LayoutMetrics,
        new: LayoutMetrics,
    ) {
        let native = self.core().native_view();
        if old.frame != new.frame {
            ctx.host.set_frame(native, new.frame);
        }
        if old.display != new.display {
            ctx.host
                .set_attribute(native, ViewAttribute::Hidden(new.is_hidden()));
        }
        let core = self.core_mut();
        core.set_layout(new);
        core.begin_update();
    }

    /// Called once per transaction for every touched tag, after all of its
    /// prop, layout, state and child updates
    fn finalize_updates(&mut self, ctx: &mut MountContext<'_>, mask: UpdateMask) {
        let core = self.core_mut();
        if core.lifecycle() == Lifecycle::Updating {
            core.set_lifecycle(Lifecycle::Mounted);
        }
        if (mask.layout || mask.children) && core.lifecycle().is_mounted() {
            ctx.host.layout_if_needed(core.native_view());
        }
    }

    /// Drops every piece of node-specific configuration so the instance can
    /// go back to the pool. Leaves no child references or callbacks behind.
    fn prepare_for_recycle(&mut self, ctx: &mut MountContext<'_>) {
        self.core_mut().recycle(ctx);
    }

    fn handle_native_callback(&mut self, _ctx: &mut MountContext<'_>, callback: &NativeCallback) {
        trace!(tag = %callback.tag, kind = ?callback.kind, "ignoring native callback");
    }

    fn snapshot(&self) -> ViewSnapshot {
        self.core().snapshot()
    }

    fn tag(&self) -> Option<Tag> {
        self.core().tag()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.core().lifecycle()
    }

    /// Destroys native resources for good (pool overflow, shutdown)
    fn destroy(&mut self, ctx: &mut MountContext<'_>) {
        ctx.host.destroy_view(self.core().native_view());
    }
}
