mod recording;

pub use recording::{HostOp, NativeAttributes, NativeViewRecord, RecordingHost};

use crate::error::HostError;
use crate::layout::Rect;
use crate::tag::Tag;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Handle to a platform view owned by a [`NativeHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeViewId(pub u64);

/// Handle to a detached presentation context (an overlay surface)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresentationId(pub u64);

/// A single visual attribute pushed to a native view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAttribute {
    Opacity(f32),
    BackgroundColor(Option<u32>),
    Hidden(bool),
    ClipsToBounds(bool),
    BorderRadius(f32),
    TestId(Option<String>),
    AccessibilityLabel(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Portrait,
    PortraitUpsideDown,
    Landscape,
    LandscapeLeft,
    LandscapeRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationStyle {
    #[default]
    FullScreen,
    PageSheet,
    FormSheet,
    OverFullScreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionStyle {
    #[default]
    CoverVertical,
    CrossDissolve,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresentationOptions {
    pub style: PresentationStyle,
    pub transition: TransitionStyle,
    pub animated: bool,
    pub supported_orientations: Vec<Orientation>,
}

/// Asynchronous notification from the platform about a presentation.
///
/// Hosts send these from whatever thread the platform calls back on; the
/// coordinator only handles them on the mounting context.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCallback {
    pub tag: Tag,
    pub presentation: PresentationId,
    pub kind: NativeCallbackKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeCallbackKind {
    PresentCompleted,
    DismissCompleted,
    /// The platform dismissed the overlay on its own (user gesture, system)
    DismissedExternally,
    /// The user tried to dismiss but the presentation refused
    DismissAttempted,
    OrientationChanged(Orientation),
}

pub type CallbackSender = Sender<NativeCallback>;

/// Platform backend driven by component views.
///
/// All methods are called on the mounting context only. Presentation
/// transitions complete asynchronously: hosts report completion through the
/// [`CallbackSender`] they were built with, addressed to the tag registered
/// with [`NativeHost::observe_presentation`].
pub trait NativeHost {
    /// The surface view the root tag is mounted into
    fn root_view(&self) -> NativeViewId;

    fn create_view(&mut self, class: &str) -> NativeViewId;

    fn destroy_view(&mut self, view: NativeViewId);

    /// Inserts `child` at `index` among `parent`'s subviews, detaching it
    /// from any previous superview first
    fn insert_subview(&mut self, parent: NativeViewId, child: NativeViewId, index: usize);

    /// No-op when the view has no superview
    fn remove_from_superview(&mut self, view: NativeViewId);

    fn set_frame(&mut self, view: NativeViewId, frame: Rect);

    fn set_attribute(&mut self, view: NativeViewId, attribute: ViewAttribute);

    /// Restores frame and attributes to their defaults
    fn reset_view(&mut self, view: NativeViewId);

    fn layout_if_needed(&mut self, view: NativeViewId);

    fn create_presentation(&mut self) -> Result<PresentationId, HostError>;

    /// Root view children of a presentation are attached to
    fn presentation_root(&self, presentation: PresentationId) -> Option<NativeViewId>;

    fn present(
        &mut self,
        presentation: PresentationId,
        options: &PresentationOptions,
    ) -> Result<(), HostError>;

    /// With `animated == false` the overlay is gone when this returns
    fn dismiss(&mut self, presentation: PresentationId, animated: bool) -> Result<(), HostError>;

    fn release_presentation(&mut self, presentation: PresentationId);

    fn observe_presentation(&mut self, presentation: PresentationId, tag: Tag);

    fn unobserve_presentation(&mut self, presentation: PresentationId);
}
