use super::{ComponentView, MountContext, VIEW, ViewCore};
use crate::host::{NativeHost, ViewAttribute};
use crate::props::Props;
use serde::Deserialize;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
}

/// Typed props of a plain view
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewProps {
    pub opacity: f32,
    pub background_color: Option<u32>,
    pub overflow: Overflow,
    pub border_radius: f32,
    #[serde(rename = "testID")]
    pub test_id: Option<String>,
    pub accessibility_label: Option<String>,
}

impl Default for ViewProps {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            background_color: None,
            overflow: Overflow::Visible,
            border_radius: 0.0,
            test_id: None,
            accessibility_label: None,
        }
    }
}

impl ViewProps {
    /// Native attributes that differ between `self` and `next`
    pub fn diff(&self, next: &ViewProps) -> SmallVec<[ViewAttribute; 4]> {
        let mut changes = SmallVec::new();
        if self.opacity != next.opacity {
            changes.push(ViewAttribute::Opacity(next.opacity));
        }
        if self.background_color != next.background_color {
            changes.push(ViewAttribute::BackgroundColor(next.background_color));
        }
        if self.overflow != next.overflow {
            changes.push(ViewAttribute::ClipsToBounds(next.overflow != Overflow::Visible));
        }
        if self.border_radius != next.border_radius {
            changes.push(ViewAttribute::BorderRadius(next.border_radius));
        }
        if self.test_id != next.test_id {
            changes.push(ViewAttribute::TestId(next.test_id.clone()));
        }
        if self.accessibility_label != next.accessibility_label {
            changes.push(ViewAttribute::AccessibilityLabel(
                next.accessibility_label.clone(),
            ));
        }
        changes
    }
}

/// The plain container view every other component builds on
#[derive(Debug)]
pub struct ViewComponentView {
    core: ViewCore,
    props: ViewProps,
}

impl ViewComponentView {
    pub fn new(host: &mut dyn NativeHost) -> Self {
        Self::with_class(host, VIEW)
    }

    pub fn boxed(host: &mut dyn NativeHost) -> Box<dyn ComponentView> {
        Box::new(Self::new(host))
    }

    /// Stand-in for a component type nobody registered. Behaves like a
    /// plain view so the subtree below it still mounts.
    pub fn unimplemented(host: &mut dyn NativeHost, component: &str) -> Self {
        Self::with_class(host, component)
    }

    /// Wraps an existing native view, used for the surface root
    pub fn adopt(component: &str, native: crate::host::NativeViewId) -> Self {
        Self {
            core: ViewCore::new(component, native),
            props: ViewProps::default(),
        }
    }

    pub fn view_props(&self) -> &ViewProps {
        &self.props
    }

    fn with_class(host: &mut dyn NativeHost, component: &str) -> Self {
        let native = host.create_view(component);
        Self::adopt(component, native)
    }
}

impl ComponentView for ViewComponentView {
    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn update_props(&mut self, ctx: &mut MountContext<'_>, _old: &Props, new: Props) {
        let next: ViewProps = new.decode_or(self.core.tag(), &self.props);
        let native = self.core.native_view();
        for attribute in self.props.diff(&next) {
            ctx.host.set_attribute(native, attribute);
        }
        self.props = next;
        self.core.set_props(new);
        self.core.begin_update();
    }

    fn prepare_for_recycle(&mut self, ctx: &mut MountContext<'_>) {
        self.core.recycle(ctx);
        self.props = ViewProps::default();
    }
}
