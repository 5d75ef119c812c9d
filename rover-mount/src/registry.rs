use crate::component::{
    ComponentView, MODAL_HOST_VIEW, ModalHostComponentView, MountContext, VIEW, ViewComponentView,
};
use crate::host::NativeHost;
use crate::mutation::ComponentType;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Builds a fresh, unassociated component view
pub type ComponentConstructor = fn(&mut dyn NativeHost) -> Box<dyn ComponentView>;

/// Factory table from component type to constructor, plus a bounded pool of
/// recycled instances per type
pub struct ComponentViewRegistry {
    constructors: HashMap<ComponentType, ComponentConstructor>,
    /// Types whose views react to prop transitions, not just final values
    edge_triggered: HashSet<ComponentType>,
    pools: HashMap<ComponentType, Vec<Box<dyn ComponentView>>>,
    capacity: usize,
}

impl ComponentViewRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            constructors: HashMap::new(),
            edge_triggered: HashSet::new(),
            pools: HashMap::new(),
            capacity,
        }
    }

    /// Registry with `View` and `ModalHostView` registered
    pub fn with_builtin_components(capacity: usize) -> Self {
        let mut registry = Self::new(capacity);
        registry.register(VIEW, ViewComponentView::boxed);
        registry.register_edge_triggered(MODAL_HOST_VIEW, ModalHostComponentView::boxed);
        registry
    }

    /// Registers (or replaces) the constructor for a component type
    pub fn register(&mut self, component: &str, constructor: ComponentConstructor) {
        if self
            .constructors
            .insert(component.into(), constructor)
            .is_some()
        {
            debug!(component, "replaced component constructor");
        }
        self.edge_triggered.remove(component);
    }

    /// Registers a type whose views act on prop transitions, such as a
    /// modal that only re-presents after `visible` goes false and back to
    /// true. Queued prop updates for these tags are never coalesced.
    pub fn register_edge_triggered(
        &mut self,
        component: &str,
        constructor: ComponentConstructor,
    ) {
        self.register(component, constructor);
        self.edge_triggered.insert(component.into());
    }

    pub fn is_edge_triggered(&self, component: &str) -> bool {
        self.edge_triggered.contains(component)
    }

    pub fn is_registered(&self, component: &str) -> bool {
        self.constructors.contains_key(component)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pooled instances currently held for `component`
    pub fn pooled(&self, component: &str) -> usize {
        self.pools.get(component).map_or(0, Vec::len)
    }

    /// Returns an unassociated instance for `component`, reusing a pooled
    /// one when available. Unknown types get a plain-view stand-in.
    pub fn obtain(
        &mut self,
        component: &str,
        ctx: &mut MountContext<'_>,
    ) -> Box<dyn ComponentView> {
        if let Some(mut view) = self.pools.get_mut(component).and_then(Vec::pop) {
            if !view.snapshot().is_pristine() {
                warn!(component, "pooled view was not reset, recycling again");
                view.prepare_for_recycle(ctx);
            }
            return view;
        }
        match self.constructors.get(component) {
            Some(constructor) => constructor(&mut *ctx.host),
            None => {
                warn!(component, "no component view registered, using a plain view");
                Box::new(ViewComponentView::unimplemented(&mut *ctx.host, component))
            }
        }
    }

    /// Resets `view` and returns it to its pool. Views beyond the pool
    /// capacity have their native resources destroyed instead.
    pub fn recycle(&mut self, mut view: Box<dyn ComponentView>, ctx: &mut MountContext<'_>) {
        view.prepare_for_recycle(ctx);
        let component = view.core().component().clone();
        let pool = self.pools.entry(component).or_default();
        if pool.len() < self.capacity {
            pool.push(view);
        } else {
            debug!(component = %view.core().component(), "pool full, destroying view");
            view.destroy(ctx);
        }
    }

    /// Fills the pool for `component` up to `count` instances (bounded by
    /// the capacity). Returns how many were created.
    pub fn preallocate(
        &mut self,
        component: &str,
        count: usize,
        ctx: &mut MountContext<'_>,
    ) -> usize {
        let Some(constructor) = self.constructors.get(component).copied() else {
            warn!(component, "cannot preallocate an unregistered component");
            return 0;
        };
        let target = count.min(self.capacity);
        let pool = self.pools.entry(component.into()).or_default();
        let mut created = 0;
        while pool.len() < target {
            pool.push(constructor(&mut *ctx.host));
            created += 1;
        }
        created
    }

    /// Destroys every pooled instance
    pub fn drain(&mut self, ctx: &mut MountContext<'_>) {
        for (_, pool) in self.pools.drain() {
            for mut view in pool {
                view.destroy(ctx);
            }
        }
    }
}
