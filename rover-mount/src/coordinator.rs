use crate::component::{ComponentView, MountContext, UpdateMask, VIEW, ViewComponentView};
use crate::config::MountConfig;
use crate::error::MountError;
use crate::events::{BridgeEvent, EventSink};
use crate::host::{NativeCallback, NativeHost, RecordingHost};
use crate::layout::LayoutMetrics;
use crate::mutation::{ComponentType, Mutation, Transaction};
use crate::props::{Props, State};
use crate::queue::{TransactionQueue, coalesce_with};
use crate::registry::ComponentViewRegistry;
use crate::revision::TreeRevision;
use crate::tag::Tag;
use crossbeam_channel::{Receiver, unbounded};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace, warn};

/// Outcome of applying one transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub revision: u64,
    pub applied: usize,
    pub skipped: usize,
    /// Native callbacks handled before the transaction
    pub callbacks: usize,
    pub errors: Vec<MountError>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// Tags touched during one transaction, in first-touch order
#[derive(Default)]
struct Touched {
    order: Vec<Tag>,
    masks: HashMap<Tag, UpdateMask>,
    /// Children of this transaction's inserts
    reinserted: HashSet<Tag>,
    /// Removed children kept mounted until their re-insert lands
    moving: Vec<Tag>,
}

impl Touched {
    fn mark(&mut self, tag: Tag) -> &mut UpdateMask {
        if !self.masks.contains_key(&tag) {
            self.order.push(tag);
        }
        self.masks.entry(tag).or_default()
    }
}

/// Applies mutation transactions to the live native hierarchy.
///
/// Owns the tag to component view map and the registry pool. Everything
/// runs on the thread that owns the coordinator; background producers hand
/// transactions over through a [`TransactionQueue`] and the host reports
/// native callbacks over a channel that is drained before every
/// transaction.
pub struct MountingCoordinator<H: NativeHost> {
    host: H,
    config: MountConfig,
    registry: ComponentViewRegistry,
    views: HashMap<Tag, Box<dyn ComponentView>>,
    /// child -> parent for every attached tag
    parents: HashMap<Tag, Tag>,
    root: Tag,
    events: EventSink,
    callbacks: Receiver<NativeCallback>,
    last_revision: Option<u64>,
}

impl MountingCoordinator<RecordingHost> {
    /// Coordinator over an in-memory host with the builtin components.
    /// Returns the bridge event receiver alongside.
    pub fn with_recording_host(
        config: MountConfig,
        root: Tag,
    ) -> (Self, Receiver<BridgeEvent>) {
        let (callback_tx, callback_rx) = unbounded();
        let (events, bridge) = EventSink::channel();
        let registry = ComponentViewRegistry::with_builtin_components(config.pool_capacity);
        let coordinator = Self::new(
            RecordingHost::new(callback_tx),
            registry,
            config,
            events,
            callback_rx,
            root,
        );
        (coordinator, bridge)
    }
}

impl<H: NativeHost> MountingCoordinator<H> {
    pub fn new(
        host: H,
        registry: ComponentViewRegistry,
        config: MountConfig,
        events: EventSink,
        callbacks: Receiver<NativeCallback>,
        root: Tag,
    ) -> Self {
        let mut root_view = ViewComponentView::adopt(VIEW, host.root_view());
        root_view.core_mut().associate(root);
        let mut views: HashMap<Tag, Box<dyn ComponentView>> = HashMap::new();
        views.insert(root, Box::new(root_view));

        let mut coordinator = Self {
            host,
            config,
            registry,
            views,
            parents: HashMap::new(),
            root,
            events,
            callbacks,
            last_revision: None,
        };
        coordinator.with_view(root, |view, ctx| view.mount(ctx));
        debug!(%root, "mounting coordinator ready");
        coordinator
    }

    pub fn root(&self) -> Tag {
        self.root
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentViewRegistry {
        &self.registry
    }

    pub fn last_revision(&self) -> Option<u64> {
        self.last_revision
    }

    pub fn view(&self, tag: Tag) -> Option<&dyn ComponentView> {
        self.views.get(&tag).map(|view| view.as_ref())
    }

    pub fn parent_of(&self, tag: Tag) -> Option<Tag> {
        self.parents.get(&tag).copied()
    }

    pub fn children_of(&self, tag: Tag) -> Option<Vec<Tag>> {
        self.views
            .get(&tag)
            .map(|view| view.core().children().iter().map(|c| c.tag).collect())
    }

    /// Tags currently in the live hierarchy, root included
    pub fn mounted_tags(&self) -> BTreeSet<Tag> {
        self.views
            .iter()
            .filter(|(_, view)| view.lifecycle().is_mounted())
            .map(|(tag, _)| *tag)
            .collect()
    }

    /// Every tag with an associated instance, mounted or not
    pub fn live_tags(&self) -> BTreeSet<Tag> {
        self.views.keys().copied().collect()
    }

    /// Handles pending native callbacks. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(callback) = self.callbacks.try_recv() {
            handled += 1;
            let tag = callback.tag;
            if self
                .with_view(tag, |view, ctx| view.handle_native_callback(ctx, &callback))
                .is_none()
            {
                trace!(%tag, kind = ?callback.kind, "native callback for a dead tag");
            }
        }
        handled
    }

    /// Applies every queued transaction in production order
    pub fn drain_queue(&mut self, queue: &TransactionQueue) -> Vec<ApplyReport> {
        let taken = queue.take_all(false);
        let transactions = if self.config.coalesce_transactions {
            let keeps_props = self.edge_triggered_tags(&taken);
            coalesce_with(taken, |tag| keeps_props.contains(&tag))
        } else {
            taken
        };
        transactions
            .into_iter()
            .map(|transaction| self.apply(transaction))
            .collect()
    }

    /// Tags whose live view, or any queued Create, is of a type that reacts
    /// to prop transitions
    fn edge_triggered_tags(&self, queued: &[Transaction]) -> HashSet<Tag> {
        let live = self
            .views
            .iter()
            .filter(|(_, view)| self.registry.is_edge_triggered(view.core().component()))
            .map(|(tag, _)| *tag);
        let created = queued
            .iter()
            .flat_map(|transaction| &transaction.mutations)
            .filter_map(|mutation| match mutation {
                Mutation::Create { tag, component }
                    if self.registry.is_edge_triggered(component) =>
                {
                    Some(*tag)
                }
                _ => None,
            });
        live.chain(created).collect()
    }

    pub fn apply(&mut self, transaction: Transaction) -> ApplyReport {
        let mut report = ApplyReport {
            revision: transaction.revision,
            callbacks: self.pump(),
            ..ApplyReport::default()
        };
        if let Some(last) = self.last_revision {
            if transaction.revision != 0 && transaction.revision <= last {
                warn!(
                    revision = transaction.revision,
                    last, "transaction revision is not newer than the last applied"
                );
            }
        }

        let mut touched = Touched {
            reinserted: transaction
                .mutations
                .iter()
                .filter_map(|mutation| match mutation {
                    Mutation::Insert { child, .. } => Some(*child),
                    _ => None,
                })
                .collect(),
            ..Touched::default()
        };
        for mutation in transaction.phased() {
            trace!(op = mutation.name(), tag = %mutation.target(), "applying mutation");
            match self.apply_mutation(mutation, &mut touched) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    warn!(
                        revision = transaction.revision,
                        op = mutation.name(),
                        %err,
                        "skipping mutation"
                    );
                    report.skipped += 1;
                    report.errors.push(err);
                }
            }
        }

        for tag in std::mem::take(&mut touched.moving) {
            if !self.parents.contains_key(&tag) {
                debug!(%tag, "moved tag was never re-inserted, unmounting");
                self.unmount_subtree(tag);
            }
        }

        for tag in touched.order {
            let mask = touched.masks.get(&tag).copied().unwrap_or_default();
            self.with_view(tag, |view, ctx| view.finalize_updates(ctx, mask));
        }

        if transaction.revision != 0 {
            self.last_revision = Some(transaction.revision);
        }
        debug!(
            revision = report.revision,
            applied = report.applied,
            skipped = report.skipped,
            callbacks = report.callbacks,
            "applied transaction"
        );
        report
    }

    /// Unmounts everything and mounts `revision` from scratch
    pub fn rebuild(&mut self, revision: &TreeRevision) -> ApplyReport {
        if revision.root_tag() != self.root {
            warn!(
                expected = %self.root,
                got = %revision.root_tag(),
                "revision root differs from the surface root"
            );
        }
        self.teardown();
        self.apply(revision.initial_transaction())
    }

    /// Removes and deletes every tag except the root and resets the root
    pub fn teardown(&mut self) -> ApplyReport {
        let mut transaction = Transaction::new(0);
        for (child, parent) in &self.parents {
            transaction.push(Mutation::remove(*parent, *child, 0));
        }
        for tag in self.views.keys().filter(|tag| **tag != self.root) {
            transaction.push(Mutation::delete(*tag));
        }
        transaction.push(Mutation::update_props(self.root, Props::empty()));
        transaction.push(Mutation::update_layout(self.root, LayoutMetrics::default()));
        transaction.push(Mutation::update_state(self.root, State::default()));
        let report = self.apply(transaction);
        self.last_revision = None;
        report
    }

    fn apply_mutation(
        &mut self,
        mutation: &Mutation,
        touched: &mut Touched,
    ) -> Result<(), MountError> {
        match mutation {
            Mutation::Create { tag, component } => self.create(*tag, component, touched),
            Mutation::Delete { tag } => self.delete(*tag),
            Mutation::Insert {
                parent,
                child,
                index,
            } => self.insert(*parent, *child, *index, touched),
            Mutation::Remove {
                parent,
                child,
                index,
            } => self.remove(*parent, *child, *index, touched),
            Mutation::UpdateProps { tag, props } => {
                self.require(*tag, "update_props")?;
                touched.mark(*tag).props = true;
                self.with_view(*tag, |view, ctx| {
                    let old = view.core().props().clone();
                    view.update_props(ctx, &old, props.clone());
                });
                Ok(())
            }
            Mutation::UpdateLayout { tag, metrics } => {
                self.require(*tag, "update_layout")?;
                touched.mark(*tag).layout = true;
                self.with_view(*tag, |view, ctx| {
                    let old = *view.core().layout();
                    view.update_layout_metrics(ctx, &old, *metrics);
                });
                Ok(())
            }
            Mutation::UpdateState { tag, state } => {
                self.require(*tag, "update_state")?;
                touched.mark(*tag).state = true;
                self.with_view(*tag, |view, ctx| {
                    let old = view.core().state().clone();
                    view.update_state(ctx, &old, state.clone());
                });
                Ok(())
            }
        }
    }

    fn create(
        &mut self,
        tag: Tag,
        component: &ComponentType,
        touched: &mut Touched,
    ) -> Result<(), MountError> {
        if tag == self.root {
            return Err(MountError::RootTag(tag, "create"));
        }
        if self.views.contains_key(&tag) {
            return Err(MountError::AlreadyCreated(tag));
        }
        let Self {
            host,
            registry,
            events,
            config,
            views,
            ..
        } = self;
        let mut ctx = MountContext::new(host, events, config);
        let mut view = registry.obtain(component, &mut ctx);
        view.core_mut().associate(tag);
        views.insert(tag, view);
        touched.mark(tag);
        Ok(())
    }

    fn delete(&mut self, tag: Tag) -> Result<(), MountError> {
        if tag == self.root {
            return Err(MountError::RootTag(tag, "delete"));
        }
        let child_ref = self
            .views
            .get(&tag)
            .and_then(|view| view.core().as_child())
            .ok_or(MountError::UnknownTag { tag, op: "delete" })?;

        if let Some(parent) = self.parents.remove(&tag) {
            debug!(%tag, %parent, "deleting an attached tag, detaching first");
            self.with_view(parent, |view, ctx| {
                let index = view.core().index_of(tag).unwrap_or(0);
                view.unmount_child(ctx, child_ref, index);
            });
        }
        self.unmount_subtree(tag);

        let Some(mut view) = self.views.remove(&tag) else {
            return Err(MountError::UnknownTag { tag, op: "delete" });
        };
        let Self {
            host,
            registry,
            events,
            config,
            parents,
            ..
        } = self;
        let mut ctx = MountContext::new(host, events, config);
        for (index, child) in view.core().children().to_vec().into_iter().enumerate().rev() {
            debug!(%tag, child = %child.tag, "deleting a tag with children, detaching them");
            view.unmount_child(&mut ctx, child, index);
            parents.remove(&child.tag);
        }
        registry.recycle(view, &mut ctx);
        Ok(())
    }

    fn insert(
        &mut self,
        parent: Tag,
        child: Tag,
        index: usize,
        touched: &mut Touched,
    ) -> Result<(), MountError> {
        if child == self.root {
            return Err(MountError::RootTag(child, "insert"));
        }
        let parent_mounted = self
            .views
            .get(&parent)
            .map(|view| view.lifecycle().is_mounted())
            .ok_or(MountError::UnknownTag {
                tag: parent,
                op: "insert",
            })?;
        let child_ref = self
            .views
            .get(&child)
            .and_then(|view| view.core().as_child())
            .ok_or(MountError::UnknownTag {
                tag: child,
                op: "insert",
            })?;
        if let Some(current) = self.parents.get(&child) {
            return Err(MountError::AlreadyParented {
                child,
                parent: *current,
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(MountError::WouldCycle { parent, child });
        }

        self.with_view(parent, |view, ctx| {
            if index > view.core().children().len() {
                debug!(%parent, %child, index, "insert index past the end, clamping");
            }
            view.mount_child(ctx, child_ref, index);
        });
        self.parents.insert(child, parent);
        if parent_mounted {
            self.mount_subtree(child);
        } else {
            // A moved subtree landing under a detached parent
            self.unmount_subtree(child);
        }
        touched.mark(parent).children = true;
        touched.mark(child);
        Ok(())
    }

    fn remove(
        &mut self,
        parent: Tag,
        child: Tag,
        index: usize,
        touched: &mut Touched,
    ) -> Result<(), MountError> {
        if child == self.root {
            return Err(MountError::RootTag(child, "remove"));
        }
        self.require(parent, "remove")?;
        let child_ref = self
            .views
            .get(&child)
            .and_then(|view| view.core().as_child())
            .ok_or(MountError::UnknownTag {
                tag: child,
                op: "remove",
            })?;
        if self.parents.get(&child) != Some(&parent) {
            return Err(MountError::NotAChild { parent, child });
        }

        self.with_view(parent, |view, ctx| {
            let actual = view.core().index_of(child).unwrap_or(index);
            if actual != index {
                debug!(
                    %parent,
                    %child,
                    index,
                    actual,
                    "remove index mismatch, using actual position"
                );
            }
            view.unmount_child(ctx, child_ref, actual);
        });
        self.parents.remove(&child);
        if touched.reinserted.contains(&child) {
            touched.moving.push(child);
        } else {
            self.unmount_subtree(child);
        }
        touched.mark(parent).children = true;
        Ok(())
    }

    fn require(&self, tag: Tag, op: &'static str) -> Result<(), MountError> {
        if self.views.contains_key(&tag) {
            Ok(())
        } else {
            Err(MountError::UnknownTag { tag, op })
        }
    }

    /// Whether `ancestor` is `of` or one of its parents
    fn is_ancestor(&self, ancestor: Tag, of: Tag) -> bool {
        let mut cursor = Some(of);
        while let Some(tag) = cursor {
            if tag == ancestor {
                return true;
            }
            cursor = self.parents.get(&tag).copied();
        }
        false
    }

    fn mount_subtree(&mut self, tag: Tag) {
        let mut stack = vec![tag];
        while let Some(tag) = stack.pop() {
            let children = self.with_view(tag, |view, ctx| {
                view.mount(ctx);
                view.core().children().iter().map(|c| c.tag).collect::<Vec<_>>()
            });
            stack.extend(children.into_iter().flatten().rev());
        }
    }

    fn unmount_subtree(&mut self, tag: Tag) {
        let mut stack = vec![tag];
        while let Some(tag) = stack.pop() {
            let children = self.with_view(tag, |view, ctx| {
                view.unmount(ctx);
                view.core().children().iter().map(|c| c.tag).collect::<Vec<_>>()
            });
            stack.extend(children.into_iter().flatten().rev());
        }
    }

    /// Runs `f` against the view for `tag` with a mount context borrowed
    /// from the coordinator. `None` when the tag is not live.
    fn with_view<R>(
        &mut self,
        tag: Tag,
        f: impl FnOnce(&mut dyn ComponentView, &mut MountContext<'_>) -> R,
    ) -> Option<R> {
        let Self {
            host,
            views,
            events,
            config,
            ..
        } = self;
        let view = views.get_mut(&tag)?;
        let mut ctx = MountContext::new(host, events, config);
        Some(f(view.as_mut(), &mut ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Lifecycle;
    use crate::host::NativeViewId;
    use serde_json::json;

    fn coordinator() -> MountingCoordinator<RecordingHost> {
        MountingCoordinator::with_recording_host(MountConfig::default(), Tag(1)).0
    }

    fn native(c: &MountingCoordinator<RecordingHost>, tag: u32) -> NativeViewId {
        c.view(Tag(tag)).unwrap().core().native_view()
    }

    #[test]
    fn test_create_insert_mounts() {
        let mut c = coordinator();
        let report = c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(2), Tag(3), 0),
            ],
        ));

        assert!(report.is_clean());
        assert_eq!(report.applied, 4);
        assert_eq!(c.mounted_tags(), BTreeSet::from([Tag(1), Tag(2), Tag(3)]));
        assert_eq!(c.parent_of(Tag(3)), Some(Tag(2)));
        assert_eq!(c.host().subviews(c.host().root_view()), &[native(&c, 2)]);
        assert_eq!(c.host().subviews(native(&c, 2)), &[native(&c, 3)]);
    }

    #[test]
    fn test_phase_order_repairs_producer_order() {
        let mut c = coordinator();
        // Insert before Create in producer order still mounts
        let report = c.apply(Transaction::with_mutations(
            1,
            vec![Mutation::insert(Tag(1), Tag(2), 0), Mutation::create(Tag(2), VIEW)],
        ));
        assert!(report.is_clean());
        assert_eq!(c.view(Tag(2)).unwrap().lifecycle(), Lifecycle::Mounted);
    }

    #[test]
    fn test_remove_then_delete_recycles() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            1,
            vec![Mutation::create(Tag(2), VIEW), Mutation::insert(Tag(1), Tag(2), 0)],
        ));
        let report = c.apply(Transaction::with_mutations(
            2,
            vec![Mutation::delete(Tag(2)), Mutation::remove(Tag(1), Tag(2), 0)],
        ));

        assert!(report.is_clean());
        assert!(c.view(Tag(2)).is_none());
        assert_eq!(c.registry().pooled(VIEW), 1);
        assert!(c.host().subviews(c.host().root_view()).is_empty());
    }

    #[test]
    fn test_unknown_tag_is_skipped() {
        let mut c = coordinator();
        let report = c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::update_props(Tag(9), Props::empty()),
                Mutation::create(Tag(2), VIEW),
                Mutation::delete(Tag(8)),
            ],
        ));
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 2);
        assert!(report.errors.contains(&MountError::UnknownTag {
            tag: Tag(9),
            op: "update_props"
        }));
        assert!(c.view(Tag(2)).is_some());
    }

    #[test]
    fn test_structural_repairs() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(2), Tag(3), 0),
            ],
        ));

        let report = c.apply(Transaction::with_mutations(
            2,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::insert(Tag(1), Tag(3), 0),
                Mutation::insert(Tag(3), Tag(2), 0),
                Mutation::delete(Tag(1)),
                Mutation::remove(Tag(1), Tag(3), 0),
            ],
        ));
        assert_eq!(report.applied, 0);
        assert_eq!(
            report.errors,
            vec![
                MountError::NotAChild {
                    parent: Tag(1),
                    child: Tag(3)
                },
                MountError::RootTag(Tag(1), "delete"),
                MountError::AlreadyCreated(Tag(2)),
                MountError::AlreadyParented {
                    child: Tag(3),
                    parent: Tag(2)
                },
                MountError::AlreadyParented {
                    child: Tag(2),
                    parent: Tag(1)
                },
            ]
        );
    }

    #[test]
    fn test_insert_cycle_rejected() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(2), Tag(3), 0),
            ],
        ));
        let report = c.apply(Transaction::with_mutations(
            2,
            vec![Mutation::insert(Tag(3), Tag(2), 0)],
        ));
        assert_eq!(
            report.errors,
            vec![MountError::WouldCycle {
                parent: Tag(3),
                child: Tag(2)
            }]
        );
    }

    #[test]
    fn test_index_clamp_and_mismatched_remove() {
        let mut c = coordinator();
        let report = c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(1), Tag(2), 7),
                Mutation::insert(Tag(1), Tag(3), 9),
            ],
        ));
        assert!(report.is_clean());
        assert_eq!(c.children_of(Tag(1)), Some(vec![Tag(2), Tag(3)]));

        let report = c.apply(Transaction::with_mutations(
            2,
            vec![Mutation::remove(Tag(1), Tag(3), 0)],
        ));
        assert!(report.is_clean());
        assert_eq!(c.children_of(Tag(1)), Some(vec![Tag(2)]));
        assert_eq!(c.view(Tag(3)).unwrap().lifecycle(), Lifecycle::Unmounting);
    }

    #[test]
    fn test_move_uses_post_removal_index() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::create(Tag(4), VIEW),
                Mutation::insert(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(1), Tag(3), 1),
                Mutation::insert(Tag(1), Tag(4), 2),
            ],
        ));
        // Move 2 to the end
        let report = c.apply(Transaction::with_mutations(
            2,
            vec![
                Mutation::insert(Tag(1), Tag(2), 2),
                Mutation::remove(Tag(1), Tag(2), 0),
            ],
        ));
        assert!(report.is_clean());
        assert_eq!(c.children_of(Tag(1)), Some(vec![Tag(3), Tag(4), Tag(2)]));
        assert_eq!(c.view(Tag(2)).unwrap().lifecycle(), Lifecycle::Mounted);
        assert_eq!(
            c.host().subviews(c.host().root_view()),
            &[native(&c, 3), native(&c, 4), native(&c, 2)]
        );
    }

    #[test]
    fn test_move_into_detached_parent_unmounts() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(1), Tag(2), 0),
            ],
        ));
        // 3 is created but never inserted
        let report = c.apply(Transaction::with_mutations(
            2,
            vec![
                Mutation::remove(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(3), Tag(2), 0),
            ],
        ));
        assert!(report.is_clean());
        assert_eq!(c.parent_of(Tag(2)), Some(Tag(3)));
        assert_eq!(c.view(Tag(2)).unwrap().lifecycle(), Lifecycle::Unmounting);
        assert_eq!(c.mounted_tags(), BTreeSet::from([Tag(1)]));
    }

    #[test]
    fn test_failed_reinsert_still_unmounts() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            1,
            vec![Mutation::create(Tag(2), VIEW), Mutation::insert(Tag(1), Tag(2), 0)],
        ));
        let report = c.apply(Transaction::with_mutations(
            2,
            vec![
                Mutation::remove(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(9), Tag(2), 0),
            ],
        ));
        assert_eq!(report.skipped, 1);
        assert_eq!(c.parent_of(Tag(2)), None);
        assert_eq!(c.view(Tag(2)).unwrap().lifecycle(), Lifecycle::Unmounting);
    }

    #[test]
    fn test_delete_attached_with_children() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(2), Tag(3), 0),
            ],
        ));
        let report = c.apply(Transaction::with_mutations(2, vec![Mutation::delete(Tag(2))]));

        assert!(report.is_clean());
        assert!(c.view(Tag(2)).is_none());
        assert_eq!(c.parent_of(Tag(3)), None);
        assert_eq!(c.view(Tag(3)).unwrap().lifecycle(), Lifecycle::Unmounting);
        assert_eq!(c.mounted_tags(), BTreeSet::from([Tag(1)]));
        assert!(c.host().subviews(c.host().root_view()).is_empty());
    }

    #[test]
    fn test_updates_and_finalize() {
        let mut c = coordinator();
        let props = Props::from_json(json!({"opacity": 0.5})).unwrap();
        let report = c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::update_props(Tag(2), props.clone()),
                Mutation::update_state(Tag(2), State::new(json!({"count": 1}))),
                Mutation::insert(Tag(1), Tag(2), 0),
            ],
        ));
        assert!(report.is_clean());

        let view = c.view(Tag(2)).unwrap();
        assert_eq!(view.core().props(), &props);
        assert_eq!(view.core().state().value(), &json!({"count": 1}));
        assert_eq!(view.lifecycle(), Lifecycle::Mounted);
        let record = c.host().view(native(&c, 2)).unwrap();
        assert_eq!(record.attributes.opacity, 0.5);
    }

    #[test]
    fn test_unknown_component_still_mounts_children() {
        let mut c = coordinator();
        let report = c.apply(Transaction::with_mutations(
            1,
            vec![
                Mutation::create(Tag(2), "Slider"),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(2), Tag(3), 0),
            ],
        ));
        assert!(report.is_clean());
        assert!(c.mounted_tags().contains(&Tag(3)));
    }

    #[test]
    fn test_teardown_leaves_root() {
        let mut c = coordinator();
        c.apply(Transaction::with_mutations(
            4,
            vec![
                Mutation::create(Tag(2), VIEW),
                Mutation::create(Tag(3), VIEW),
                Mutation::insert(Tag(1), Tag(2), 0),
                Mutation::insert(Tag(2), Tag(3), 0),
            ],
        ));
        let report = c.teardown();
        assert!(report.is_clean());
        assert_eq!(c.live_tags(), BTreeSet::from([Tag(1)]));
        assert_eq!(c.last_revision(), None);
        assert_eq!(c.registry().pooled(VIEW), 2);
    }
}
