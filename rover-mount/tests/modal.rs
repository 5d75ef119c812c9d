use crossbeam_channel::{Receiver, unbounded};
use rover_mount::component::{MODAL_HOST_VIEW, PresentationPhase, VIEW};
use rover_mount::{
    BridgeEvent, BridgeEventKind, ComponentViewRegistry, EventSink, MountConfig,
    MountingCoordinator, Mutation, NativeHost, Props, RecordingHost, Tag, Transaction,
    TransactionQueue,
};
use serde_json::json;

const ROOT: Tag = Tag::new(1);
const MODAL: Tag = Tag::new(2);

fn props(value: serde_json::Value) -> Props {
    Props::from_json(value).unwrap()
}

fn kinds(bridge: &Receiver<BridgeEvent>) -> Vec<BridgeEventKind> {
    bridge.try_iter().map(|event| event.kind).collect()
}

fn phase(
    coordinator: &MountingCoordinator<RecordingHost>,
    tag: Tag,
) -> Option<PresentationPhase> {
    coordinator.view(tag)?.snapshot().presentation
}

/// Mounts a hidden modal under the root
fn mounted_hidden_modal() -> (MountingCoordinator<RecordingHost>, Receiver<BridgeEvent>) {
    let (mut coordinator, bridge) =
        MountingCoordinator::with_recording_host(MountConfig::default(), ROOT);
    let report = coordinator.apply(Transaction::with_mutations(
        1,
        vec![
            Mutation::create(MODAL, MODAL_HOST_VIEW),
            Mutation::insert(ROOT, MODAL, 0),
            Mutation::update_props(MODAL, props(json!({"visible": false}))),
        ],
    ));
    assert!(report.is_clean());
    (coordinator, bridge)
}

#[test]
fn test_hidden_modal_allocates_context_without_presenting() {
    let (coordinator, bridge) = mounted_hidden_modal();

    let presentation = coordinator.host().presentation_for(MODAL).unwrap();
    assert!(!coordinator.host().is_presented(presentation));
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Idle));
    assert!(kinds(&bridge).is_empty());
}

#[test]
fn test_show_external_dismiss_and_reshow() {
    let (mut coordinator, bridge) = mounted_hidden_modal();
    let presentation = coordinator.host().presentation_for(MODAL).unwrap();

    coordinator.apply(Transaction::with_mutations(
        2,
        vec![Mutation::update_props(MODAL, props(json!({"visible": true})))],
    ));
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Presenting));

    coordinator.host_mut().complete_transitions();
    assert_eq!(coordinator.pump(), 1);
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Presented));
    assert_eq!(kinds(&bridge), vec![BridgeEventKind::Show]);

    // Swipe-down on the sheet
    assert!(coordinator.host_mut().dismiss_externally(presentation));
    let report = coordinator.apply(Transaction::new(3));
    assert_eq!(report.callbacks, 1);
    assert_eq!(kinds(&bridge), vec![BridgeEventKind::Dismiss]);
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Dismissed));

    // The bridge has not caught up yet and still says visible
    coordinator.apply(Transaction::with_mutations(
        4,
        vec![Mutation::update_props(
            MODAL,
            props(json!({"visible": true, "animationType": "fade"})),
        )],
    ));
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Dismissed));
    assert!(kinds(&bridge).is_empty());

    coordinator.apply(Transaction::with_mutations(
        5,
        vec![Mutation::update_props(MODAL, props(json!({"visible": false})))],
    ));
    coordinator.apply(Transaction::with_mutations(
        6,
        vec![Mutation::update_props(MODAL, props(json!({"visible": true})))],
    ));
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Presenting));
    assert!(coordinator.host().is_presented(presentation));
}

#[test]
fn test_modal_children_live_in_presentation() {
    let (mut coordinator, _bridge) = mounted_hidden_modal();
    coordinator.apply(Transaction::with_mutations(
        2,
        vec![Mutation::create(Tag(3), VIEW), Mutation::insert(MODAL, Tag(3), 0)],
    ));

    let host = coordinator.host();
    let presentation = host.presentation_for(MODAL).unwrap();
    let root = host.presentation_root(presentation).unwrap();
    let child = coordinator.view(Tag(3)).unwrap().core().native_view();
    let modal = coordinator.view(MODAL).unwrap().core().native_view();

    assert_eq!(host.subviews(root), &[child]);
    assert!(host.subviews(modal).is_empty());
    assert_eq!(host.subviews(host.root_view()), &[modal]);
}

#[test]
fn test_deleting_presented_modal_is_silent() {
    let (mut coordinator, bridge) = mounted_hidden_modal();
    coordinator.apply(Transaction::with_mutations(
        2,
        vec![Mutation::update_props(MODAL, props(json!({"visible": true})))],
    ));
    coordinator.host_mut().complete_transitions();
    coordinator.pump();
    assert_eq!(kinds(&bridge), vec![BridgeEventKind::Show]);

    let report = coordinator.apply(Transaction::with_mutations(
        3,
        vec![Mutation::remove(ROOT, MODAL, 0), Mutation::delete(MODAL)],
    ));
    assert!(report.is_clean());
    assert_eq!(coordinator.host().presentation_count(), 0);
    assert_eq!(coordinator.host().observer_count(), 0);
    assert_eq!(coordinator.registry().pooled(MODAL_HOST_VIEW), 1);

    coordinator.host_mut().complete_transitions();
    coordinator.pump();
    assert!(kinds(&bridge).is_empty());
}

#[test]
fn test_recycled_modal_starts_fresh() {
    let (mut coordinator, bridge) = mounted_hidden_modal();
    coordinator.apply(Transaction::with_mutations(
        2,
        vec![Mutation::remove(ROOT, MODAL, 0), Mutation::delete(MODAL)],
    ));

    // Same pooled instance, new tag, default props (visible)
    coordinator.apply(Transaction::with_mutations(
        3,
        vec![Mutation::create(Tag(5), MODAL_HOST_VIEW), Mutation::insert(ROOT, Tag(5), 0)],
    ));
    assert_eq!(coordinator.registry().pooled(MODAL_HOST_VIEW), 0);
    assert_eq!(phase(&coordinator, Tag(5)), Some(PresentationPhase::Presenting));

    coordinator.host_mut().complete_transitions();
    coordinator.pump();
    assert_eq!(kinds(&bridge), vec![BridgeEventKind::Show]);
    assert!(coordinator.host().presentation_for(MODAL).is_none());
}

#[test]
fn test_missing_surface_reports_dismiss() {
    let (callback_tx, callbacks) = unbounded();
    let (events, bridge) = EventSink::channel();
    let mut host = RecordingHost::new(callback_tx);
    host.set_surface_available(false);
    let config = MountConfig::default();
    let registry = ComponentViewRegistry::with_builtin_components(config.pool_capacity);
    let mut coordinator = MountingCoordinator::new(host, registry, config, events, callbacks, ROOT);

    let report = coordinator.apply(Transaction::with_mutations(
        1,
        vec![Mutation::create(MODAL, MODAL_HOST_VIEW), Mutation::insert(ROOT, MODAL, 0)],
    ));
    assert!(report.is_clean());
    assert_eq!(kinds(&bridge), vec![BridgeEventKind::Dismiss]);
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Dismissed));

    coordinator.host_mut().set_surface_available(true);
    coordinator.apply(Transaction::with_mutations(
        2,
        vec![Mutation::update_props(MODAL, props(json!({"visible": false})))],
    ));
    coordinator.apply(Transaction::with_mutations(
        3,
        vec![Mutation::update_props(MODAL, props(json!({"visible": true})))],
    ));
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Presenting));
}

#[test]
fn test_auto_complete_host_round_trip() {
    let (callback_tx, callbacks) = unbounded();
    let (events, bridge) = EventSink::channel();
    let host = RecordingHost::new(callback_tx).with_auto_complete();
    let config = MountConfig {
        animate_presentations: false,
        ..MountConfig::default()
    };
    let registry = ComponentViewRegistry::with_builtin_components(config.pool_capacity);
    let mut coordinator = MountingCoordinator::new(host, registry, config, events, callbacks, ROOT);

    coordinator.apply(Transaction::with_mutations(
        1,
        vec![
            Mutation::create(MODAL, MODAL_HOST_VIEW),
            Mutation::update_props(MODAL, props(json!({"animationType": "slide"}))),
            Mutation::insert(ROOT, MODAL, 0),
        ],
    ));
    coordinator.pump();
    coordinator.apply(Transaction::with_mutations(
        2,
        vec![Mutation::update_props(MODAL, props(json!({"visible": false})))],
    ));
    coordinator.pump();

    assert_eq!(
        kinds(&bridge),
        vec![BridgeEventKind::Show, BridgeEventKind::Dismiss]
    );
    let presentation = coordinator.host().presentation_for(MODAL).unwrap();
    let options = coordinator.host().presentation_options(presentation).unwrap();
    assert!(!options.animated);
}

/// Shows a modal, lets the platform dismiss it, then queues a hide and a
/// show before the next drain
fn toggle_after_platform_dismiss(coalesce: bool) -> MountingCoordinator<RecordingHost> {
    let config = MountConfig {
        coalesce_transactions: coalesce,
        ..MountConfig::default()
    };
    let (mut coordinator, _bridge) = MountingCoordinator::with_recording_host(config, ROOT);
    coordinator.apply(Transaction::with_mutations(
        1,
        vec![Mutation::create(MODAL, MODAL_HOST_VIEW), Mutation::insert(ROOT, MODAL, 0)],
    ));
    coordinator.host_mut().complete_transitions();
    coordinator.pump();
    let presentation = coordinator.host().presentation_for(MODAL).unwrap();
    coordinator.host_mut().dismiss_externally(presentation);
    coordinator.pump();

    let queue = TransactionQueue::new();
    queue.push(Transaction::with_mutations(
        2,
        vec![Mutation::update_props(MODAL, props(json!({"visible": false})))],
    ));
    queue.push(Transaction::with_mutations(
        3,
        vec![Mutation::update_props(MODAL, props(json!({"visible": true})))],
    ));
    coordinator.drain_queue(&queue);
    coordinator
}

#[test]
fn test_queued_visibility_toggle_survives_coalescing() {
    let plain = toggle_after_platform_dismiss(false);
    let coalesced = toggle_after_platform_dismiss(true);

    let presentation = coalesced.host().presentation_for(MODAL).unwrap();
    assert!(coalesced.host().is_presented(presentation));
    assert_eq!(phase(&coalesced, MODAL), Some(PresentationPhase::Presenting));
    assert_eq!(coalesced.host().describe(), plain.host().describe());
}

#[test]
fn test_moving_shown_modal_keeps_presentation() {
    let (mut coordinator, bridge) =
        MountingCoordinator::with_recording_host(MountConfig::default(), ROOT);
    coordinator.apply(Transaction::with_mutations(
        1,
        vec![
            Mutation::create(Tag(3), VIEW),
            Mutation::create(Tag(4), VIEW),
            Mutation::create(MODAL, MODAL_HOST_VIEW),
            Mutation::insert(ROOT, Tag(3), 0),
            Mutation::insert(ROOT, Tag(4), 1),
            Mutation::insert(Tag(3), MODAL, 0),
        ],
    ));
    coordinator.host_mut().complete_transitions();
    coordinator.pump();
    assert_eq!(kinds(&bridge), vec![BridgeEventKind::Show]);
    let presentation = coordinator.host().presentation_for(MODAL).unwrap();

    let report = coordinator.apply(Transaction::with_mutations(
        2,
        vec![Mutation::remove(Tag(3), MODAL, 0), Mutation::insert(Tag(4), MODAL, 0)],
    ));
    assert!(report.is_clean());
    coordinator.host_mut().complete_transitions();
    coordinator.pump();

    assert!(kinds(&bridge).is_empty());
    assert_eq!(phase(&coordinator, MODAL), Some(PresentationPhase::Presented));
    assert_eq!(coordinator.host().presentation_for(MODAL), Some(presentation));
    assert!(coordinator.host().is_presented(presentation));
    assert_eq!(coordinator.host().observer_count(), 1);

    let modal = coordinator.view(MODAL).unwrap().core().native_view();
    let target = coordinator.view(Tag(4)).unwrap().core().native_view();
    assert_eq!(coordinator.host().subviews(target), &[modal]);
}
