use crate::host::Orientation;
use crate::tag::Tag;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Semantic events sent from component views to the declarative bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeEventKind {
    Show,
    Dismiss,
    RequestClose,
    OrientationChange { orientation: Orientation },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeEvent {
    pub tag: Tag,
    #[serde(flatten)]
    pub kind: BridgeEventKind,
    /// Milliseconds since the sink was created
    pub timestamp_ms: u64,
}

impl BridgeEvent {
    pub fn is_dismiss(&self) -> bool {
        self.kind == BridgeEventKind::Dismiss
    }
}

/// Sending half of the bridge event channel. The bridge consumes
/// asynchronously and never acknowledges.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Sender<BridgeEvent>,
    started: Instant,
}

impl EventSink {
    pub fn new(sender: Sender<BridgeEvent>) -> Self {
        Self {
            sender,
            started: Instant::now(),
        }
    }

    pub fn channel() -> (EventSink, Receiver<BridgeEvent>) {
        let (sender, receiver) = unbounded();
        (EventSink::new(sender), receiver)
    }

    pub fn emit(&self, tag: Tag, kind: BridgeEventKind) {
        let event = BridgeEvent {
            tag,
            kind,
            timestamp_ms: self.started.elapsed().as_millis() as u64,
        };
        debug!(%tag, ?kind, "bridge event");
        if self.sender.send(event).is_err() {
            debug!(%tag, "bridge receiver dropped, discarding event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_fifo() {
        let (sink, rx) = EventSink::channel();

        sink.emit(Tag(1), BridgeEventKind::Show);
        sink.emit(Tag(2), BridgeEventKind::Dismiss);
        sink.emit(Tag(3), BridgeEventKind::RequestClose);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].tag, Tag(1));
        assert_eq!(events[1].tag, Tag(2));
        assert!(events[1].is_dismiss());
        assert_eq!(events[2].kind, BridgeEventKind::RequestClose);
        assert!(events[0].timestamp_ms <= events[2].timestamp_ms);
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        // Must not panic
        sink.emit(Tag(1), BridgeEventKind::Dismiss);
    }

    #[test]
    fn test_event_json() {
        let event = BridgeEvent {
            tag: Tag(4),
            kind: BridgeEventKind::OrientationChange {
                orientation: Orientation::LandscapeLeft,
            },
            timestamp_ms: 12,
        };
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({
                "tag": 4,
                "kind": "orientation_change",
                "orientation": "landscape-left",
                "timestamp_ms": 12
            })
        );
    }
}
