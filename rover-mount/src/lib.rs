//! Mounting layer for rover's native targets.
//!
//! A diff producer turns tree revisions into [`Transaction`]s, the
//! [`MountingCoordinator`] applies them on the mounting thread through
//! pooled [`ComponentView`]s, and those drive a [`NativeHost`].

pub mod component;
pub mod config;
pub mod coordinator;
pub mod diff;
pub mod error;
pub mod events;
pub mod host;
pub mod layout;
pub mod mutation;
pub mod props;
pub mod queue;
pub mod registry;
pub mod revision;
pub mod tag;

// Re-export key types
pub use component::{ComponentView, Lifecycle, MountContext, ViewSnapshot};
pub use config::MountConfig;
pub use coordinator::{ApplyReport, MountingCoordinator};
pub use diff::{Differ, ReferenceDiffer};
pub use error::{DecodeError, HostError, MountError};
pub use events::{BridgeEvent, BridgeEventKind, EventSink};
pub use host::{NativeHost, RecordingHost};
pub use layout::LayoutMetrics;
pub use mutation::{Mutation, Transaction};
pub use props::{Props, State};
pub use queue::TransactionQueue;
pub use registry::ComponentViewRegistry;
pub use revision::{TreeNode, TreeRevision};
pub use tag::{Tag, TagAllocator};
