use crate::mutation::{Mutation, Transaction, UpdateKind};
use crate::tag::Tag;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Default)]
struct Shared {
    pending: Mutex<VecDeque<Transaction>>,
    ready: Condvar,
}

/// FIFO hand-off of transactions from diff producers to the mounting
/// context. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct TransactionQueue {
    shared: Arc<Shared>,
}

impl TransactionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a transaction to the back of the queue. Callable from any thread.
    pub fn push(&self, transaction: Transaction) {
        trace!(
            revision = transaction.revision,
            mutations = transaction.len(),
            "queued transaction"
        );
        self.shared.pending.lock().push_back(transaction);
        self.shared.ready.notify_one();
    }

    pub fn len(&self) -> usize {
        self.shared.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.pending.lock().is_empty()
    }

    /// Takes everything queued, in production order
    pub fn take_all(&self, coalesce_updates: bool) -> Vec<Transaction> {
        let taken: Vec<Transaction> = self.shared.pending.lock().drain(..).collect();
        if coalesce_updates {
            coalesce(taken)
        } else {
            taken
        }
    }

    /// Blocks until something is queued or `timeout` elapses. Returns
    /// whether the queue is non-empty.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut pending = self.shared.pending.lock();
        if pending.is_empty() {
            self.shared.ready.wait_for(&mut pending, timeout);
        }
        !pending.is_empty()
    }
}

/// Drops updates superseded by a later queued transaction.
///
/// An `UpdateProps`/`UpdateLayout`/`UpdateState` is dropped when a later
/// transaction carries the same kind of update for the same tag and no
/// Create or Delete of that tag lies in between. Transactions left empty are
/// dropped. Structural mutations are never touched.
pub fn coalesce(transactions: Vec<Transaction>) -> Vec<Transaction> {
    coalesce_with(transactions, |_| false)
}

/// [`coalesce`], except that `UpdateProps` for tags where `keeps_props`
/// holds are all kept: their views react to every intermediate value.
pub fn coalesce_with(
    transactions: Vec<Transaction>,
    keeps_props: impl Fn(Tag) -> bool,
) -> Vec<Transaction> {
    let mut superseded: HashSet<(Tag, UpdateKind)> = HashSet::new();
    let mut out: Vec<Transaction> = Vec::with_capacity(transactions.len());

    for mut transaction in transactions.into_iter().rev() {
        let lifecycle_tags: HashSet<Tag> = transaction
            .mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::Create { tag, .. } | Mutation::Delete { tag } => Some(*tag),
                _ => None,
            })
            .collect();

        let before = transaction.len();
        transaction.mutations.retain(|m| match m.update_kind() {
            Some(UpdateKind::Props) if keeps_props(m.target()) => true,
            Some(kind) if !lifecycle_tags.contains(&m.target()) => {
                !superseded.contains(&(m.target(), kind))
            }
            _ => true,
        });
        if transaction.len() != before {
            trace!(
                revision = transaction.revision,
                dropped = before - transaction.len(),
                "coalesced superseded updates"
            );
        }

        // A later update only supersedes earlier ones while the tag's
        // identity is unchanged
        superseded.retain(|(tag, _)| !lifecycle_tags.contains(tag));
        for mutation in &transaction.mutations {
            if let Some(kind) = mutation.update_kind() {
                if !lifecycle_tags.contains(&mutation.target()) {
                    superseded.insert((mutation.target(), kind));
                }
            }
        }

        if !transaction.is_empty() {
            out.push(transaction);
        }
    }

    out.reverse();
    out
}
