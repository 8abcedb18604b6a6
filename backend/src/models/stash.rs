//! Stash Queue
//!
//! Per-node FIFO of transactions deferred because their target node was
//! unavailable when they were attempted.
//!
//! # Critical Invariants
//!
//! 1. **FIFO per node**: entries leave a queue in the order they entered it.
//! 2. **Exclusive ownership**: an entry lives in exactly one node's queue.
//! 3. **Atomic drain**: `drain` hands back the whole queue and leaves an empty
//!    one behind, so a later push always lands in the next cycle.

use crate::models::node::NodeId;
use crate::models::transaction::{BatchId, Transaction, TransactionId};
use crate::policy::SimulationCase;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Why a transaction was stashed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StashReason {
    /// Target node was down
    NodeUnavailable,

    /// Target node failed its commit write
    WriteFailure,
}

/// A deferred transaction awaiting its node's recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    pub transaction: Transaction,

    /// Node whose recovery releases this entry
    pub stashed_at: NodeId,

    pub reason: StashReason,

    /// Batch the transaction was submitted in
    pub batch: BatchId,

    /// Position of the transaction within its batch
    pub position: usize,

    /// Case governing re-evaluation on retry
    pub case: SimulationCase,

    /// Attempts made so far (the initial attempt counts as one)
    pub attempts: u32,
}

impl StashEntry {
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction.id()
    }
}

/// Per-node FIFO stash
///
/// # Example
///
/// ```rust
/// use crash_recovery_core_rs::models::stash::{StashEntry, StashQueue, StashReason};
/// use crash_recovery_core_rs::policy::SimulationCase;
/// use crash_recovery_core_rs::{NodeId, Transaction};
///
/// let mut stash = StashQueue::new();
/// stash.push(NodeId::ReplicaA, StashEntry {
///     transaction: Transaction::new(1, NodeId::ReplicaA, "DELETE FROM games_frag1"),
///     stashed_at: NodeId::ReplicaA,
///     reason: StashReason::NodeUnavailable,
///     batch: 1,
///     position: 0,
///     case: SimulationCase::Case2,
///     attempts: 1,
/// });
///
/// let drained = stash.drain(NodeId::ReplicaA);
/// assert_eq!(drained.len(), 1);
/// assert!(stash.is_empty(NodeId::ReplicaA));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StashQueue {
    queues: BTreeMap<NodeId, VecDeque<StashEntry>>,
}

impl StashQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` to the tail of `node`'s queue
    ///
    /// The entry is re-homed to `node` if it names a different one.
    pub fn push(&mut self, node: NodeId, mut entry: StashEntry) {
        entry.stashed_at = node;
        self.queues.entry(node).or_default().push_back(entry);
    }

    /// Take every entry for `node`, oldest first, leaving the queue empty
    pub fn drain(&mut self, node: NodeId) -> Vec<StashEntry> {
        self.queues
            .get_mut(&node)
            .map(|queue| std::mem::take(queue).into())
            .unwrap_or_default()
    }

    pub fn is_empty(&self, node: NodeId) -> bool {
        self.len(node) == 0
    }

    pub fn len(&self, node: NodeId) -> usize {
        self.queues.get(&node).map_or(0, VecDeque::len)
    }

    /// Entries across every node
    pub fn total_len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Entries for `node`, oldest first
    pub fn iter(&self, node: NodeId) -> impl Iterator<Item = &StashEntry> {
        self.queues.get(&node).into_iter().flatten()
    }

    /// Whether any node holds the given transaction
    pub fn contains(&self, batch: BatchId, id: TransactionId) -> bool {
        self.queues
            .values()
            .flatten()
            .any(|entry| entry.batch == batch && entry.transaction_id() == id)
    }

    /// Remove one entry from `node`'s queue, keeping the others in order
    pub fn remove(&mut self, node: NodeId, batch: BatchId, id: TransactionId) -> Option<StashEntry> {
        let queue = self.queues.get_mut(&node)?;
        let index = queue
            .iter()
            .position(|entry| entry.batch == batch && entry.transaction_id() == id)?;
        queue.remove(index)
    }
}
