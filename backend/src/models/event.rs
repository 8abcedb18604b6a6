//! Event logging for session replay and auditing.
//!
//! This module defines the Event enum which captures every state transition
//! the coordinator makes. Events enable:
//! - Debugging (understand what happened and in which order)
//! - Auditing (verify that stashed work was retried in FIFO order)
//! - Replay comparison (identical inputs produce identical logs)
//!
//! # Event Types
//!
//! - **Batch**: submission, rejection
//! - **Fault**: Case 1 injection and restoration of Central
//! - **Attempt**: executed, stashed, written through, write failure, abandoned
//! - **Node**: toggles, rejected toggles, stash drains
//!
//! # Example
//!
//! ```rust
//! use crash_recovery_core_rs::models::event::{Event, EventLog};
//! use crash_recovery_core_rs::NodeId;
//!
//! let mut log = EventLog::new();
//! log.log(Event::StashDrained { node: NodeId::ReplicaA, count: 2 });
//!
//! assert_eq!(log.events_for_node(NodeId::ReplicaA).len(), 1);
//! ```

use crate::models::node::{Availability, NodeId};
use crate::models::transaction::{BatchId, TransactionId};
use crate::policy::SimulationCase;
use serde::{Deserialize, Serialize};

/// Coordinator event capturing a state change.
///
/// Events are logged in the order they occur; the position in the log is the
/// event's sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Batch accepted for processing
    BatchSubmitted {
        batch: BatchId,
        case: SimulationCase,
        size: usize,
    },

    /// Batch refused before any processing
    BatchRejected { reason: String },

    /// Case 1 fault injected
    FaultInjected { batch: BatchId, node: NodeId },

    /// Case 1 fault cleared at the end of its batch
    FaultCleared { batch: BatchId, node: NodeId },

    /// Attempt executed (possibly on a node other than the target)
    Executed {
        batch: BatchId,
        tx_id: TransactionId,
        target: NodeId,
        executed_on: NodeId,
        attempt: u32,
    },

    /// Attempt deferred to a node's stash
    Stashed {
        batch: BatchId,
        tx_id: TransactionId,
        node: NodeId,
        attempt: u32,
    },

    /// Write for an unreachable replica applied to another node ahead of replay
    WrittenThrough {
        batch: BatchId,
        tx_id: TransactionId,
        target: NodeId,
        node: NodeId,
        attempt: u32,
    },

    /// Attempt reached its node but the commit write failed
    WriteFailed {
        batch: BatchId,
        tx_id: TransactionId,
        node: NodeId,
        attempt: u32,
    },

    /// Stashed transaction dropped by the operator
    Abandoned {
        batch: BatchId,
        tx_id: TransactionId,
        node: NodeId,
    },

    /// Replica availability changed
    NodeToggled {
        node: NodeId,
        availability: Availability,
    },

    /// Availability change refused; state unchanged
    ToggleRejected {
        node: NodeId,
        requested: Availability,
        reason: String,
    },

    /// Node's stash handed back for retry
    StashDrained { node: NodeId, count: usize },
}

impl Event {
    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BatchSubmitted { .. } => "BatchSubmitted",
            Event::BatchRejected { .. } => "BatchRejected",
            Event::FaultInjected { .. } => "FaultInjected",
            Event::FaultCleared { .. } => "FaultCleared",
            Event::Executed { .. } => "Executed",
            Event::Stashed { .. } => "Stashed",
            Event::WrittenThrough { .. } => "WrittenThrough",
            Event::WriteFailed { .. } => "WriteFailed",
            Event::Abandoned { .. } => "Abandoned",
            Event::NodeToggled { .. } => "NodeToggled",
            Event::ToggleRejected { .. } => "ToggleRejected",
            Event::StashDrained { .. } => "StashDrained",
        }
    }

    /// Batch and transaction the event relates to, if any
    pub fn tx(&self) -> Option<(BatchId, TransactionId)> {
        match self {
            Event::Executed { batch, tx_id, .. }
            | Event::Stashed { batch, tx_id, .. }
            | Event::WrittenThrough { batch, tx_id, .. }
            | Event::WriteFailed { batch, tx_id, .. }
            | Event::Abandoned { batch, tx_id, .. } => Some((*batch, *tx_id)),
            _ => None,
        }
    }

    /// Node the event relates to, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Event::FaultInjected { node, .. }
            | Event::FaultCleared { node, .. }
            | Event::Stashed { node, .. }
            | Event::WrittenThrough { node, .. }
            | Event::WriteFailed { node, .. }
            | Event::Abandoned { node, .. }
            | Event::NodeToggled { node, .. }
            | Event::ToggleRejected { node, .. }
            | Event::StashDrained { node, .. } => Some(*node),
            Event::Executed { executed_on, .. } => Some(*executed_on),
            Event::BatchSubmitted { .. } | Event::BatchRejected { .. } => None,
        }
    }
}

/// Event log for storing and querying coordinator events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// All events in order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events of one type (see `Event::event_type`)
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Events for one transaction
    pub fn events_for_tx(&self, batch: BatchId, tx_id: TransactionId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.tx() == Some((batch, tx_id)))
            .collect()
    }

    /// Events touching one node
    pub fn events_for_node(&self, node: NodeId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.node() == Some(node))
            .collect()
    }
}
