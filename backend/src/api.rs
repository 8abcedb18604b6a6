//! Boundary types exchanged with the UI layer
//!
//! Requests use the field names of the web front end
//! (`simulationCase`, `node`, `query`, `isolation`); responses are flat rows
//! plus a status string so a table renderer needs no knowledge of the
//! outcome union.

use crate::models::node::{Availability, NodeId};
use crate::models::outcome::{BatchSummary, OutcomeKind, OutcomeRecord, TransactionOutcome};
use crate::models::transaction::{BatchId, Transaction, TransactionId};
use crate::policy::SimulationCase;
use serde::{Deserialize, Serialize};

/// Submit a batch of transactions under one failure scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitBatch {
    #[serde(rename = "simulationCase")]
    pub simulation_case: SimulationCase,

    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl SubmitBatch {
    pub fn new(simulation_case: SimulationCase, transactions: Vec<Transaction>) -> Self {
        Self {
            simulation_case,
            transactions,
        }
    }
}

/// Flip a replica's availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleNode {
    pub node: NodeId,
}

/// Set a replica's availability explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAvailability {
    pub node: NodeId,
    pub availability: Availability,
}

/// Drop a stashed transaction instead of retrying it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonStashed {
    pub node: NodeId,
    pub batch: BatchId,
    pub transaction_id: TransactionId,
}

/// One attempt, flattened for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub transaction_id: TransactionId,
    pub batch: BatchId,

    /// Node the transaction targeted
    pub node: NodeId,

    /// Node that served it, when executed
    pub executed_on: Option<NodeId>,

    pub statement: String,
    pub outcome_kind: OutcomeKind,
    pub payload_or_error: String,
    pub attempt_index: u32,
}

impl From<&OutcomeRecord> for OutcomeRow {
    fn from(record: &OutcomeRecord) -> Self {
        let (executed_on, payload_or_error) = match &record.outcome {
            TransactionOutcome::Executed { payload } => (Some(payload.executed_on), payload.message.clone()),
            TransactionOutcome::Stashed { entry } => (
                None,
                format!("{} unavailable; transaction stashed for retry", entry.stashed_at),
            ),
            TransactionOutcome::Failed { error } => (None, error.to_string()),
        };

        Self {
            transaction_id: record.transaction_id(),
            batch: record.batch,
            node: record.transaction.target(),
            executed_on,
            statement: record.transaction.statement().to_string(),
            outcome_kind: record.outcome.kind(),
            payload_or_error,
            attempt_index: record.attempt,
        }
    }
}

/// Response to `SubmitBatch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch: BatchId,
    pub simulation_case: SimulationCase,
    pub summary: BatchSummary,
    pub status_message: String,

    /// Every attempt made while processing the batch, in submission order
    pub outcomes: Vec<OutcomeRow>,
}

/// Response to an availability change or a stash retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleReport {
    pub node: NodeId,
    pub availability: Availability,
    pub status_message: String,

    /// Retry attempts triggered by the node coming back, in stash order
    pub retried: Vec<OutcomeRow>,
}

impl ToggleReport {
    pub(crate) fn new(node: NodeId, availability: Availability, retried: Vec<OutcomeRow>) -> Self {
        let status_message = toggle_status_message(node, availability, &retried);
        Self {
            node,
            availability,
            status_message,
            retried,
        }
    }

    /// Report for a request that matched the node's current availability
    pub(crate) fn unchanged(node: NodeId, availability: Availability) -> Self {
        Self {
            node,
            availability,
            status_message: format!("{} is already {}; nothing changed", node, availability),
            retried: Vec::new(),
        }
    }
}

fn toggle_status_message(node: NodeId, availability: Availability, retried: &[OutcomeRow]) -> String {
    if availability.is_down() {
        return format!("{} is now down; transactions targeting it will be stashed", node);
    }
    if retried.is_empty() {
        return format!("{} is now up; no stashed transactions to retry", node);
    }

    let errors = retried
        .iter()
        .filter(|row| row.outcome_kind != OutcomeKind::Executed)
        .count();
    if errors == 0 {
        format!("Stashed transactions retried successfully on {}", node)
    } else {
        format!(
            "Partial Success: {} error(s) occurred while retrying on {}",
            errors, node
        )
    }
}
