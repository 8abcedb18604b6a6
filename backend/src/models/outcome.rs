//! Transaction outcomes and the session result aggregator
//!
//! Every attempt at a transaction (the initial attempt and each retry after a
//! recovery) produces exactly one `TransactionOutcome`. The aggregator keeps
//! all of them, not just the latest, so callers can audit the
//! stash → retry history of any transaction.

use crate::models::node::NodeId;
use crate::models::stash::StashEntry;
use crate::models::transaction::{BatchId, IsolationLevel, StatementKind, Transaction, TransactionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Result of a simulated execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    /// Node that actually served the statement (differs from the target when rerouted)
    pub executed_on: NodeId,
    pub kind: StatementKind,
    pub isolation: IsolationLevel,
    pub message: String,
}

/// Terminal failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Node was reached but the commit write failed
    WriteFailure,

    /// Operator dropped the stashed transaction
    Abandoned,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::WriteFailure => write!(f, "write failure: commit could not be written"),
            ErrorKind::Abandoned => write!(f, "abandoned: stashed transaction dropped by operator"),
        }
    }
}

/// Outcome of one attempt at one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Executed { payload: ExecutionPayload },
    Stashed { entry: StashEntry },
    Failed { error: ErrorKind },
}

/// Wire classification of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Executed,
    Stashed,
    Failed,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Executed => "executed",
            OutcomeKind::Stashed => "stashed",
            OutcomeKind::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransactionOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            TransactionOutcome::Executed { .. } => OutcomeKind::Executed,
            TransactionOutcome::Stashed { .. } => OutcomeKind::Stashed,
            TransactionOutcome::Failed { .. } => OutcomeKind::Failed,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, TransactionOutcome::Executed { .. })
    }

    pub fn is_stashed(&self) -> bool {
        matches!(self, TransactionOutcome::Stashed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TransactionOutcome::Failed { .. })
    }
}

/// One recorded attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub batch: BatchId,

    /// Position of the transaction within its batch
    pub position: usize,

    /// 0 for the initial attempt, 1.. for retries
    pub attempt: u32,

    pub transaction: Transaction,
    pub outcome: TransactionOutcome,
}

impl OutcomeRecord {
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction.id()
    }

    fn order_key(&self) -> (BatchId, usize, u32) {
        (self.batch, self.position, self.attempt)
    }
}

/// Overall classification of a set of transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "errors", rename_all = "snake_case")]
pub enum BatchSummary {
    AllSucceeded,

    /// Number of transactions whose latest attempt is Failed or Stashed
    PartialSuccess(usize),

    AllFailed,
}

impl BatchSummary {
    /// Classify a set of latest-attempt outcomes
    ///
    /// An empty set is `AllSucceeded`.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a TransactionOutcome>) -> Self {
        let (mut executed, mut unresolved) = (0usize, 0usize);
        for outcome in outcomes {
            if outcome.is_executed() {
                executed += 1;
            } else {
                unresolved += 1;
            }
        }

        match (executed, unresolved) {
            (_, 0) => BatchSummary::AllSucceeded,
            (0, _) => BatchSummary::AllFailed,
            (_, n) => BatchSummary::PartialSuccess(n),
        }
    }

    /// Human-readable status for the UI
    pub fn status_message(&self, total: usize) -> String {
        match self {
            BatchSummary::AllSucceeded => "Simulation completed successfully".to_string(),
            BatchSummary::PartialSuccess(n) => format!("Partial Success: {} error(s) occurred", n),
            BatchSummary::AllFailed => format!(
                "Simulation failed: all {} transaction(s) failed or were stashed",
                total
            ),
        }
    }
}

/// Running record of every attempt in a session
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    records: Vec<OutcomeRecord>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: OutcomeRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by batch, submission position, then attempt
    pub fn ordered(&self) -> Vec<&OutcomeRecord> {
        let mut ordered: Vec<&OutcomeRecord> = self.records.iter().collect();
        ordered.sort_by_key(|record| record.order_key());
        ordered
    }

    /// Every attempt for one transaction, oldest first
    pub fn history(&self, batch: BatchId, id: TransactionId) -> Vec<&OutcomeRecord> {
        self.records
            .iter()
            .filter(|record| record.batch == batch && record.transaction_id() == id)
            .collect()
    }

    /// Latest attempt for one transaction
    pub fn latest(&self, batch: BatchId, id: TransactionId) -> Option<&OutcomeRecord> {
        self.history(batch, id).into_iter().max_by_key(|record| record.attempt)
    }

    /// Next attempt index for a transaction
    pub fn next_attempt(&self, batch: BatchId, id: TransactionId) -> u32 {
        self.latest(batch, id).map_or(0, |record| record.attempt + 1)
    }

    /// Summary over the latest attempt of every transaction in the session
    pub fn summarize(&self) -> BatchSummary {
        BatchSummary::from_outcomes(self.latest_by_transaction(None).values().map(|r| &r.outcome))
    }

    /// Summary over the latest attempt of every transaction in one batch
    pub fn summarize_batch(&self, batch: BatchId) -> BatchSummary {
        BatchSummary::from_outcomes(
            self.latest_by_transaction(Some(batch))
                .values()
                .map(|r| &r.outcome),
        )
    }

    fn latest_by_transaction(&self, batch: Option<BatchId>) -> BTreeMap<(BatchId, usize), &OutcomeRecord> {
        let mut latest: BTreeMap<(BatchId, usize), &OutcomeRecord> = BTreeMap::new();
        for record in &self.records {
            if batch.is_some_and(|b| b != record.batch) {
                continue;
            }
            let slot = latest.entry((record.batch, record.position)).or_insert(record);
            if record.attempt > slot.attempt {
                *slot = record;
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stash::StashReason;
    use crate::policy::SimulationCase;

    fn executed(tx: &Transaction) -> TransactionOutcome {
        TransactionOutcome::Executed {
            payload: ExecutionPayload {
                executed_on: tx.target(),
                kind: tx.kind(),
                isolation: tx.isolation(),
                message: format!("Query was run on {}.", tx.target()),
            },
        }
    }

    fn stashed(tx: &Transaction, batch: BatchId, position: usize) -> TransactionOutcome {
        TransactionOutcome::Stashed {
            entry: StashEntry {
                transaction: tx.clone(),
                stashed_at: tx.target(),
                reason: StashReason::NodeUnavailable,
                batch,
                position,
                case: SimulationCase::Case2,
                attempts: 1,
            },
        }
    }

    fn record(batch: BatchId, position: usize, attempt: u32, tx: &Transaction, outcome: TransactionOutcome) -> OutcomeRecord {
        OutcomeRecord {
            batch,
            position,
            attempt,
            transaction: tx.clone(),
            outcome,
        }
    }

    #[test]
    fn test_summary_classification() {
        let tx = Transaction::new(1, NodeId::ReplicaA, "SELECT 1");
        let ok = executed(&tx);
        let failed = TransactionOutcome::Failed { error: ErrorKind::WriteFailure };

        assert_eq!(BatchSummary::from_outcomes([&ok, &ok]), BatchSummary::AllSucceeded);
        assert_eq!(BatchSummary::from_outcomes([&ok, &failed]), BatchSummary::PartialSuccess(1));
        assert_eq!(BatchSummary::from_outcomes([&failed]), BatchSummary::AllFailed);
        assert_eq!(BatchSummary::from_outcomes(std::iter::empty()), BatchSummary::AllSucceeded);
    }

    #[test]
    fn test_history_keeps_every_attempt() {
        let tx = Transaction::new(1, NodeId::ReplicaA, "DELETE FROM games_frag1");
        let mut results = ResultAggregator::new();

        results.record(record(1, 0, 0, &tx, stashed(&tx, 1, 0)));
        results.record(record(1, 0, 1, &tx, executed(&tx)));

        let history = results.history(1, 1);
        assert_eq!(history.len(), 2);
        assert!(history[0].outcome.is_stashed());
        assert!(history[1].outcome.is_executed());
        assert_eq!(results.next_attempt(1, 1), 2);
        assert_eq!(results.next_attempt(1, 99), 0);
    }

    #[test]
    fn test_summary_uses_latest_attempt() {
        let a = Transaction::new(1, NodeId::ReplicaA, "DELETE FROM games_frag1");
        let b = Transaction::new(2, NodeId::ReplicaB, "SELECT 1");
        let mut results = ResultAggregator::new();

        results.record(record(1, 0, 0, &a, stashed(&a, 1, 0)));
        results.record(record(1, 1, 0, &b, executed(&b)));
        assert_eq!(results.summarize_batch(1), BatchSummary::PartialSuccess(1));

        results.record(record(1, 0, 1, &a, executed(&a)));
        assert_eq!(results.summarize_batch(1), BatchSummary::AllSucceeded);
        assert_eq!(results.summarize(), BatchSummary::AllSucceeded);
    }

    #[test]
    fn test_ordered_listing_follows_submission_order() {
        let first = Transaction::new(5, NodeId::ReplicaA, "DELETE FROM games_frag1");
        let second = Transaction::new(2, NodeId::ReplicaB, "SELECT 1");
        let mut results = ResultAggregator::new();

        results.record(record(1, 0, 0, &first, stashed(&first, 1, 0)));
        results.record(record(1, 1, 0, &second, executed(&second)));
        results.record(record(1, 0, 1, &first, executed(&first)));

        let order: Vec<_> = results
            .ordered()
            .iter()
            .map(|r| (r.transaction_id(), r.attempt))
            .collect();
        assert_eq!(order, vec![(5, 0), (5, 1), (2, 0)]);
    }

    #[test]
    fn test_outcome_kind_matches_variant() {
        let tx = Transaction::new(1, NodeId::ReplicaA, "DELETE FROM games_frag1");
        assert_eq!(executed(&tx).kind(), OutcomeKind::Executed);
        assert_eq!(stashed(&tx, 1, 0).kind(), OutcomeKind::Stashed);
        assert_eq!(
            TransactionOutcome::Failed { error: ErrorKind::Abandoned }.kind(),
            OutcomeKind::Failed
        );
        assert_eq!(serde_json::to_string(&OutcomeKind::Stashed).unwrap(), "\"stashed\"");
        assert_eq!(OutcomeKind::Failed.to_string(), "failed");
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(
            BatchSummary::AllSucceeded.status_message(3),
            "Simulation completed successfully"
        );
        assert_eq!(
            BatchSummary::PartialSuccess(2).status_message(3),
            "Partial Success: 2 error(s) occurred"
        );
        assert!(BatchSummary::AllFailed.status_message(3).contains("all 3"));
    }
}
