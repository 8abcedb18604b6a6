//! Coordinator Engine
//!
//! Per-session state machine integrating all components:
//! - Node availability (NodeRegistry)
//! - Fault decisions (SimulationCasePolicy)
//! - Deferred work (StashQueue)
//! - Outcome history (ResultAggregator)
//! - Event logging (complete session history)
//!
//! # Architecture
//!
//! ```text
//! submit_batch(case, transactions):
//! 0. Validate the whole batch (reject before any state change)
//! 1. Apply the case's fault injection (Case 1: Central down)
//! 2. For each transaction in submission order:
//!    a. Decide against a registry snapshot
//!    b. Proceed/Reroute → execute, StashUnavailable → stash, FailAtWrite → fail
//!    c. Record the outcome (attempt 0)
//! 3. Case 1: restore Central, which is a recovery event for Central
//!
//! set_availability(node, Up):
//! 1. Drain node's stash
//! 2. Re-run 2a-2c for each entry in FIFO order (attempt n+1)
//! ```
//!
//! # Example
//!
//! ```rust
//! use crash_recovery_core_rs::coordinator::{Coordinator, CoordinatorConfig};
//! use crash_recovery_core_rs::policy::SimulationCase;
//! use crash_recovery_core_rs::{Availability, NodeId, OutcomeKind, SubmitBatch, Transaction};
//!
//! let mut coordinator = Coordinator::new(CoordinatorConfig::default()).unwrap();
//! coordinator.set_availability(NodeId::ReplicaA, Availability::Down).unwrap();
//!
//! let report = coordinator
//!     .submit_batch(SubmitBatch::new(
//!         SimulationCase::Case2,
//!         vec![Transaction::new(1, NodeId::ReplicaA, "UPDATE games_frag1 SET price = 5")],
//!     ))
//!     .unwrap();
//! assert_eq!(report.outcomes[0].outcome_kind, OutcomeKind::Stashed);
//!
//! let recovery = coordinator.set_availability(NodeId::ReplicaA, Availability::Up).unwrap();
//! assert_eq!(recovery.retried[0].outcome_kind, OutcomeKind::Executed);
//! ```

use crate::api::{BatchReport, OutcomeRow, SubmitBatch, ToggleReport};
use crate::models::event::{Event, EventLog};
use crate::models::node::{Availability, NodeId};
use crate::models::outcome::{ErrorKind, ExecutionPayload, OutcomeRecord, ResultAggregator, TransactionOutcome};
use crate::models::registry::{NodeRegistry, RegistryError};
use crate::models::stash::{StashEntry, StashQueue, StashReason};
use crate::models::transaction::{validate_batch, BatchId, IsolationLevel, Transaction, TransactionError, TransactionId};
use crate::policy::{self, FaultDecision, RoutingRules, SimulationCase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete coordinator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Failover rerouting rules (all off by default)
    #[serde(default)]
    pub routing: RoutingRules,
}

impl CoordinatorConfig {
    /// Configuration with fragment failover and read fallback enabled
    pub fn with_failover() -> Self {
        Self {
            routing: RoutingRules::with_failover(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routing.validate().map_err(ConfigError::InvalidRouting)
    }
}

/// Configuration validation error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid routing: {0}")]
    InvalidRouting(String),
}

/// Coordinator error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("No stashed transaction {tx_id} from batch {batch} on {node}")]
    StashEntryNotFound {
        node: NodeId,
        batch: BatchId,
        tx_id: TransactionId,
    },
}

/// A write applied to a node's simulated storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedWrite {
    pub batch: BatchId,
    pub tx_id: TransactionId,
    pub statement: String,
    pub isolation: IsolationLevel,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Crash-and-recovery coordinator for one session
///
/// All mutating operations take `&mut self`, so events for a session are
/// serialized by construction. Sessions share nothing; see `SessionManager`
/// for hosting several of them concurrently.
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: CoordinatorConfig,

    /// Node availability
    registry: NodeRegistry,

    /// Per-node deferred transactions
    stash: StashQueue,

    /// Every attempt made in this session
    results: ResultAggregator,

    /// Event log (all state transitions)
    event_log: EventLog,

    /// Writes applied per node
    commit_logs: BTreeMap<NodeId, Vec<CommittedWrite>>,

    /// Id assigned to the next accepted batch
    next_batch: BatchId,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        config.validate()?;

        Ok(Self {
            config,
            registry: NodeRegistry::new(),
            stash: StashQueue::new(),
            results: ResultAggregator::new(),
            event_log: EventLog::new(),
            commit_logs: BTreeMap::new(),
            next_batch: 1,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn availability(&self, node: NodeId) -> Availability {
        self.registry.availability(node)
    }

    pub fn stash(&self) -> &StashQueue {
        &self.stash
    }

    pub fn results(&self) -> &ResultAggregator {
        &self.results
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Writes applied to `node`, oldest first
    pub fn commit_log(&self, node: NodeId) -> &[CommittedWrite] {
        self.commit_logs.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ordered rows for every attempt in the session
    pub fn outcome_rows(&self) -> Vec<OutcomeRow> {
        self.results.ordered().into_iter().map(OutcomeRow::from).collect()
    }

    // ========================================================================
    // Batch Submission
    // ========================================================================

    /// Process a batch under one simulation case
    ///
    /// # Errors
    ///
    /// `MalformedTransaction` if any transaction is invalid; nothing is
    /// processed and no state changes in that case. Failed and stashed
    /// transactions are outcomes, not errors.
    pub fn submit_batch(&mut self, request: SubmitBatch) -> Result<BatchReport, CoordinatorError> {
        let SubmitBatch {
            simulation_case: case,
            transactions,
        } = request;

        if let Err(err) = validate_batch(&transactions) {
            warn!(case = %case, error = %err, "batch rejected");
            self.event_log.log(Event::BatchRejected {
                reason: err.to_string(),
            });
            return Err(err.into());
        }

        let batch = self.next_batch;
        self.next_batch += 1;

        info!(
            batch,
            case = %case,
            scenario = case.description(),
            size = transactions.len(),
            "processing batch"
        );
        self.event_log.log(Event::BatchSubmitted {
            batch,
            case,
            size: transactions.len(),
        });

        // STEP 1: FAULT INJECTION
        let central_injected = case.injects_central_fault();
        if central_injected {
            self.registry.inject_central(Availability::Down);
            self.event_log.log(Event::FaultInjected {
                batch,
                node: NodeId::Central,
            });
        }

        // STEP 2: DECIDE AND APPLY, IN SUBMISSION ORDER
        for (position, tx) in transactions.into_iter().enumerate() {
            self.attempt(case, tx, batch, position, 0);
        }

        // STEP 3: CENTRAL FAULT IS BATCH-SCOPED
        if central_injected {
            self.registry.inject_central(Availability::Up);
            self.event_log.log(Event::FaultCleared {
                batch,
                node: NodeId::Central,
            });
            self.recover(NodeId::Central);
        }

        let outcomes: Vec<OutcomeRow> = self
            .results
            .ordered()
            .into_iter()
            .filter(|record| record.batch == batch)
            .map(OutcomeRow::from)
            .collect();
        let summary = self.results.summarize_batch(batch);
        let transaction_count = outcomes.iter().filter(|row| row.attempt_index == 0).count();

        info!(batch, ?summary, "batch complete");

        Ok(BatchReport {
            batch,
            simulation_case: case,
            summary,
            status_message: summary.status_message(transaction_count),
            outcomes,
        })
    }

    // ========================================================================
    // Availability Changes
    // ========================================================================

    /// Set a replica's availability
    ///
    /// A successful transition to Up is a recovery event: the node's stash is
    /// drained and every entry is retried in FIFO order. Requesting the
    /// current availability changes nothing and logs no event.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` when both replicas would be down, or
    /// `CentralNotOperatorControlled`. State is unchanged on error.
    pub fn set_availability(
        &mut self,
        node: NodeId,
        availability: Availability,
    ) -> Result<ToggleReport, CoordinatorError> {
        let previous = self.registry.availability(node);
        if let Err(err) = self.registry.set_availability(node, availability) {
            warn!(node = %node, requested = %availability, error = %err, "availability change rejected");
            self.event_log.log(Event::ToggleRejected {
                node,
                requested: availability,
                reason: err.to_string(),
            });
            return Err(err.into());
        }

        if previous == availability {
            debug!(node = %node, availability = %availability, "availability unchanged");
            return Ok(ToggleReport::unchanged(node, availability));
        }

        info!(node = %node, availability = %availability, "node availability changed");
        self.event_log.log(Event::NodeToggled { node, availability });

        let retried = if availability.is_up() {
            self.recover(node)
        } else {
            Vec::new()
        };

        Ok(ToggleReport::new(
            node,
            availability,
            retried.iter().map(OutcomeRow::from).collect(),
        ))
    }

    /// Flip a replica's availability
    pub fn toggle_node(&mut self, node: NodeId) -> Result<ToggleReport, CoordinatorError> {
        let next = self.registry.availability(node).flipped();
        self.set_availability(node, next)
    }

    /// Drop a stashed transaction instead of retrying it
    ///
    /// Records a `Failed { Abandoned }` attempt so the history shows how the
    /// transaction was resolved.
    pub fn abandon(
        &mut self,
        node: NodeId,
        batch: BatchId,
        tx_id: TransactionId,
    ) -> Result<OutcomeRow, CoordinatorError> {
        let entry = self
            .stash
            .remove(node, batch, tx_id)
            .ok_or(CoordinatorError::StashEntryNotFound { node, batch, tx_id })?;

        info!(node = %node, batch, tx_id, "stashed transaction abandoned");
        self.event_log.log(Event::Abandoned { batch, tx_id, node });

        let record = OutcomeRecord {
            batch,
            position: entry.position,
            attempt: self.results.next_attempt(batch, tx_id),
            transaction: entry.transaction,
            outcome: TransactionOutcome::Failed {
                error: ErrorKind::Abandoned,
            },
        };
        self.results.record(record.clone());

        Ok(OutcomeRow::from(&record))
    }

    // ========================================================================
    // Attempt Processing
    // ========================================================================

    /// Drain `node`'s stash and retry each entry in FIFO order
    fn recover(&mut self, node: NodeId) -> Vec<OutcomeRecord> {
        let entries = self.stash.drain(node);
        if entries.is_empty() {
            return Vec::new();
        }

        info!(node = %node, count = entries.len(), "retrying stashed transactions");
        self.event_log.log(Event::StashDrained {
            node,
            count: entries.len(),
        });

        entries
            .into_iter()
            .map(|entry| {
                let attempt = self.results.next_attempt(entry.batch, entry.transaction_id());
                self.attempt(entry.case, entry.transaction, entry.batch, entry.position, attempt)
            })
            .collect()
    }

    /// Decide and apply one attempt, recording its outcome
    fn attempt(
        &mut self,
        case: SimulationCase,
        tx: Transaction,
        batch: BatchId,
        position: usize,
        attempt: u32,
    ) -> OutcomeRecord {
        let snapshot = self.registry.snapshot();
        let decision = policy::decide(case, &tx, &snapshot, &self.config.routing);
        let target = tx.target();

        debug!(batch, tx_id = tx.id(), target = %target, attempt, ?decision, "fault decision");

        let outcome = match decision {
            FaultDecision::Proceed => self.execute(&tx, target, batch, attempt),
            FaultDecision::Reroute(node) => self.execute(&tx, node, batch, attempt),
            FaultDecision::StashUnavailable => {
                if case == SimulationCase::Case2 {
                    if let Some(node) = self.config.routing.write_through_target(&tx, &snapshot) {
                        self.write_through(&tx, node, batch, attempt);
                    }
                }

                let entry = StashEntry {
                    transaction: tx.clone(),
                    stashed_at: target,
                    reason: StashReason::NodeUnavailable,
                    batch,
                    position,
                    case,
                    attempts: attempt + 1,
                };
                self.stash.push(target, entry.clone());
                self.event_log.log(Event::Stashed {
                    batch,
                    tx_id: tx.id(),
                    node: target,
                    attempt,
                });
                TransactionOutcome::Stashed { entry }
            }
            FaultDecision::FailAtWrite => {
                self.event_log.log(Event::WriteFailed {
                    batch,
                    tx_id: tx.id(),
                    node: target,
                    attempt,
                });
                TransactionOutcome::Failed {
                    error: ErrorKind::WriteFailure,
                }
            }
        };

        let record = OutcomeRecord {
            batch,
            position,
            attempt,
            transaction: tx,
            outcome,
        };
        self.results.record(record.clone());
        record
    }

    /// Apply a write for an unreachable replica to `node` ahead of its replay
    fn write_through(&mut self, tx: &Transaction, node: NodeId, batch: BatchId, attempt: u32) {
        debug!(batch, tx_id = tx.id(), target = %tx.target(), node = %node, "write-through");

        self.commit(tx, node, batch);
        self.event_log.log(Event::WrittenThrough {
            batch,
            tx_id: tx.id(),
            target: tx.target(),
            node,
            attempt,
        });
    }

    fn commit(&mut self, tx: &Transaction, node: NodeId, batch: BatchId) {
        self.commit_logs.entry(node).or_default().push(CommittedWrite {
            batch,
            tx_id: tx.id(),
            statement: tx.statement().to_string(),
            isolation: tx.isolation(),
        });
    }

    /// Simulated execution on `node`
    fn execute(&mut self, tx: &Transaction, node: NodeId, batch: BatchId, attempt: u32) -> TransactionOutcome {
        if tx.is_write() {
            self.commit(tx, node, batch);
        }

        self.event_log.log(Event::Executed {
            batch,
            tx_id: tx.id(),
            target: tx.target(),
            executed_on: node,
            attempt,
        });

        let message = if node == tx.target() {
            format!("Query was run on {}.", node)
        } else {
            format!("Query was run on {} ({} unavailable).", node, tx.target())
        };

        TransactionOutcome::Executed {
            payload: ExecutionPayload {
                executed_on: node,
                kind: tx.kind(),
                isolation: tx.isolation(),
                message,
            },
        }
    }
}
