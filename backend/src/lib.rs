//! Crash-and-Recovery Coordinator Core
//!
//! Replays batches of simulated database transactions against a three-node
//! replicated topology (Central plus two replicas) under one of four failure
//! scenarios, deferring work aimed at unavailable nodes and retrying it when
//! they come back.
//!
//! # Architecture
//!
//! - **models**: Domain types (nodes, transactions, registry, stash, outcomes, events)
//! - **policy**: Simulation cases and the per-transaction fault decision
//! - **coordinator**: Per-session state machine and session hosting
//! - **api**: Request and response types exchanged with the UI
//! - **scenario**: Scripted replay of operator sessions
//!
//! # Critical Invariants
//!
//! 1. At most one replica is down at any observable instant
//! 2. Stashed transactions are retried in the order they were stashed
//! 3. Write failures are terminal and never stashed
//! 4. Fault decisions are pure (same inputs, same decision)

// Module declarations
pub mod api;
pub mod coordinator;
pub mod models;
pub mod policy;
pub mod scenario;

// Re-exports for convenience
pub use api::{AbandonStashed, BatchReport, OutcomeRow, SetAvailability, SubmitBatch, ToggleNode, ToggleReport};
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorError, SessionManager};
pub use models::{
    event::{Event, EventLog},
    node::{Availability, NodeId},
    outcome::{BatchSummary, ErrorKind, OutcomeKind, TransactionOutcome},
    registry::{NodeRegistry, RegistryError, RegistrySnapshot},
    stash::{StashEntry, StashQueue, StashReason},
    transaction::{BatchId, IsolationLevel, Transaction, TransactionError, TransactionId},
};
pub use policy::{FaultDecision, RoutingRules, SimulationCase};
pub use scenario::{ScenarioRunner, ScenarioScript};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn crash_recovery_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::coordinator::PyCoordinator>()?;
    Ok(())
}
