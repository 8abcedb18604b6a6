//! Domain models for the crash-and-recovery coordinator

pub mod event;
pub mod node;
pub mod outcome;
pub mod registry;
pub mod stash;
pub mod transaction;

// Re-exports
pub use event::{Event, EventLog};
pub use node::{Availability, NodeId};
pub use outcome::{BatchSummary, ErrorKind, ExecutionPayload, OutcomeKind, OutcomeRecord, ResultAggregator, TransactionOutcome};
pub use registry::{NodeRegistry, RegistryError, RegistrySnapshot};
pub use stash::{StashEntry, StashQueue, StashReason};
pub use transaction::{BatchId, IsolationLevel, StatementKind, Transaction, TransactionError, TransactionId};
