//! Transaction model
//!
//! Represents one simulated database transaction submitted by the operator.
//! Each transaction has:
//! - An id (>= 1, unique within its batch)
//! - A target node
//! - A SQL-like statement (never parsed beyond its leading keyword)
//! - An isolation level
//!
//! Transactions are immutable once submitted.

use crate::models::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Transaction identifier, unique within a batch
pub type TransactionId = u64;

/// Sequence number of a submitted batch within a session (starts at 1)
pub type BatchId = u64;

/// Errors that can occur while building or validating transactions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Malformed transaction: {reason}")]
    MalformedTransaction { reason: String },

    #[error("Unknown isolation level '{0}'")]
    UnknownIsolationLevel(String),
}

/// SQL isolation level requested for a transaction
///
/// Serialized with the SQL spelling used by `SET TRANSACTION ISOLATION LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IsolationLevel {
    #[serde(rename = "READ UNCOMMITTED")]
    ReadUncommitted,

    #[default]
    #[serde(rename = "READ COMMITTED")]
    ReadCommitted,

    #[serde(rename = "REPEATABLE READ")]
    RepeatableRead,

    #[serde(rename = "SERIALIZABLE")]
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for IsolationLevel {
    type Err = TransactionError;

    /// Accepts `READ COMMITTED`, `read_committed`, `ReadCommitted`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        match normalized.as_str() {
            "READUNCOMMITTED" => Ok(IsolationLevel::ReadUncommitted),
            "READCOMMITTED" => Ok(IsolationLevel::ReadCommitted),
            "REPEATABLEREAD" => Ok(IsolationLevel::RepeatableRead),
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            _ => Err(TransactionError::UnknownIsolationLevel(s.to_string())),
        }
    }
}

/// Whether a statement only reads or also writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Read,
    Write,
}

/// A simulated database transaction
///
/// # Example
/// ```
/// use crash_recovery_core_rs::{IsolationLevel, NodeId, Transaction};
///
/// let tx = Transaction::new(1, NodeId::ReplicaA, "UPDATE games_frag1 SET price = 0")
///     .with_isolation(IsolationLevel::Serializable);
///
/// assert_eq!(tx.id(), 1);
/// assert!(tx.is_write());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,

    /// Node the operator aimed the transaction at
    #[serde(rename = "node")]
    target: NodeId,

    #[serde(rename = "query")]
    statement: String,

    #[serde(rename = "isolation", default)]
    isolation: IsolationLevel,
}

impl Transaction {
    /// Create a transaction with the default isolation level (READ COMMITTED)
    pub fn new(id: TransactionId, target: NodeId, statement: impl Into<String>) -> Self {
        Self {
            id,
            target,
            statement: statement.into(),
            isolation: IsolationLevel::default(),
        }
    }

    /// Set the isolation level (builder pattern)
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Classify the statement by its leading keyword
    pub fn kind(&self) -> StatementKind {
        let head = self.statement.trim_start();
        let is_select = head
            .get(..6)
            .map(|prefix| prefix.eq_ignore_ascii_case("select"))
            .unwrap_or(false);

        if is_select {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }

    pub fn is_read(&self) -> bool {
        self.kind() == StatementKind::Read
    }

    pub fn is_write(&self) -> bool {
        self.kind() == StatementKind::Write
    }

    /// Check whether the statement names `table` as a whole identifier
    ///
    /// `games_frag1` matches `SELECT * FROM games_frag1` but not `games_frag10`.
    pub fn references_table(&self, table: &str) -> bool {
        if table.is_empty() {
            return false;
        }

        let haystack = self.statement.to_ascii_lowercase();
        let needle = table.to_ascii_lowercase();
        let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';

        haystack.match_indices(&needle).any(|(start, _)| {
            let end = start + needle.len();
            let before_ok = haystack[..start].chars().next_back().map_or(true, |c| !is_ident(c));
            let after_ok = haystack[end..].chars().next().map_or(true, |c| !is_ident(c));
            before_ok && after_ok
        })
    }
}

/// Validate a batch before any processing
///
/// Rejects ids below 1, duplicate ids and blank statements. Validation is
/// all-or-nothing: the first problem found rejects the whole batch.
pub fn validate_batch(transactions: &[Transaction]) -> Result<(), TransactionError> {
    let mut seen = HashSet::with_capacity(transactions.len());

    for tx in transactions {
        if tx.id == 0 {
            return Err(TransactionError::MalformedTransaction {
                reason: "transaction id must be >= 1".to_string(),
            });
        }

        if !seen.insert(tx.id) {
            return Err(TransactionError::MalformedTransaction {
                reason: format!("duplicate transaction id {} in batch", tx.id),
            });
        }

        if tx.statement.trim().is_empty() {
            return Err(TransactionError::MalformedTransaction {
                reason: format!("transaction {} has an empty statement", tx.id),
            });
        }
    }

    Ok(())
}
