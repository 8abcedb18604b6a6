//! Simulation Case Policy
//!
//! Maps the operator's selected failure scenario to the fault applied to a
//! single transaction.
//!
//! # Overview
//!
//! Four fixed scenarios are available:
//! 1. **Case 1**: Central fails for the duration of a batch
//! 2. **Case 2**: a replica is down because the operator toggled it
//! 3. **Case 3**: Central is reachable but its commit write fails
//! 4. **Case 4**: a replica is reachable but its commit write fails
//!
//! The policy is a pure function of `(case, transaction, registry snapshot,
//! routing rules)`. It never mutates state and identical inputs always yield
//! the same decision, which keeps replays reproducible.
//!
//! # Example
//!
//! ```rust
//! use crash_recovery_core_rs::policy::{decide, FaultDecision, RoutingRules, SimulationCase};
//! use crash_recovery_core_rs::{NodeId, RegistrySnapshot, Transaction};
//!
//! let tx = Transaction::new(1, NodeId::Central, "UPDATE games_frag1 SET price = 10");
//! let snapshot = RegistrySnapshot::default();
//!
//! let decision = decide(SimulationCase::Case3, &tx, &snapshot, &RoutingRules::default());
//! assert_eq!(decision, FaultDecision::FailAtWrite);
//! ```

pub mod routing;

pub use routing::{FragmentRoute, RoutingRules};

use crate::models::node::NodeId;
use crate::models::registry::RegistrySnapshot;
use crate::models::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure scenario selected for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationCase {
    /// Central becomes unavailable for the batch
    #[serde(rename = "case1")]
    Case1,

    /// Replica availability follows the operator's toggles
    #[serde(rename = "case2")]
    Case2,

    /// Commit write fails on Central
    #[serde(rename = "case3")]
    Case3,

    /// Commit write fails on a replica
    #[serde(rename = "case4")]
    Case4,
}

impl SimulationCase {
    pub const ALL: [SimulationCase; 4] = [
        SimulationCase::Case1,
        SimulationCase::Case2,
        SimulationCase::Case3,
        SimulationCase::Case4,
    ];

    /// Whether the batch must start by forcing Central down
    pub fn injects_central_fault(self) -> bool {
        self == SimulationCase::Case1
    }

    pub fn description(self) -> &'static str {
        match self {
            SimulationCase::Case1 => "central node failure",
            SimulationCase::Case2 => "replica failure",
            SimulationCase::Case3 => "write failure on central node",
            SimulationCase::Case4 => "write failure on replica",
        }
    }
}

impl fmt::Display for SimulationCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            SimulationCase::Case1 => "case1",
            SimulationCase::Case2 => "case2",
            SimulationCase::Case3 => "case3",
            SimulationCase::Case4 => "case4",
        };
        f.write_str(id)
    }
}

/// Error returned when parsing an unrecognized case name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown simulation case '{0}'")]
pub struct UnknownCase(pub String);

impl FromStr for SimulationCase {
    type Err = UnknownCase;

    /// Accepts `case1`..`case4` and the bare digits `1`..`4`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.trim_start_matches("case") {
            "1" => Ok(SimulationCase::Case1),
            "2" => Ok(SimulationCase::Case2),
            "3" => Ok(SimulationCase::Case3),
            "4" => Ok(SimulationCase::Case4),
            _ => Err(UnknownCase(s.to_string())),
        }
    }
}

/// What the coordinator must do with one transaction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDecision {
    /// Execute against the target node
    Proceed,

    /// Target is unreachable; defer to the target's stash
    StashUnavailable,

    /// Target was reached but the commit write fails; terminal
    FailAtWrite,

    /// Target is unreachable but another node can serve the statement
    Reroute(NodeId),
}

/// Decide the fault applied to `tx` under `case`
pub fn decide(
    case: SimulationCase,
    tx: &Transaction,
    snapshot: &RegistrySnapshot,
    routing: &RoutingRules,
) -> FaultDecision {
    let target = tx.target();

    match case {
        SimulationCase::Case1 => {
            if target.is_central() && snapshot.is_down(NodeId::Central) {
                routing
                    .fragment_failover_target(tx, snapshot)
                    .map_or(FaultDecision::StashUnavailable, FaultDecision::Reroute)
            } else {
                FaultDecision::Proceed
            }
        }
        SimulationCase::Case2 => {
            if target.is_replica() && snapshot.is_down(target) {
                routing
                    .read_fallback_target(tx, snapshot)
                    .map_or(FaultDecision::StashUnavailable, FaultDecision::Reroute)
            } else {
                FaultDecision::Proceed
            }
        }
        SimulationCase::Case3 => {
            if target.is_central() {
                FaultDecision::FailAtWrite
            } else {
                FaultDecision::Proceed
            }
        }
        SimulationCase::Case4 => {
            if target.is_replica() {
                FaultDecision::FailAtWrite
            } else {
                FaultDecision::Proceed
            }
        }
    }
}
