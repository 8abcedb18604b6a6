//! Failover routing rules
//!
//! Optional rerouting applied when a transaction's target is unreachable.
//! All rules are off by default.
//!
//! - **Fragment failover** (Case 1): Central mirrors both fragments, so a
//!   statement aimed at a failed Central can run on the replica that owns the
//!   fragment it names.
//! - **Read fallback** (Case 2): a read aimed at a failed replica can be
//!   served by Central. Writes still wait for the replica.
//! - **Write-through** (Case 2): a write aimed at a failed replica is applied
//!   to Central immediately so the combined view reflects it, and is still
//!   stashed for the replica.

use crate::models::node::NodeId;
use crate::models::registry::RegistrySnapshot;
use crate::models::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// A table fragment and the replica that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRoute {
    pub table: String,
    pub owner: NodeId,
}

impl FragmentRoute {
    pub fn new(table: impl Into<String>, owner: NodeId) -> Self {
        Self {
            table: table.into(),
            owner,
        }
    }
}

/// Default fragment layout: `games_frag1` on node2, `games_frag2` on node3
pub fn default_fragments() -> Vec<FragmentRoute> {
    vec![
        FragmentRoute::new("games_frag1", NodeId::ReplicaA),
        FragmentRoute::new("games_frag2", NodeId::ReplicaB),
    ]
}

/// Rerouting switches and fragment ownership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRules {
    /// Reroute Central-targeted statements to the owning replica in Case 1
    #[serde(default)]
    pub fragment_failover: bool,

    /// Serve reads for a down replica from Central in Case 2
    #[serde(default)]
    pub read_fallback: bool,

    /// Apply writes for a down replica to Central in Case 2 (still stashed)
    #[serde(default)]
    pub write_through: bool,

    #[serde(default = "default_fragments")]
    pub fragments: Vec<FragmentRoute>,
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            fragment_failover: false,
            read_fallback: false,
            write_through: false,
            fragments: default_fragments(),
        }
    }
}

impl RoutingRules {
    /// Enable every rerouting rule with the default fragment layout
    pub fn with_failover() -> Self {
        Self {
            fragment_failover: true,
            read_fallback: true,
            write_through: true,
            ..Self::default()
        }
    }

    /// Check that every fragment names a table and is owned by a replica
    pub fn validate(&self) -> Result<(), String> {
        for route in &self.fragments {
            if route.table.trim().is_empty() {
                return Err("fragment table name must not be empty".to_string());
            }
            if route.owner.is_central() {
                return Err(format!(
                    "fragment '{}' must be owned by a replica, not {}",
                    route.table, route.owner
                ));
            }
        }
        Ok(())
    }

    /// Replica owning the first fragment `tx` references
    pub fn fragment_owner(&self, tx: &Transaction) -> Option<NodeId> {
        self.fragments
            .iter()
            .find(|route| tx.references_table(&route.table))
            .map(|route| route.owner)
    }

    /// Replica to run a Central-targeted statement on while Central is down
    pub(crate) fn fragment_failover_target(
        &self,
        tx: &Transaction,
        snapshot: &RegistrySnapshot,
    ) -> Option<NodeId> {
        if !self.fragment_failover {
            return None;
        }
        self.fragment_owner(tx).filter(|owner| snapshot.is_up(*owner))
    }

    /// Central, when it may serve a read aimed at a down replica
    pub(crate) fn read_fallback_target(
        &self,
        tx: &Transaction,
        snapshot: &RegistrySnapshot,
    ) -> Option<NodeId> {
        if self.read_fallback && tx.is_read() && snapshot.is_up(NodeId::Central) {
            Some(NodeId::Central)
        } else {
            None
        }
    }

    /// Central, when it should also apply a write aimed at a down replica
    pub(crate) fn write_through_target(
        &self,
        tx: &Transaction,
        snapshot: &RegistrySnapshot,
    ) -> Option<NodeId> {
        let target = tx.target();
        if self.write_through
            && tx.is_write()
            && target.is_replica()
            && snapshot.is_down(target)
            && snapshot.is_up(NodeId::Central)
        {
            Some(NodeId::Central)
        } else {
            None
        }
    }
}
