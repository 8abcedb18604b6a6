//! Node Registry
//!
//! Holds the availability of the three nodes for one session.
//!
//! # Critical Invariants
//!
//! 1. **Quorum of one replica**: at most one replica is Down at any instant.
//!    A request that would take the second replica down is rejected and the
//!    registry is left untouched.
//! 2. **Central is not operator-controlled**: only the coordinator flips
//!    Central, and only while injecting the Case 1 fault.

use crate::models::node::{Availability, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason attached to a rejected replica shutdown
pub const QUORUM_REASON: &str = "quorum";

/// Errors returned by availability changes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invariant violation: cannot take {node} down ({reason}); {blocking} is already down")]
    InvariantViolation {
        node: NodeId,
        blocking: NodeId,
        reason: String,
    },

    #[error("Central node availability is not operator-controlled")]
    CentralNotOperatorControlled,
}

/// Point-in-time copy of every node's availability
///
/// Policies decide against a snapshot so they never observe a half-applied change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub central: Availability,
    pub replica_a: Availability,
    pub replica_b: Availability,
}

impl RegistrySnapshot {
    pub fn availability(&self, node: NodeId) -> Availability {
        match node {
            NodeId::Central => self.central,
            NodeId::ReplicaA => self.replica_a,
            NodeId::ReplicaB => self.replica_b,
        }
    }

    pub fn is_up(&self, node: NodeId) -> bool {
        self.availability(node).is_up()
    }

    pub fn is_down(&self, node: NodeId) -> bool {
        self.availability(node).is_down()
    }

    /// True unless both replicas are down
    pub fn replica_quorum_holds(&self) -> bool {
        !(self.replica_a.is_down() && self.replica_b.is_down())
    }

    fn slot_mut(&mut self, node: NodeId) -> &mut Availability {
        match node {
            NodeId::Central => &mut self.central,
            NodeId::ReplicaA => &mut self.replica_a,
            NodeId::ReplicaB => &mut self.replica_b,
        }
    }
}

/// Availability registry for the three-node topology
///
/// # Example
///
/// ```rust
/// use crash_recovery_core_rs::{Availability, NodeId, NodeRegistry, RegistryError};
///
/// let mut registry = NodeRegistry::new();
/// registry.set_availability(NodeId::ReplicaB, Availability::Down).unwrap();
///
/// let err = registry.set_availability(NodeId::ReplicaA, Availability::Down);
/// assert!(matches!(err, Err(RegistryError::InvariantViolation { .. })));
/// assert!(registry.availability(NodeId::ReplicaA).is_up());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    state: RegistrySnapshot,
}

impl NodeRegistry {
    /// Create a registry with every node Up
    pub fn new() -> Self {
        Self::default()
    }

    pub fn availability(&self, node: NodeId) -> Availability {
        self.state.availability(node)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state
    }

    /// Operator request to change a replica's availability
    ///
    /// # Errors
    ///
    /// - `CentralNotOperatorControlled` if `node` is Central
    /// - `InvariantViolation` if taking `node` down would leave no replica up
    ///
    /// On error the registry is unchanged.
    pub fn set_availability(
        &mut self,
        node: NodeId,
        availability: Availability,
    ) -> Result<(), RegistryError> {
        if node.is_central() {
            return Err(RegistryError::CentralNotOperatorControlled);
        }

        self.check_transition(node, availability)?;
        *self.state.slot_mut(node) = availability;
        Ok(())
    }

    /// Flip a replica's availability, returning the new state
    pub fn toggle(&mut self, node: NodeId) -> Result<Availability, RegistryError> {
        let next = self.availability(node).flipped();
        self.set_availability(node, next)?;
        Ok(next)
    }

    /// Case 1 fault injection and restoration of Central
    pub(crate) fn inject_central(&mut self, availability: Availability) {
        self.state.central = availability;
    }

    fn check_transition(&self, node: NodeId, availability: Availability) -> Result<(), RegistryError> {
        if availability.is_up() {
            return Ok(());
        }

        if let Some(sibling) = node.sibling() {
            if self.state.is_down(sibling) {
                return Err(RegistryError::InvariantViolation {
                    node,
                    blocking: sibling,
                    reason: QUORUM_REASON.to_string(),
                });
            }
        }

        Ok(())
    }
}
