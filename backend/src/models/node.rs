//! Node model
//!
//! The topology is fixed for the lifetime of the process:
//! - exactly one Central node (`node1`), the source of truth for combined records
//! - exactly two replicas (`node2`, `node3`), each holding one fragment
//!
//! Wire names follow the deployed database hosts (`node1`..`node3`); the role
//! names (`central`, `replica_a`, `replica_b`) are accepted as aliases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the three nodes in the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeId {
    #[serde(rename = "node1", alias = "central")]
    Central,

    #[serde(rename = "node2", alias = "replica_a")]
    ReplicaA,

    #[serde(rename = "node3", alias = "replica_b")]
    ReplicaB,
}

/// Whether a node is reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Up,
    Down,
}

impl Availability {
    pub fn is_up(self) -> bool {
        self == Availability::Up
    }

    pub fn is_down(self) -> bool {
        self == Availability::Down
    }

    /// The opposite state (used by toggle requests)
    pub fn flipped(self) -> Self {
        match self {
            Availability::Up => Availability::Down,
            Availability::Down => Availability::Up,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Up => write!(f, "up"),
            Availability::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown availability '{0}' (expected up or down)")]
pub struct UnknownAvailability(pub String);

impl FromStr for Availability {
    type Err = UnknownAvailability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "online" => Ok(Availability::Up),
            "down" | "offline" => Ok(Availability::Down),
            _ => Err(UnknownAvailability(s.to_string())),
        }
    }
}

impl NodeId {
    /// All nodes, Central first
    pub const ALL: [NodeId; 3] = [NodeId::Central, NodeId::ReplicaA, NodeId::ReplicaB];

    /// The two replicas
    pub const REPLICAS: [NodeId; 2] = [NodeId::ReplicaA, NodeId::ReplicaB];

    pub fn is_central(self) -> bool {
        self == NodeId::Central
    }

    pub fn is_replica(self) -> bool {
        !self.is_central()
    }

    /// The other replica, or `None` for Central
    pub fn sibling(self) -> Option<NodeId> {
        match self {
            NodeId::Central => None,
            NodeId::ReplicaA => Some(NodeId::ReplicaB),
            NodeId::ReplicaB => Some(NodeId::ReplicaA),
        }
    }

    /// Wire name (`node1`, `node2`, `node3`)
    pub fn as_str(self) -> &'static str {
        match self {
            NodeId::Central => "node1",
            NodeId::ReplicaA => "node2",
            NodeId::ReplicaB => "node3",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown node name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown node '{0}' (expected node1, node2 or node3)")]
pub struct UnknownNode(pub String);

impl FromStr for NodeId {
    type Err = UnknownNode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node1" | "central" => Ok(NodeId::Central),
            "node2" | "replica_a" | "replicaa" => Ok(NodeId::ReplicaA),
            "node3" | "replica_b" | "replicab" => Ok(NodeId::ReplicaB),
            _ => Err(UnknownNode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_is_symmetric() {
        assert_eq!(NodeId::ReplicaA.sibling(), Some(NodeId::ReplicaB));
        assert_eq!(NodeId::ReplicaB.sibling(), Some(NodeId::ReplicaA));
        assert_eq!(NodeId::Central.sibling(), None);
    }

    #[test]
    fn test_parse_wire_and_role_names() {
        assert_eq!("node1".parse::<NodeId>().unwrap(), NodeId::Central);
        assert_eq!("replica_b".parse::<NodeId>().unwrap(), NodeId::ReplicaB);
        assert_eq!(" NODE2 ".parse::<NodeId>().unwrap(), NodeId::ReplicaA);
        assert!("node4".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&NodeId::ReplicaA).unwrap();
        assert_eq!(json, "\"node2\"");

        let parsed: NodeId = serde_json::from_str("\"central\"").unwrap();
        assert_eq!(parsed, NodeId::Central);
    }

    #[test]
    fn test_availability_flip() {
        assert_eq!(Availability::Up.flipped(), Availability::Down);
        assert_eq!(Availability::Down.flipped(), Availability::Up);
        assert!(Availability::default().is_up());
    }
}
