//! Tests for NodeRegistry
//!
//! CRITICAL: at most one replica may be down at any observable instant.

use crash_recovery_core_rs::models::registry::QUORUM_REASON;
use crash_recovery_core_rs::{Availability, NodeId, NodeRegistry, RegistryError};

#[test]
fn test_new_registry_all_up() {
    let registry = NodeRegistry::new();

    for node in NodeId::ALL {
        assert_eq!(registry.availability(node), Availability::Up);
    }
    assert!(registry.snapshot().replica_quorum_holds());
}

#[test]
fn test_second_replica_down_rejected() {
    let mut registry = NodeRegistry::new();
    registry
        .set_availability(NodeId::ReplicaB, Availability::Down)
        .unwrap();

    let err = registry
        .set_availability(NodeId::ReplicaA, Availability::Down)
        .unwrap_err();

    match err {
        RegistryError::InvariantViolation { node, blocking, reason } => {
            assert_eq!(node, NodeId::ReplicaA);
            assert_eq!(blocking, NodeId::ReplicaB);
            assert_eq!(reason, QUORUM_REASON);
        }
        other => panic!("expected InvariantViolation, got {:?}", other),
    }

    // State unchanged
    assert!(registry.availability(NodeId::ReplicaA).is_up());
    assert!(registry.availability(NodeId::ReplicaB).is_down());
}

#[test]
fn test_setting_up_always_succeeds() {
    let mut registry = NodeRegistry::new();

    registry.set_availability(NodeId::ReplicaA, Availability::Up).unwrap();
    registry.set_availability(NodeId::ReplicaA, Availability::Down).unwrap();
    registry.set_availability(NodeId::ReplicaA, Availability::Up).unwrap();

    assert!(registry.availability(NodeId::ReplicaA).is_up());
}

#[test]
fn test_same_replica_down_twice_is_allowed() {
    let mut registry = NodeRegistry::new();

    registry.set_availability(NodeId::ReplicaA, Availability::Down).unwrap();
    registry.set_availability(NodeId::ReplicaA, Availability::Down).unwrap();

    assert!(registry.availability(NodeId::ReplicaA).is_down());
}

#[test]
fn test_central_not_operator_controlled() {
    let mut registry = NodeRegistry::new();

    assert_eq!(
        registry.set_availability(NodeId::Central, Availability::Down),
        Err(RegistryError::CentralNotOperatorControlled)
    );
    assert_eq!(
        registry.toggle(NodeId::Central),
        Err(RegistryError::CentralNotOperatorControlled)
    );
    assert!(registry.availability(NodeId::Central).is_up());
}

#[test]
fn test_toggle_flips_and_respects_quorum() {
    let mut registry = NodeRegistry::new();

    assert_eq!(registry.toggle(NodeId::ReplicaA), Ok(Availability::Down));
    assert!(registry.toggle(NodeId::ReplicaB).is_err());
    assert_eq!(registry.toggle(NodeId::ReplicaA), Ok(Availability::Up));
    assert_eq!(registry.toggle(NodeId::ReplicaB), Ok(Availability::Down));
}

#[test]
fn test_snapshot_is_a_copy() {
    let mut registry = NodeRegistry::new();
    let before = registry.snapshot();

    registry.set_availability(NodeId::ReplicaB, Availability::Down).unwrap();

    assert!(before.is_up(NodeId::ReplicaB));
    assert!(registry.snapshot().is_down(NodeId::ReplicaB));
}
