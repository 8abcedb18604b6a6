// Retry bookkeeping across batches
//
// Stash entries keep their batch, position and case so retries from several
// batches come back in stash order with the right attempt index, and writes
// reach a replica's commit log only when the replica actually serves them.

use crate::api::SubmitBatch;
use crate::coordinator::engine::{Coordinator, CoordinatorConfig, CoordinatorError};
use crate::models::node::{Availability, NodeId};
use crate::models::outcome::{BatchSummary, ErrorKind, OutcomeKind, TransactionOutcome};
use crate::models::transaction::Transaction;
use crate::policy::SimulationCase;

fn coordinator_with_replica_a_down() -> Coordinator {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default()).unwrap();
    coordinator
        .set_availability(NodeId::ReplicaA, Availability::Down)
        .unwrap();
    coordinator
}

fn case2(transactions: Vec<Transaction>) -> SubmitBatch {
    SubmitBatch::new(SimulationCase::Case2, transactions)
}

#[test]
fn test_stash_order_preserved_across_batches() {
    let mut coordinator = coordinator_with_replica_a_down();

    coordinator
        .submit_batch(case2(vec![
            Transaction::new(7, NodeId::ReplicaA, "UPDATE games_frag1 SET price = 1"),
            Transaction::new(3, NodeId::ReplicaA, "UPDATE games_frag1 SET price = 2"),
        ]))
        .unwrap();
    coordinator
        .submit_batch(case2(vec![Transaction::new(
            1,
            NodeId::ReplicaA,
            "UPDATE games_frag1 SET price = 3",
        )]))
        .unwrap();

    let stashed: Vec<_> = coordinator
        .stash()
        .iter(NodeId::ReplicaA)
        .map(|e| (e.batch, e.transaction_id()))
        .collect();
    assert_eq!(stashed, vec![(1, 7), (1, 3), (2, 1)]);

    let recovery = coordinator
        .set_availability(NodeId::ReplicaA, Availability::Up)
        .unwrap();
    let retried: Vec<_> = recovery
        .retried
        .iter()
        .map(|r| (r.batch, r.transaction_id, r.attempt_index))
        .collect();
    assert_eq!(retried, vec![(1, 7, 1), (1, 3, 1), (2, 1, 1)]);
    assert_eq!(
        recovery.status_message,
        "Stashed transactions retried successfully on node2"
    );
}

#[test]
fn test_write_lands_only_after_recovery() {
    let mut coordinator = coordinator_with_replica_a_down();

    coordinator
        .submit_batch(case2(vec![
            Transaction::new(1, NodeId::ReplicaA, "UPDATE games_frag1 SET price = 5"),
            Transaction::new(2, NodeId::ReplicaA, "SELECT * FROM games_frag1"),
        ]))
        .unwrap();
    assert!(coordinator.commit_log(NodeId::ReplicaA).is_empty());

    coordinator
        .set_availability(NodeId::ReplicaA, Availability::Up)
        .unwrap();

    let log = coordinator.commit_log(NodeId::ReplicaA);
    assert_eq!(log.len(), 1, "reads never commit");
    assert_eq!(log[0].tx_id, 1);
    assert_eq!(log[0].batch, 1);
    assert!(coordinator.commit_log(NodeId::Central).is_empty());
}

#[test]
fn test_abandon_records_failed_attempt() {
    let mut coordinator = coordinator_with_replica_a_down();

    coordinator
        .submit_batch(case2(vec![
            Transaction::new(1, NodeId::ReplicaA, "UPDATE games_frag1 SET price = 5"),
            Transaction::new(2, NodeId::ReplicaA, "UPDATE games_frag1 SET price = 6"),
        ]))
        .unwrap();

    let row = coordinator.abandon(NodeId::ReplicaA, 1, 1).unwrap();
    assert_eq!(row.outcome_kind, OutcomeKind::Failed);
    assert_eq!(row.attempt_index, 1);
    assert_eq!(coordinator.stash().len(NodeId::ReplicaA), 1);

    let latest = coordinator.results().latest(1, 1).unwrap();
    assert_eq!(
        latest.outcome,
        TransactionOutcome::Failed {
            error: ErrorKind::Abandoned
        }
    );

    let recovery = coordinator
        .set_availability(NodeId::ReplicaA, Availability::Up)
        .unwrap();
    assert_eq!(recovery.retried.len(), 1);
    assert_eq!(recovery.retried[0].transaction_id, 2);

    assert_eq!(coordinator.results().summarize_batch(1), BatchSummary::PartialSuccess(1));
}

#[test]
fn test_abandon_unknown_entry() {
    let mut coordinator = coordinator_with_replica_a_down();

    let err = coordinator.abandon(NodeId::ReplicaA, 1, 42).unwrap_err();
    assert_eq!(
        err,
        CoordinatorError::StashEntryNotFound {
            node: NodeId::ReplicaA,
            batch: 1,
            tx_id: 42
        }
    );
    assert!(coordinator.event_log().events_of_type("Abandoned").is_empty());
}

#[test]
fn test_history_keeps_every_attempt() {
    let mut coordinator = coordinator_with_replica_a_down();

    coordinator
        .submit_batch(case2(vec![Transaction::new(
            4,
            NodeId::ReplicaA,
            "UPDATE games_frag1 SET price = 5",
        )]))
        .unwrap();
    coordinator
        .set_availability(NodeId::ReplicaA, Availability::Up)
        .unwrap();

    let history = coordinator.results().history(1, 4);
    assert_eq!(history.len(), 2);
    assert!(history[0].outcome.is_stashed());
    assert!(history[1].outcome.is_executed());

    let events = coordinator.event_log().events_for_tx(1, 4);
    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["Stashed", "Executed"]);
}
