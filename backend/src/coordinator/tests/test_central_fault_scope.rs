// Case 1 scoping of the Central fault
//
// Central is forced down for the duration of one batch only. Restoring it at
// the end of the batch is a recovery event, so anything stashed at Central
// during the batch is retried before the batch report is built.

use crate::api::SubmitBatch;
use crate::coordinator::engine::{Coordinator, CoordinatorConfig};
use crate::models::event::Event;
use crate::models::node::NodeId;
use crate::models::outcome::{BatchSummary, OutcomeKind};
use crate::models::transaction::Transaction;
use crate::policy::SimulationCase;

fn case1_batch() -> SubmitBatch {
    SubmitBatch::new(
        SimulationCase::Case1,
        vec![
            Transaction::new(1, NodeId::Central, "UPDATE games SET price = 10 WHERE id = 1"),
            Transaction::new(2, NodeId::ReplicaA, "SELECT * FROM games_frag1"),
            Transaction::new(3, NodeId::Central, "DELETE FROM games WHERE id = 9"),
        ],
    )
}

#[test]
fn test_central_transactions_stashed_then_retried_within_batch() {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default()).unwrap();
    let report = coordinator.submit_batch(case1_batch()).unwrap();

    let initial: Vec<_> = report.outcomes.iter().filter(|r| r.attempt_index == 0).collect();
    assert_eq!(initial.len(), 3);
    assert_eq!(initial[0].outcome_kind, OutcomeKind::Stashed);
    assert_eq!(initial[1].outcome_kind, OutcomeKind::Executed);
    assert_eq!(initial[2].outcome_kind, OutcomeKind::Stashed);

    let retries: Vec<_> = report.outcomes.iter().filter(|r| r.attempt_index == 1).collect();
    assert_eq!(retries.len(), 2);
    assert_eq!(retries[0].transaction_id, 1);
    assert_eq!(retries[1].transaction_id, 3);
    assert!(retries.iter().all(|r| r.outcome_kind == OutcomeKind::Executed));
    assert!(retries.iter().all(|r| r.executed_on == Some(NodeId::Central)));

    assert_eq!(report.summary, BatchSummary::AllSucceeded);
    assert_eq!(report.status_message, "Simulation completed successfully");
}

#[test]
fn test_central_is_up_after_batch() {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default()).unwrap();
    coordinator.submit_batch(case1_batch()).unwrap();

    assert!(coordinator.availability(NodeId::Central).is_up());
    assert!(coordinator.stash().is_empty(NodeId::Central));
    assert_eq!(coordinator.stash().total_len(), 0);
}

#[test]
fn test_fault_events_bracket_the_drain() {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default()).unwrap();
    coordinator.submit_batch(case1_batch()).unwrap();

    let types: Vec<&str> = coordinator
        .event_log()
        .events()
        .iter()
        .map(Event::event_type)
        .filter(|t| matches!(*t, "FaultInjected" | "FaultCleared" | "StashDrained"))
        .collect();
    assert_eq!(types, vec!["FaultInjected", "FaultCleared", "StashDrained"]);

    let drained = coordinator.event_log().events_of_type("StashDrained");
    assert_eq!(
        drained[0],
        &Event::StashDrained {
            node: NodeId::Central,
            count: 2
        }
    );
}

#[test]
fn test_case1_without_central_targets_drains_nothing() {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default()).unwrap();
    let report = coordinator
        .submit_batch(SubmitBatch::new(
            SimulationCase::Case1,
            vec![
                Transaction::new(1, NodeId::ReplicaA, "SELECT * FROM games_frag1"),
                Transaction::new(2, NodeId::ReplicaB, "SELECT * FROM games_frag2"),
            ],
        ))
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|r| r.outcome_kind == OutcomeKind::Executed));
    assert!(coordinator.event_log().events_of_type("StashDrained").is_empty());
    assert_eq!(coordinator.event_log().events_of_type("FaultCleared").len(), 1);
}

#[test]
fn test_central_fault_does_not_leak_into_next_batch() {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default()).unwrap();
    coordinator.submit_batch(case1_batch()).unwrap();

    let report = coordinator
        .submit_batch(SubmitBatch::new(
            SimulationCase::Case2,
            vec![Transaction::new(1, NodeId::Central, "UPDATE games SET price = 3")],
        ))
        .unwrap();

    assert_eq!(report.batch, 2);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].outcome_kind, OutcomeKind::Executed);
}
