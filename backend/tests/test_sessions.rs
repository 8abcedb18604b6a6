//! Tests for SessionManager
//!
//! Sessions share nothing: operations on one never change another, and
//! independent sessions can be driven from different threads at once.

use crash_recovery_core_rs::coordinator::SessionError;
use crash_recovery_core_rs::{
    Availability, BatchSummary, CoordinatorConfig, CoordinatorError, NodeId, SessionManager, SimulationCase, SubmitBatch,
    Transaction,
};
use std::sync::Arc;
use std::thread;

#[test]
fn test_parallel_sessions_are_independent() {
    let sessions = Arc::new(SessionManager::new(CoordinatorConfig::default()));
    let ids: Vec<_> = (0..4).map(|_| sessions.create_session().unwrap()).collect();

    let handles: Vec<_> = ids
        .iter()
        .copied()
        .enumerate()
        .map(|(i, id)| {
            let sessions = Arc::clone(&sessions);
            thread::spawn(move || {
                let replica = if i % 2 == 0 { NodeId::ReplicaA } else { NodeId::ReplicaB };

                sessions
                    .with_session(id, |c| -> Result<_, CoordinatorError> {
                        c.set_availability(replica, Availability::Down)?;
                        let transactions = (1..=5)
                            .map(|tx| Transaction::new(tx, replica, format!("UPDATE games_frag1 SET price = {}", tx)))
                            .collect();
                        c.submit_batch(SubmitBatch::new(SimulationCase::Case2, transactions))?;
                        c.set_availability(replica, Availability::Up)
                    })
                    .unwrap()
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let recovery = handle.join().unwrap();
        assert_eq!(recovery.retried.len(), 5);
    }

    for id in ids {
        let (summary, attempts) = sessions
            .with_session(id, |c| (c.results().summarize(), c.results().len()))
            .unwrap();
        assert_eq!(summary, BatchSummary::AllSucceeded);
        assert_eq!(attempts, 10);
    }
}

#[test]
fn test_stash_is_session_scoped() {
    let sessions = SessionManager::new(CoordinatorConfig::default());
    let first = sessions.create_session().unwrap();
    let second = sessions.create_session().unwrap();

    sessions
        .with_session(first, |c| -> Result<_, CoordinatorError> {
            c.set_availability(NodeId::ReplicaA, Availability::Down)?;
            c.submit_batch(SubmitBatch::new(
                SimulationCase::Case2,
                vec![Transaction::new(1, NodeId::ReplicaA, "DELETE FROM games_frag1")],
            ))
        })
        .unwrap()
        .unwrap();

    let second_stash = sessions
        .with_session(second, |c| c.stash().total_len())
        .unwrap();
    assert_eq!(second_stash, 0);

    assert!(sessions.close_session(first));
    assert_eq!(
        sessions.with_session(first, |c| c.stash().total_len()).unwrap_err(),
        SessionError::UnknownSession(first)
    );
}

#[test]
fn test_default_manager_has_no_sessions() {
    let sessions = SessionManager::default();
    assert_eq!(sessions.session_count(), 0);
}
