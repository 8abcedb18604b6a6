//! Session hosting
//!
//! Each session owns an independent `Coordinator`. Events for one session are
//! serialized by that session's mutex; different sessions never share state
//! and can be driven from different threads at the same time.

use crate::coordinator::engine::{Coordinator, CoordinatorConfig, CoordinatorError};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Session identifier
pub type SessionId = Uuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown session {0}")]
    UnknownSession(SessionId),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

/// Registry of live sessions
///
/// # Example
///
/// ```rust
/// use crash_recovery_core_rs::coordinator::{CoordinatorConfig, SessionManager};
/// use crash_recovery_core_rs::NodeId;
///
/// let sessions = SessionManager::new(CoordinatorConfig::default());
/// let id = sessions.create_session().unwrap();
///
/// let report = sessions.with_session(id, |c| c.toggle_node(NodeId::ReplicaB)).unwrap();
/// assert!(report.is_ok());
/// ```
#[derive(Debug, Default)]
pub struct SessionManager {
    config: CoordinatorConfig,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Coordinator>>>>,
}

impl SessionManager {
    /// Sessions created by this manager all use `config`
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh session with every node up and nothing stashed
    pub fn create_session(&self) -> Result<SessionId, SessionError> {
        let coordinator = Coordinator::new(self.config.clone())?;
        let id = Uuid::new_v4();

        self.sessions
            .write()
            .insert(id, Arc::new(Mutex::new(coordinator)));

        info!(session = %id, "session created");
        Ok(id)
    }

    /// Run `f` with exclusive access to one session's coordinator
    ///
    /// The session map lock is released before `f` runs, so a long-running
    /// operation on one session never blocks another.
    pub fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Coordinator) -> R,
    ) -> Result<R, SessionError> {
        let session = self
            .sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownSession(id))?;

        let mut coordinator = session.lock();
        Ok(f(&mut *coordinator))
    }

    /// Discard a session and everything it stashed
    pub fn close_session(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            info!(session = %id, "session closed");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().contains_key(&id)
    }
}
