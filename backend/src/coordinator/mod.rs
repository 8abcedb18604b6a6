//! Coordinator - per-session crash-and-recovery state machine
//!
//! See `engine.rs` for the batch and recovery algorithms and `session.rs`
//! for hosting many sessions side by side.

pub mod engine;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use engine::{CommittedWrite, ConfigError, Coordinator, CoordinatorConfig, CoordinatorError};
pub use session::{SessionError, SessionId, SessionManager};
