//! Scripted replay of operator sessions
//!
//! A script is a coordinator configuration plus an ordered list of the steps
//! an operator would take in the UI: submitting batches, toggling replicas
//! and abandoning stashed work. Scripts drive the CLI and keep end-to-end
//! scenarios reproducible in tests.

pub mod handler;
pub mod types;

pub use handler::{ScenarioOutcome, ScenarioRunner, StepRecord, StepReport};
pub use types::{ScenarioError, ScenarioScript, ScenarioStep};
