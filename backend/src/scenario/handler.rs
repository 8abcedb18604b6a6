//! Scenario execution
//!
//! Steps run in order against one coordinator. A step that fails (rejected
//! toggle, malformed batch, unknown stash entry) is reported and the script
//! carries on, the same way the UI keeps the session alive after an error.

use crate::api::{BatchReport, OutcomeRow, ToggleReport};
use crate::coordinator::{Coordinator, CoordinatorError};
use crate::models::outcome::BatchSummary;
use crate::models::registry::RegistrySnapshot;
use crate::scenario::types::{ScenarioScript, ScenarioStep};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepReport {
    Batch(BatchReport),
    Toggle(ToggleReport),
    Abandoned(OutcomeRow),
    Error { message: String },
}

impl StepReport {
    pub fn is_error(&self) -> bool {
        matches!(self, StepReport::Error { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 0-based position in the script
    pub index: usize,
    pub step: String,
    pub report: StepReport,
}

/// Everything a replay produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub steps: Vec<StepRecord>,

    /// Every attempt in the session, ordered by batch, position and attempt
    pub outcomes: Vec<OutcomeRow>,

    pub summary: BatchSummary,
    pub final_state: RegistrySnapshot,
    pub still_stashed: usize,
}

impl ScenarioStep {
    /// Apply this step to `coordinator`
    pub fn execute(&self, coordinator: &mut Coordinator) -> Result<StepReport, CoordinatorError> {
        match self {
            ScenarioStep::SubmitBatch(request) => coordinator.submit_batch(request.clone()).map(StepReport::Batch),
            ScenarioStep::ToggleNode(request) => coordinator.toggle_node(request.node).map(StepReport::Toggle),
            ScenarioStep::SetAvailability(request) => coordinator
                .set_availability(request.node, request.availability)
                .map(StepReport::Toggle),
            ScenarioStep::Abandon(request) => coordinator
                .abandon(request.node, request.batch, request.transaction_id)
                .map(StepReport::Abandoned),
        }
    }
}

/// Replays a script against a fresh coordinator
pub struct ScenarioRunner {
    coordinator: Coordinator,
    steps: Vec<ScenarioStep>,
}

impl ScenarioRunner {
    /// Fails only when the script's configuration is invalid
    pub fn new(script: ScenarioScript) -> Result<Self, CoordinatorError> {
        Ok(Self {
            coordinator: Coordinator::new(script.config)?,
            steps: script.steps,
        })
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Run every step in order
    pub fn run(&mut self) -> ScenarioOutcome {
        let mut records = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let report = match step.execute(&mut self.coordinator) {
                Ok(report) => report,
                Err(err) => {
                    warn!(index, step = step.step_type(), error = %err, "scenario step failed");
                    StepReport::Error {
                        message: err.to_string(),
                    }
                }
            };

            records.push(StepRecord {
                index,
                step: step.step_type().to_string(),
                report,
            });
        }

        let failed = records.iter().filter(|r| r.report.is_error()).count();
        info!(steps = records.len(), failed, "scenario complete");

        ScenarioOutcome {
            steps: records,
            outcomes: self.coordinator.outcome_rows(),
            summary: self.coordinator.results().summarize(),
            final_state: self.coordinator.registry().snapshot(),
            still_stashed: self.coordinator.stash().total_len(),
        }
    }
}
