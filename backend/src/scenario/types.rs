//! Scenario script types
//!
//! Scripts are JSON documents:
//!
//! ```json
//! {
//!   "config": { "routing": { "read_fallback": true } },
//!   "steps": [
//!     { "type": "toggle_node", "node": "node2" },
//!     { "type": "submit_batch", "simulationCase": "case2",
//!       "transactions": [{ "id": 1, "node": "node2", "query": "UPDATE games_frag1 SET price = 5" }] },
//!     { "type": "toggle_node", "node": "node2" }
//!   ]
//! }
//! ```

use crate::api::{AbandonStashed, SetAvailability, SubmitBatch, ToggleNode};
use crate::coordinator::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Invalid scenario script: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One operator action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    SubmitBatch(SubmitBatch),
    ToggleNode(ToggleNode),
    SetAvailability(SetAvailability),
    Abandon(AbandonStashed),
}

impl ScenarioStep {
    /// Wire name of the step
    pub fn step_type(&self) -> &'static str {
        match self {
            ScenarioStep::SubmitBatch(_) => "submit_batch",
            ScenarioStep::ToggleNode(_) => "toggle_node",
            ScenarioStep::SetAvailability(_) => "set_availability",
            ScenarioStep::Abandon(_) => "abandon",
        }
    }
}

/// A complete session to replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioScript {
    #[serde(default)]
    pub config: CoordinatorConfig,

    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioScript {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }
}
