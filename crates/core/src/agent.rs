//! Agent run configuration.

use serde::{Deserialize, Serialize};

/// Hard cap on model consultations per agent run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Configuration for the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model to use for every completion call of a run
    pub model: String,

    /// Maximum `CALLING_MODEL` entries per run (soft budget)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }
}
