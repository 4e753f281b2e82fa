use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use troupe_core::{TroupeError, TroupeResult};

/// Policy for handling per-step worker failures.
///
/// Only [`ErrorHandling::Continue`] is exercised by the dispatch loop;
/// `Stop` and `Retry` are declared policy slots for extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Record the failure and move to the next step.
    #[default]
    Continue,
    /// Abort the run on the first failure (reserved).
    Stop,
    /// Re-dispatch the failed step (reserved).
    Retry,
}

/// Execution policy for a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Team name, also the registry key.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Hard cap on the number of plan steps actually executed.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Run deadline in seconds; expiry cancels the run, keeping partials.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    /// Declared extension point; the dispatch loop does not honor it yet.
    #[serde(default)]
    pub parallel_execution: bool,
    /// Signal only; no gating logic behind it.
    #[serde(default)]
    pub require_approval: bool,
    /// Step identifiers to checkpoint at (reserved).
    #[serde(default)]
    pub checkpoint_steps: Vec<String>,
    /// Per-step failure policy.
    #[serde(default)]
    pub error_handling: ErrorHandling,
    /// Copied into the initial shared state, untouched by the engine.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_max_iterations() -> usize {
    10
}

fn default_timeout_seconds() -> f64 {
    300.0
}

impl TeamConfig {
    /// Create a config with the given name and all defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            max_iterations: default_max_iterations(),
            timeout_seconds: default_timeout_seconds(),
            parallel_execution: false,
            require_approval: false,
            checkpoint_steps: Vec::new(),
            error_handling: ErrorHandling::default(),
            metadata: Map::new(),
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the run deadline in seconds.
    pub fn with_timeout_seconds(mut self, timeout_seconds: f64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Validate invariants the execute loop relies on.
    pub fn validate(&self) -> TroupeResult<()> {
        if self.max_iterations == 0 {
            return Err(TroupeError::Config(format!(
                "team '{}': max_iterations must be greater than zero",
                self.name
            )));
        }
        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(TroupeError::Config(format!(
                "team '{}': timeout_seconds must be a positive number",
                self.name
            )));
        }
        Ok(())
    }
}
