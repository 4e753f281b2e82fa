use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Functional position a worker occupies within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Analyzes the incoming task and sets direction for the team.
    Lead,
    /// Gathers information relevant to the task.
    Researcher,
    /// Analyzes gathered material.
    Analyst,
    /// Produces written content.
    Writer,
    /// Reviews the team's accumulated output.
    Reviewer,
    /// Carries out side-effecting actions.
    Executor,
    /// Observes execution; gets no dedicated plan phase.
    Monitor,
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamRole::Lead => write!(f, "lead"),
            TeamRole::Researcher => write!(f, "researcher"),
            TeamRole::Analyst => write!(f, "analyst"),
            TeamRole::Writer => write!(f, "writer"),
            TeamRole::Reviewer => write!(f, "reviewer"),
            TeamRole::Executor => write!(f, "executor"),
            TeamRole::Monitor => write!(f, "monitor"),
        }
    }
}

/// Declares one worker's participation in a team.
///
/// Constructed once at team-creation time and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDescriptor {
    /// Worker kind identifier, resolved externally at bind time.
    pub worker_kind: String,
    /// Functional role within the team.
    pub role: TeamRole,
    /// Capability tags; defaulted from the static kind table when empty.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Higher priority runs earlier among same-role ties.
    #[serde(default)]
    pub priority: i32,
    /// When true, a bind failure aborts the whole run.
    #[serde(default)]
    pub required: bool,
    /// Opaque per-role settings, passed through untouched.
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl RoleDescriptor {
    /// Create a descriptor with default capabilities, priority, and flags.
    pub fn new(worker_kind: impl Into<String>, role: TeamRole) -> Self {
        Self {
            worker_kind: worker_kind.into(),
            role,
            capabilities: Vec::new(),
            priority: 0,
            required: false,
            config: Map::new(),
        }
    }

    /// Mark this role as required for the run to proceed.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set explicit capability tags.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the execution priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Action vocabulary for plan steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Decompose and analyze the incoming task.
    AnalyzeTask,
    /// Gather information.
    Research,
    /// Analyze gathered material.
    Analyze,
    /// Produce content.
    Generate,
    /// Carry out a side-effecting action.
    Execute,
    /// Review accumulated outputs.
    Review,
    /// Generic fallback when no phase matched.
    Process,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepAction::AnalyzeTask => write!(f, "analyze_task"),
            StepAction::Research => write!(f, "research"),
            StepAction::Analyze => write!(f, "analyze"),
            StepAction::Generate => write!(f, "generate"),
            StepAction::Execute => write!(f, "execute"),
            StepAction::Review => write!(f, "review"),
            StepAction::Process => write!(f, "process"),
        }
    }
}

/// One step of an ordered execution plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// 0-based, dense, strictly increasing across the plan.
    pub index: usize,
    /// Worker kind this step dispatches to.
    pub worker_kind: String,
    /// Capability category to invoke.
    pub action: StepAction,
    /// Human-readable description; derived, not authoritative.
    pub description: String,
}

/// Outcome of dispatching one step to one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerOutput {
    /// Whether the invocation succeeded.
    pub success: bool,
    /// The value returned by the worker, when any.
    pub result: Option<Value>,
    /// The failure message, when the invocation failed.
    pub error: Option<String>,
}

impl WorkerOutput {
    /// A successful output carrying the worker's result.
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// A failed output carrying the error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// A substantial output produced during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Worker kind that produced the artifact.
    pub source: String,
    /// The action that produced it.
    pub kind: StepAction,
    /// The artifact payload.
    pub content: Value,
    /// UTC creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Create an artifact stamped with the current time.
    pub fn new(source: impl Into<String>, kind: StepAction, content: Value) -> Self {
        Self {
            source: source.into(),
            kind,
            content,
            created_at: Utc::now(),
        }
    }
}

/// One entry of the ordered dispatch log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Worker kind the step dispatched to.
    pub worker: String,
    /// Action that was dispatched.
    pub action: StepAction,
    /// UTC dispatch timestamp.
    pub timestamp: DateTime<Utc>,
    /// Truncated preview of the result or error.
    pub preview: String,
}

/// Lifecycle state of a team run.
///
/// `Pending → Initializing → Running → {Completed | Failed | Cancelled}`.
/// `WaitingInput` is reserved for human-approval checkpoints and is not
/// reached by the base algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    /// Run created, nothing bound yet.
    Pending,
    /// Binding workers.
    Initializing,
    /// Executing plan steps.
    Running,
    /// Parked on a human-approval checkpoint (reserved).
    WaitingInput,
    /// All steps processed or the iteration cap reached.
    Completed,
    /// A required binding or the engine itself failed.
    Failed,
    /// The run's deadline expired; partial state is retained.
    Cancelled,
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamStatus::Pending => write!(f, "pending"),
            TeamStatus::Initializing => write!(f, "initializing"),
            TeamStatus::Running => write!(f, "running"),
            TeamStatus::WaitingInput => write!(f, "waiting_input"),
            TeamStatus::Completed => write!(f, "completed"),
            TeamStatus::Failed => write!(f, "failed"),
            TeamStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Immutable snapshot returned to the caller after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamResult {
    /// Identifier of the run.
    pub task_id: Uuid,
    /// Name of the team that executed the run.
    pub team_name: String,
    /// Terminal lifecycle value.
    pub status: TeamStatus,
    /// Compiled result text; `None` unless the run completed with output.
    pub result: Option<String>,
    /// Copy of the final artifact log.
    pub artifacts: Vec<Artifact>,
    /// Copy of the final per-worker output map, in insertion order.
    pub worker_outputs: IndexMap<String, WorkerOutput>,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: f64,
    /// Steps actually executed; at most `max_iterations`.
    pub iterations: usize,
    /// Copy of the final error log.
    pub errors: Vec<String>,
    /// Caller-supplied metadata, untouched by the engine.
    pub metadata: Map<String, Value>,
}

impl TeamResult {
    /// True iff the run reached [`TeamStatus::Completed`].
    pub fn success(&self) -> bool {
        self.status == TeamStatus::Completed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_display() {
        assert_eq!(TeamRole::Lead.to_string(), "lead");
        assert_eq!(TeamRole::Executor.to_string(), "executor");
        assert_eq!(TeamRole::Monitor.to_string(), "monitor");
    }

    #[test]
    fn test_unknown_role_rejected() {
        let parsed: Result<TeamRole, _> = serde_json::from_str("\"stakeholder\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_role_descriptor_builder() {
        let role = RoleDescriptor::new("writer", TeamRole::Writer)
            .required()
            .with_priority(5);
        assert_eq!(role.worker_kind, "writer");
        assert!(role.required);
        assert_eq!(role.priority, 5);
        assert!(role.capabilities.is_empty());
    }

    #[test]
    fn test_worker_output_constructors() {
        let ok = WorkerOutput::success(json!({"content": "done"}));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let bad = WorkerOutput::failure("boom");
        assert!(!bad.success);
        assert_eq!(bad.error.as_deref(), Some("boom"));
        assert!(bad.result.is_none());
    }

    #[test]
    fn test_artifact_creation() {
        let artifact = Artifact::new("writer", StepAction::Generate, json!("Memo"));
        assert_eq!(artifact.source, "writer");
        assert_eq!(artifact.kind, StepAction::Generate);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TeamStatus::WaitingInput).unwrap();
        assert_eq!(json, "\"waiting_input\"");
        let parsed: TeamStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TeamStatus::WaitingInput);
    }

    #[test]
    fn test_result_success_derivation() {
        let mut result = TeamResult {
            task_id: Uuid::new_v4(),
            team_name: "t".into(),
            status: TeamStatus::Completed,
            result: None,
            artifacts: Vec::new(),
            worker_outputs: IndexMap::new(),
            duration_ms: 0.0,
            iterations: 0,
            errors: Vec::new(),
            metadata: Map::new(),
        };
        assert!(result.success());
        result.status = TeamStatus::Failed;
        assert!(!result.success());
        result.status = TeamStatus::Cancelled;
        assert!(!result.success());
    }
}
