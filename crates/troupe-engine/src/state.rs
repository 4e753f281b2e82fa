use crate::types::{Artifact, DispatchRecord, PlanStep, TeamStatus, WorkerOutput};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The single mutable record threaded through one plan execution.
///
/// Created fresh per run and captured into the [`crate::types::TeamResult`]
/// at the end; never reused across tasks. Three distinct merge policies
/// apply to its fields and must not be collapsed into one:
///
/// - `messages`, `artifacts`, `errors` — append-only logs, dispatch order.
/// - `worker_outputs` — last-write-wins per key, insertion-ordered.
/// - `context`, `metadata` — caller-owned passthrough, untouched here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedState {
    /// Identifier of this run.
    pub task_id: Uuid,
    /// The original instruction string.
    pub task: String,
    /// Current lifecycle state.
    pub status: TeamStatus,
    /// Ordered log of dispatch events.
    pub messages: Vec<DispatchRecord>,
    /// Ordered log of substantial outputs.
    pub artifacts: Vec<Artifact>,
    /// Worker kind currently executing, if any.
    pub current_worker: Option<String>,
    /// Latest output per worker kind; a new write discards the prior one.
    pub worker_outputs: IndexMap<String, WorkerOutput>,
    /// Caller-supplied free-form context.
    pub context: Map<String, Value>,
    /// The ordered step list, set once after planning.
    pub plan: Vec<PlanStep>,
    /// Index of the step being executed.
    pub current_step: usize,
    /// Ordered log of error strings.
    pub errors: Vec<String>,
    /// Caller-supplied metadata.
    pub metadata: Map<String, Value>,
}

impl SharedState {
    /// Create a fresh state for one run.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            task: task.into(),
            status: TeamStatus::Pending,
            messages: Vec::new(),
            artifacts: Vec::new(),
            current_worker: None,
            worker_outputs: IndexMap::new(),
            context: Map::new(),
            plan: Vec::new(),
            current_step: 0,
            errors: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Append one entry to the dispatch log.
    pub fn push_message(&mut self, record: DispatchRecord) {
        self.messages.push(record);
    }

    /// Append one artifact.
    pub fn push_artifact(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    /// Append one error string.
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Record a worker's output, discarding any prior entry for the kind.
    pub fn record_output(&mut self, worker_kind: impl Into<String>, output: WorkerOutput) {
        self.worker_outputs.insert(worker_kind.into(), output);
    }

    /// The accumulated worker outputs as a JSON map, for use as the
    /// auxiliary argument to generation and review capabilities.
    pub fn outputs_as_value(&self) -> Map<String, Value> {
        self.worker_outputs
            .iter()
            .filter_map(|(kind, output)| {
                serde_json::to_value(output)
                    .ok()
                    .map(|v| (kind.clone(), v))
            })
            .collect()
    }
}
