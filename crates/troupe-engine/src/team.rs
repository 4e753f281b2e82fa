use crate::config::TeamConfig;
use crate::dispatcher::dispatch;
use crate::monitor::TeamMonitor;
use crate::planner::build_plan;
use crate::state::SharedState;
use crate::templates::default_capabilities;
use crate::types::{RoleDescriptor, TeamResult, TeamRole, TeamStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use troupe_core::{TroupeError, TroupeResult, Worker, WorkerFactory};
use uuid::Uuid;

/// Read-only view of a team, safe to take while a run is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSnapshot {
    /// Team name.
    pub name: String,
    /// Declared roles.
    pub roles: Vec<RoleSummary>,
    /// Worker kinds bound during the most recent run.
    pub bound_workers: Vec<String>,
    /// Task id of the run currently executing, if any.
    pub current_task_id: Option<Uuid>,
}

/// One role line of a [`TeamSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSummary {
    /// Worker kind identifier.
    pub worker_kind: String,
    /// Functional role.
    pub role: TeamRole,
}

#[derive(Debug)]
struct Runtime {
    current_task: Option<Uuid>,
    status: TeamStatus,
}

/// A team: one configuration plus a role set, executing one task at a
/// time through the plan/dispatch loop.
///
/// A fresh [`SharedState`] is created per [`Team::execute`] call and owned
/// exclusively by that run; concurrent calls on the same instance each
/// get their own state, and the [`TeamSnapshot`] pointers are
/// last-write-wins across them.
pub struct Team {
    config: TeamConfig,
    roles: Vec<RoleDescriptor>,
    factory: WorkerFactory,
    monitor: Arc<TeamMonitor>,
    bound_kinds: parking_lot::RwLock<Vec<String>>,
    runtime: parking_lot::RwLock<Runtime>,
}

impl Team {
    /// Create a team, validating its config and defaulting empty
    /// capability lists from the static worker-kind table.
    pub fn new(
        config: TeamConfig,
        roles: Vec<RoleDescriptor>,
        factory: WorkerFactory,
    ) -> TroupeResult<Self> {
        config.validate()?;

        let roles: Vec<RoleDescriptor> = roles
            .into_iter()
            .map(|mut role| {
                if role.capabilities.is_empty() {
                    role.capabilities = default_capabilities(&role.worker_kind);
                }
                role
            })
            .collect();

        let mut tracked: Vec<TeamRole> = roles.iter().map(|r| r.role).collect();
        tracked.dedup();

        Ok(Self {
            config,
            roles,
            factory,
            monitor: Arc::new(TeamMonitor::new(tracked)),
            bound_kinds: parking_lot::RwLock::new(Vec::new()),
            runtime: parking_lot::RwLock::new(Runtime {
                current_task: None,
                status: TeamStatus::Pending,
            }),
        })
    }

    /// The team's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The team's configuration.
    pub fn config(&self) -> &TeamConfig {
        &self.config
    }

    /// The team's declared roles.
    pub fn roles(&self) -> &[RoleDescriptor] {
        &self.roles
    }

    /// Per-role dispatch metrics.
    pub fn monitor(&self) -> &Arc<TeamMonitor> {
        &self.monitor
    }

    /// Lifecycle state of the most recent run.
    pub fn current_status(&self) -> TeamStatus {
        self.runtime.read().status
    }

    /// Read-only snapshot; safe concurrent with an in-flight run.
    pub fn status(&self) -> TeamSnapshot {
        let runtime = self.runtime.read();
        TeamSnapshot {
            name: self.config.name.clone(),
            roles: self
                .roles
                .iter()
                .map(|r| RoleSummary {
                    worker_kind: r.worker_kind.clone(),
                    role: r.role,
                })
                .collect(),
            bound_workers: self.bound_kinds.read().clone(),
            current_task_id: runtime.current_task,
        }
    }

    /// Drive the full lifecycle for one task and return the result.
    ///
    /// Never returns an error: binding failures, worker failures, deadline
    /// expiry, and engine faults are all folded into the returned
    /// [`TeamResult`]'s status and error log.
    pub async fn execute(&self, task: &str, context: Option<Map<String, Value>>) -> TeamResult {
        let start = Instant::now();

        let mut state = SharedState::new(task);
        if let Some(context) = context {
            state.context.extend(context);
        }
        state.metadata = self.config.metadata.clone();

        {
            let mut runtime = self.runtime.write();
            runtime.current_task = Some(state.task_id);
            runtime.status = TeamStatus::Running;
        }

        info!(team = %self.config.name, task_id = %state.task_id, task = %task, "team run started");

        let iterations = match self.run(&mut state).await {
            Ok(iterations) => iterations,
            Err(e) => {
                warn!(team = %self.config.name, error = %e, "team run failed");
                state.status = TeamStatus::Failed;
                state.push_error(e.to_string());
                0
            }
        };

        let result = if state.status == TeamStatus::Completed {
            Some(compile_result(&state))
        } else {
            None
        };

        {
            let mut runtime = self.runtime.write();
            runtime.current_task = None;
            runtime.status = state.status;
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            team = %self.config.name,
            task_id = %state.task_id,
            status = %state.status,
            iterations,
            duration_ms,
            "team run finished"
        );

        TeamResult {
            task_id: state.task_id,
            team_name: self.config.name.clone(),
            status: state.status,
            result,
            artifacts: state.artifacts,
            worker_outputs: state.worker_outputs,
            duration_ms,
            iterations,
            errors: state.errors,
            metadata: state.metadata,
        }
    }

    /// Same semantics as [`Team::execute`], spawned on the runtime so the
    /// caller is not blocked. Whole-run offload only: plan steps still
    /// execute sequentially.
    pub fn execute_async(
        self: &Arc<Self>,
        task: &str,
        context: Option<Map<String, Value>>,
    ) -> JoinHandle<TeamResult> {
        let team = Arc::clone(self);
        let task = task.to_string();
        tokio::spawn(async move { team.execute(&task, context).await })
    }

    /// Bind, plan, and drive the step loop. An `Err` here is an engine
    /// fault; per-step worker failures never surface as `Err`.
    async fn run(&self, state: &mut SharedState) -> TroupeResult<usize> {
        state.status = TeamStatus::Initializing;
        let bound = self.bind_workers()?;
        *self.bound_kinds.write() = {
            let mut kinds: Vec<String> = bound.keys().cloned().collect();
            kinds.sort();
            kinds
        };

        state.status = TeamStatus::Running;
        state.plan = build_plan(&self.roles, &state.task);
        let plan = state.plan.clone();
        info!(team = %self.config.name, steps = plan.len(), "plan built");

        // timeout_seconds is validated positive and finite at construction.
        let deadline = Instant::now() + Duration::from_secs_f64(self.config.timeout_seconds);
        let mut iterations = 0usize;

        for step in &plan {
            // Capacity limit, not a failure.
            if iterations >= self.config.max_iterations {
                info!(
                    team = %self.config.name,
                    max_iterations = self.config.max_iterations,
                    "iteration cap reached, stopping early"
                );
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(team = %self.config.name, step = step.index, "deadline expired before step");
                state.status = TeamStatus::Cancelled;
                break;
            }

            state.current_step = step.index;
            state.current_worker = Some(step.worker_kind.clone());

            let worker = bound.get(&step.worker_kind);
            let role = self.role_of(&step.worker_kind);
            if let Some(role) = role {
                self.monitor.start_step(role, &step.worker_kind).await;
            }

            let step_start = Instant::now();
            let dispatched =
                tokio::time::timeout(deadline - now, dispatch(worker, step, state)).await;

            if let Some(role) = role {
                self.monitor
                    .record_duration(role, step_start.elapsed().as_millis() as u64)
                    .await;
                if worker.is_some()
                    && state
                        .worker_outputs
                        .get(&step.worker_kind)
                        .is_some_and(|o| !o.success)
                {
                    self.monitor.record_error(role).await;
                }
                self.monitor.finish_step(role).await;
            }

            if dispatched.is_err() {
                warn!(
                    team = %self.config.name,
                    worker = %step.worker_kind,
                    "deadline expired mid-step, cancelling run"
                );
                state.status = TeamStatus::Cancelled;
                break;
            }

            iterations += 1;
        }

        state.current_worker = None;
        if state.status != TeamStatus::Cancelled {
            state.status = TeamStatus::Completed;
        }
        Ok(iterations)
    }

    /// Resolve every role to a worker. A missing binding aborts the run
    /// only for required roles; optional roles are simply absent and
    /// their steps skip at dispatch.
    fn bind_workers(&self) -> TroupeResult<HashMap<String, Arc<dyn Worker>>> {
        let mut bound: HashMap<String, Arc<dyn Worker>> = HashMap::new();
        for role in &self.roles {
            match (self.factory)(&role.worker_kind) {
                Some(worker) => {
                    bound.insert(role.worker_kind.clone(), worker);
                }
                None if role.required => {
                    return Err(TroupeError::Team(format!(
                        "required role {} ('{}') could not be bound",
                        role.role, role.worker_kind
                    )));
                }
                None => {
                    warn!(
                        team = %self.config.name,
                        worker = %role.worker_kind,
                        role = %role.role,
                        "optional role not bound, its steps will be skipped"
                    );
                }
            }
        }
        Ok(bound)
    }

    fn role_of(&self, worker_kind: &str) -> Option<TeamRole> {
        self.roles
            .iter()
            .find(|r| r.worker_kind == worker_kind)
            .map(|r| r.role)
    }
}

/// Render the final result text from the accumulated outputs.
///
/// One labeled block per successful output, in the map's insertion order
/// (which is dispatch order), joined by a `---` separator. Block text
/// prefers a `content`, `research`, or `analysis` field of an object
/// result, falling back to the stringified result.
fn compile_result(state: &SharedState) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for (kind, output) in &state.worker_outputs {
        if !output.success {
            continue;
        }
        let Some(result) = &output.result else {
            continue;
        };
        let text = extract_text(result);
        if !text.is_empty() {
            blocks.push(format!("**{kind}**:\n{text}"));
        }
    }

    if blocks.is_empty() {
        format!("Task processed, but no worker produced output: {}", state.task)
    } else {
        blocks.join("\n\n---\n\n")
    }
}

fn extract_text(result: &Value) -> String {
    if let Value::Object(map) = result {
        for key in ["content", "research", "analysis"] {
            if let Some(value) = map.get(key) {
                return match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
            }
        }
    }
    match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
