use crate::types::TeamRole;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Dispatch metrics accumulated per role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleMetrics {
    /// Steps dispatched to this role.
    pub dispatches: u32,
    /// Failed invocations.
    pub errors: u32,
    /// Cumulative invocation time in milliseconds.
    pub duration_ms: u64,
}

/// Activity of one role during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleActivity {
    /// No step in flight.
    Idle,
    /// Dispatching a step.
    Working,
}

/// Per-role state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleState {
    /// The role this entry tracks.
    pub role: TeamRole,
    /// Worker kind currently executing for this role, if any.
    pub current_worker: Option<String>,
    /// Idle or working.
    pub activity: RoleActivity,
    /// Accumulated metrics.
    pub metrics: RoleMetrics,
}

/// Tracks per-role dispatch metrics across a team's runs.
pub struct TeamMonitor {
    states: Arc<RwLock<HashMap<TeamRole, RoleState>>>,
}

impl TeamMonitor {
    /// Create a monitor tracking the given roles.
    pub fn new(roles: impl IntoIterator<Item = TeamRole>) -> Self {
        let states = roles
            .into_iter()
            .map(|role| {
                (
                    role,
                    RoleState {
                        role,
                        current_worker: None,
                        activity: RoleActivity::Idle,
                        metrics: RoleMetrics::default(),
                    },
                )
            })
            .collect();
        Self {
            states: Arc::new(RwLock::new(states)),
        }
    }

    /// Mark a role as dispatching a step.
    pub async fn start_step(&self, role: TeamRole, worker_kind: &str) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(&role) {
            state.current_worker = Some(worker_kind.to_string());
            state.activity = RoleActivity::Working;
            state.metrics.dispatches += 1;
        }
    }

    /// Mark a role as idle again.
    pub async fn finish_step(&self, role: TeamRole) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(&role) {
            state.current_worker = None;
            state.activity = RoleActivity::Idle;
        }
    }

    /// Record a failed invocation for a role.
    pub async fn record_error(&self, role: TeamRole) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(&role) {
            state.metrics.errors += 1;
        }
    }

    /// Record invocation time for a role.
    pub async fn record_duration(&self, role: TeamRole, duration_ms: u64) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(&role) {
            state.metrics.duration_ms += duration_ms;
        }
    }

    /// Snapshot of all tracked roles.
    pub async fn snapshot(&self) -> Vec<RoleState> {
        let states = self.states.read().await;
        states.values().cloned().collect()
    }

    /// Aggregate metrics across all roles.
    pub async fn aggregate(&self) -> RoleMetrics {
        let states = self.states.read().await;
        let mut total = RoleMetrics::default();
        for state in states.values() {
            total.dispatches += state.metrics.dispatches;
            total.errors += state.metrics.errors;
            total.duration_ms += state.metrics.duration_ms;
        }
        total
    }

    /// Serialize the current state as JSON.
    pub async fn to_json(&self) -> serde_json::Value {
        let states = self.snapshot().await;
        let aggregate = self.aggregate().await;
        serde_json::json!({
            "roles": states,
            "aggregate": aggregate,
        })
    }
}
