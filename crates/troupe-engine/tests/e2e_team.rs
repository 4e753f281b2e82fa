//! End-to-end team orchestration test.
//!
//! Verifies the full bind → plan → dispatch → compile pipeline using
//! deterministic mock workers. Checks: output flow between phases, block
//! ordering in the compiled result, failure isolation, routing, and
//! monitor tracking.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use troupe_core::{capability, TroupeError, TroupeResult, Worker, WorkerFactory};
use troupe_engine::{RoleDescriptor, Team, TeamConfig, TeamManager, TeamRole, TeamStatus};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// ---------------------------------------------------------------------------
// Mock workers — deterministic responses per kind
// ---------------------------------------------------------------------------

struct MockWorker {
    kind: String,
}

#[async_trait]
impl Worker for MockWorker {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn capabilities(&self) -> Vec<String> {
        vec![
            capability::ANALYZE_TASK.to_string(),
            capability::RESEARCH.to_string(),
            capability::ANALYZE.to_string(),
            capability::CREATE_CONTENT.to_string(),
            capability::EXECUTE.to_string(),
            capability::REVIEW.to_string(),
            capability::PROCESS.to_string(),
        ]
    }

    async fn invoke(
        &self,
        capability_name: &str,
        task: &str,
        aux: &Map<String, Value>,
    ) -> TroupeResult<Option<Value>> {
        let result = match capability_name {
            capability::ANALYZE_TASK => json!({ "analysis": task, "subtasks": [task] }),
            capability::RESEARCH => json!({ "research": format!("findings on {task}") }),
            capability::ANALYZE => json!({ "analysis": format!("assessment of {task}") }),
            capability::CREATE_CONTENT => {
                // Generation runs after analysis: the accumulated outputs
                // of earlier phases must be visible here.
                assert!(
                    !aux.is_empty(),
                    "writer should receive accumulated outputs, got an empty map"
                );
                json!({ "content": format!("Memo: {task}") })
            }
            capability::EXECUTE => json!({ "status": "executed", "task": task }),
            capability::REVIEW => {
                assert!(
                    !aux.is_empty(),
                    "reviewer should receive accumulated outputs, got an empty map"
                );
                json!({ "content": format!("Approved: {task}") })
            }
            capability::PROCESS => json!({ "content": format!("processed {task}") }),
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}

struct FailingWorker {
    kind: String,
}

#[async_trait]
impl Worker for FailingWorker {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn capabilities(&self) -> Vec<String> {
        vec![capability::PROCESS.to_string()]
    }

    async fn invoke(
        &self,
        _capability_name: &str,
        _task: &str,
        _aux: &Map<String, Value>,
    ) -> TroupeResult<Option<Value>> {
        Err(TroupeError::Worker("mock outage".into()))
    }
}

fn mock_factory() -> WorkerFactory {
    Arc::new(|kind| {
        Some(Arc::new(MockWorker {
            kind: kind.to_string(),
        }) as Arc<dyn Worker>)
    })
}

// ---------------------------------------------------------------------------
// Test: Memo scenario — lead analyzes, writer generates, blocks in order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_memo_scenario() {
    init_tracing();
    let team = Team::new(
        TeamConfig::new("memo"),
        vec![
            RoleDescriptor::new("alpha", TeamRole::Lead),
            RoleDescriptor::new("beta", TeamRole::Writer),
        ],
        mock_factory(),
    )
    .unwrap();

    let result = team.execute("draft a memo", None).await;

    assert_eq!(result.status, TeamStatus::Completed);
    assert!(result.success());
    assert_eq!(result.iterations, 2);

    // Output map holds one entry per worker, in dispatch order.
    let kinds: Vec<&String> = result.worker_outputs.keys().collect();
    assert_eq!(kinds, ["alpha", "beta"]);

    // Compiled result: alpha's block first, then beta's, fixed separator.
    let compiled = result.result.as_ref().unwrap();
    let blocks: Vec<&str> = compiled.split("\n\n---\n\n").collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].starts_with("**alpha**:\n"));
    assert!(blocks[0].contains("draft a memo"));
    assert!(blocks[1].starts_with("**beta**:\n"));
    assert!(blocks[1].contains("Memo: draft a memo"));

    // One artifact per successful step, dispatch order preserved.
    assert_eq!(result.artifacts.len(), 2);
    assert_eq!(result.artifacts[0].source, "alpha");
    assert_eq!(result.artifacts[1].source, "beta");
    assert!(result.errors.is_empty());
}

// ---------------------------------------------------------------------------
// Test: Full five-role pipeline with review at the end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_full_pipeline() {
    init_tracing();
    let team = Team::new(
        TeamConfig::new("full"),
        vec![
            RoleDescriptor::new("coordinator", TeamRole::Lead),
            RoleDescriptor::new("researcher", TeamRole::Researcher),
            RoleDescriptor::new("analyst", TeamRole::Analyst),
            RoleDescriptor::new("writer", TeamRole::Writer),
            RoleDescriptor::new("reviewer", TeamRole::Reviewer),
        ],
        mock_factory(),
    )
    .unwrap();

    let result = team.execute("quarterly report", None).await;

    assert_eq!(result.status, TeamStatus::Completed);
    assert_eq!(result.iterations, 5);
    assert_eq!(result.worker_outputs.len(), 5);
    assert!(result.worker_outputs.values().all(|o| o.success));

    // The reviewer ran last.
    let kinds: Vec<&String> = result.worker_outputs.keys().collect();
    assert_eq!(kinds.last().map(|k| k.as_str()), Some("reviewer"));
}

// ---------------------------------------------------------------------------
// Test: Failure isolation — one worker down, run still completes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_failure_isolation() {
    init_tracing();
    let factory: WorkerFactory = Arc::new(|kind| {
        if kind == "flaky" {
            Some(Arc::new(FailingWorker {
                kind: "flaky".into(),
            }) as Arc<dyn Worker>)
        } else {
            Some(Arc::new(MockWorker {
                kind: kind.to_string(),
            }) as Arc<dyn Worker>)
        }
    });

    let team = Team::new(
        TeamConfig::new("isolated"),
        vec![
            RoleDescriptor::new("researcher", TeamRole::Researcher),
            RoleDescriptor::new("flaky", TeamRole::Analyst),
            RoleDescriptor::new("writer", TeamRole::Writer),
        ],
        factory,
    )
    .unwrap();

    let result = team.execute("resilience check", None).await;

    assert_eq!(result.status, TeamStatus::Completed);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("flaky"));
    assert!(result.worker_outputs["researcher"].success);
    assert!(!result.worker_outputs["flaky"].success);
    assert!(result.worker_outputs["writer"].success);

    // The failed worker contributes no block to the compiled result.
    let compiled = result.result.as_ref().unwrap();
    assert!(!compiled.contains("**flaky**"));
    assert!(compiled.contains("**researcher**"));
}

// ---------------------------------------------------------------------------
// Test: Manager routing end to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_routing() {
    init_tracing();
    let manager = TeamManager::new(mock_factory());

    let research = manager
        .route_task("please research quantum computing", None)
        .await
        .unwrap();
    assert_eq!(research.team_name, "research");
    assert!(research.success());

    let security = manager
        .route_task("audit our firewall for threats", None)
        .await
        .unwrap();
    assert_eq!(security.team_name, "security");

    let fallback = manager.route_task("hello", None).await.unwrap();
    assert_eq!(fallback.team_name, "full_stack");

    // Routed teams stay registered for reuse.
    let listings = manager.list_teams().await;
    let names: Vec<&str> = listings.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["full_stack", "research", "security"]);
}

// ---------------------------------------------------------------------------
// Test: Monitor tracks dispatches across a run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_monitor_tracking() {
    init_tracing();
    let team = Team::new(
        TeamConfig::new("watched"),
        vec![
            RoleDescriptor::new("coordinator", TeamRole::Lead),
            RoleDescriptor::new("writer", TeamRole::Writer),
        ],
        mock_factory(),
    )
    .unwrap();

    let _result = team.execute("observe me", None).await;

    let snapshot = team.monitor().snapshot().await;
    for state in &snapshot {
        assert_eq!(state.activity, troupe_engine::RoleActivity::Idle);
        assert!(state.current_worker.is_none());
    }

    let aggregate = team.monitor().aggregate().await;
    assert_eq!(aggregate.dispatches, 2);
    assert_eq!(aggregate.errors, 0);
}

// ---------------------------------------------------------------------------
// Test: Required role missing — fail fast before any dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_e2e_required_role_missing() {
    init_tracing();
    let factory: WorkerFactory = Arc::new(|kind| {
        (kind != "writer").then(|| {
            Arc::new(MockWorker {
                kind: kind.to_string(),
            }) as Arc<dyn Worker>
        })
    });

    let team = Team::new(
        TeamConfig::new("strict"),
        vec![
            RoleDescriptor::new("researcher", TeamRole::Researcher),
            RoleDescriptor::new("writer", TeamRole::Writer).required(),
        ],
        factory,
    )
    .unwrap();

    let result = team.execute("doomed", None).await;

    assert_eq!(result.status, TeamStatus::Failed);
    assert_eq!(result.iterations, 0);
    assert!(result.artifacts.is_empty());
    assert!(result.worker_outputs.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("writer"));
}
