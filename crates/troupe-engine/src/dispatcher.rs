use crate::state::SharedState;
use crate::types::{Artifact, DispatchRecord, PlanStep, StepAction, WorkerOutput};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use troupe_core::{capability, Worker};

/// Maximum length of the result preview stored in the dispatch log.
const PREVIEW_LEN: usize = 120;

/// Capability names probed for an action, in resolution order.
///
/// The first capability the worker exposes wins; a worker exposing none
/// of them gets a synthesized default output instead.
pub fn capability_candidates(action: StepAction) -> &'static [&'static str] {
    match action {
        StepAction::AnalyzeTask => &[capability::ANALYZE_TASK, capability::PROCESS, capability::RUN],
        StepAction::Research => &[
            capability::RESEARCH,
            capability::QUERY,
            capability::PROCESS,
            capability::RUN,
        ],
        StepAction::Analyze => &[capability::ANALYZE, capability::PROCESS, capability::RUN],
        StepAction::Generate => &[
            capability::CREATE_CONTENT,
            capability::GENERATE,
            capability::PROCESS,
            capability::RUN,
        ],
        StepAction::Execute => &[capability::EXECUTE, capability::RUN, capability::PROCESS],
        StepAction::Review => &[capability::REVIEW, capability::PROCESS, capability::RUN],
        StepAction::Process => &[capability::PROCESS, capability::RUN],
    }
}

/// Dispatch one plan step to its bound worker, folding the outcome into
/// shared state.
///
/// Never fails the run: a worker failure is recorded in `state.errors`
/// and in that worker's output entry, and execution continues. A step
/// whose worker kind has no binding is skipped with a warning and leaves
/// no trace in the output map or error log.
pub async fn dispatch(worker: Option<&Arc<dyn Worker>>, step: &PlanStep, state: &mut SharedState) {
    let Some(worker) = worker else {
        warn!(
            worker = %step.worker_kind,
            action = %step.action,
            "no bound worker for step, skipping"
        );
        return;
    };

    // Generation and review act on what the team has produced so far;
    // everything else acts on the caller-supplied context.
    let aux: Map<String, Value> = match step.action {
        StepAction::Generate | StepAction::Review => state.outputs_as_value(),
        _ => state.context.clone(),
    };

    let output = invoke_first_capability(worker.as_ref(), step, &state.task, &aux).await;

    if let Some(error) = &output.error {
        state.push_error(format!("{}: {}", step.worker_kind, error));
    }

    let preview = match (&output.result, &output.error) {
        (Some(result), _) => truncate_preview(&result.to_string()),
        (None, Some(error)) => truncate_preview(error),
        (None, None) => String::new(),
    };
    state.push_message(DispatchRecord {
        worker: step.worker_kind.clone(),
        action: step.action,
        timestamp: Utc::now(),
        preview,
    });

    if output.success {
        if let Some(result) = &output.result {
            if !is_empty_result(result) {
                state.push_artifact(Artifact::new(&step.worker_kind, step.action, result.clone()));
            }
        }
    }

    state.record_output(&step.worker_kind, output);
}

async fn invoke_first_capability(
    worker: &dyn Worker,
    step: &PlanStep,
    task: &str,
    aux: &Map<String, Value>,
) -> WorkerOutput {
    for name in capability_candidates(step.action) {
        match worker.invoke(name, task, aux).await {
            Ok(Some(result)) => {
                debug!(
                    worker = %step.worker_kind,
                    capability = %name,
                    "capability resolved"
                );
                return WorkerOutput::success(result);
            }
            Ok(None) => continue,
            Err(e) => {
                warn!(
                    worker = %step.worker_kind,
                    capability = %name,
                    error = %e,
                    "worker capability failed"
                );
                return WorkerOutput::failure(e.to_string());
            }
        }
    }

    // The worker exposes none of the probed capabilities; synthesize a
    // default output so downstream phases still see an entry for it.
    debug!(worker = %step.worker_kind, action = %step.action, "no capability matched, synthesizing output");
    WorkerOutput::success(json!({
        "status": "processed",
        "worker": step.worker_kind,
        "action": step.action.to_string(),
    }))
}

fn truncate_preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LEN {
        text.to_string()
    } else {
        let mut preview: String = text.chars().take(PREVIEW_LEN).collect();
        preview.push_str("...");
        preview
    }
}

fn is_empty_result(result: &Value) -> bool {
    match result {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
