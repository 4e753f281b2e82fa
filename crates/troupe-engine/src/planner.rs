use crate::types::{PlanStep, RoleDescriptor, StepAction, TeamRole};

/// Build the ordered execution plan for a role set and task.
///
/// Pure and deterministic: the same roles and task always yield the same
/// plan. Precedence is fixed — lead analysis, then research/analysis,
/// then generation/execution, then review — with a per-role `Process`
/// fallback when no phase matched. Within the research and generation
/// phases, higher `priority` runs earlier; ties keep role-list order.
///
/// Only the first Lead in role-list order gets an `AnalyzeTask` step;
/// subsequent Leads get no step at all. This asymmetry is kept for
/// compatibility with existing callers (see DESIGN.md).
pub fn build_plan(roles: &[RoleDescriptor], task: &str) -> Vec<PlanStep> {
    let mut steps: Vec<PlanStep> = Vec::new();

    if let Some(lead) = roles.iter().find(|r| r.role == TeamRole::Lead) {
        steps.push(step(
            steps.len(),
            &lead.worker_kind,
            StepAction::AnalyzeTask,
            format!("Analyze task: {task}"),
        ));
    }

    for role in phase(roles, &[TeamRole::Researcher, TeamRole::Analyst]) {
        let action = if role.role == TeamRole::Researcher {
            StepAction::Research
        } else {
            StepAction::Analyze
        };
        let description = match action {
            StepAction::Research => format!("Research: {task}"),
            _ => format!("Analyze findings for: {task}"),
        };
        steps.push(step(steps.len(), &role.worker_kind, action, description));
    }

    for role in phase(roles, &[TeamRole::Writer, TeamRole::Executor]) {
        let action = if role.role == TeamRole::Writer {
            StepAction::Generate
        } else {
            StepAction::Execute
        };
        let description = match action {
            StepAction::Generate => format!("Generate content for: {task}"),
            _ => format!("Execute: {task}"),
        };
        steps.push(step(steps.len(), &role.worker_kind, action, description));
    }

    if let Some(reviewer) = roles.iter().find(|r| r.role == TeamRole::Reviewer) {
        steps.push(step(
            steps.len(),
            &reviewer.worker_kind,
            StepAction::Review,
            format!("Review team output for: {task}"),
        ));
    }

    // No role matched any recognized phase (empty list or Monitor-only):
    // one generic step per role, in role-list order.
    if steps.is_empty() {
        for role in roles {
            steps.push(step(
                steps.len(),
                &role.worker_kind,
                StepAction::Process,
                format!("Process: {task}"),
            ));
        }
    }

    steps
}

/// Roles matching one of `wanted`, in role-list order, stably reordered so
/// higher priority runs earlier.
fn phase<'a>(roles: &'a [RoleDescriptor], wanted: &[TeamRole]) -> Vec<&'a RoleDescriptor> {
    let mut matched: Vec<&RoleDescriptor> =
        roles.iter().filter(|r| wanted.contains(&r.role)).collect();
    matched.sort_by_key(|r| std::cmp::Reverse(r.priority));
    matched
}

fn step(index: usize, worker_kind: &str, action: StepAction, description: String) -> PlanStep {
    PlanStep {
        index,
        worker_kind: worker_kind.to_string(),
        action,
        description,
    }
}
