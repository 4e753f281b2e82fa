use crate::config::TeamConfig;
use crate::types::{RoleDescriptor, TeamRole};
use serde::{Deserialize, Serialize};
use troupe_core::capability;

/// A named, reusable (roles, config) pair used to pre-populate a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamTemplate {
    /// Template name, matched by the task router.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Default role set.
    pub roles: Vec<RoleDescriptor>,
    /// Default execution policy.
    pub config: TeamConfig,
}

/// Built-in templates matching the task router's vocabulary.
pub fn default_templates() -> Vec<TeamTemplate> {
    vec![
        TeamTemplate {
            name: "research".into(),
            description: "Investigates a topic and writes up the findings".into(),
            roles: vec![
                RoleDescriptor::new("researcher", TeamRole::Researcher).required(),
                RoleDescriptor::new("analyst", TeamRole::Analyst),
                RoleDescriptor::new("writer", TeamRole::Writer),
            ],
            config: TeamConfig::new("research")
                .with_description("Research and synthesis pipeline"),
        },
        TeamTemplate {
            name: "daily_ops".into(),
            description: "Produces operational briefs and status summaries".into(),
            roles: vec![
                RoleDescriptor::new("coordinator", TeamRole::Lead),
                RoleDescriptor::new("operator", TeamRole::Executor),
                RoleDescriptor::new("writer", TeamRole::Writer),
            ],
            config: TeamConfig::new("daily_ops")
                .with_description("Daily operations briefing pipeline"),
        },
        TeamTemplate {
            name: "content".into(),
            description: "Researches, drafts, and reviews written content".into(),
            roles: vec![
                RoleDescriptor::new("coordinator", TeamRole::Lead),
                RoleDescriptor::new("researcher", TeamRole::Researcher),
                RoleDescriptor::new("writer", TeamRole::Writer).required(),
                RoleDescriptor::new("reviewer", TeamRole::Reviewer),
            ],
            config: TeamConfig::new("content")
                .with_description("Content production pipeline"),
        },
        TeamTemplate {
            name: "security".into(),
            description: "Scans for threats and reviews the findings".into(),
            roles: vec![
                RoleDescriptor::new("scanner", TeamRole::Executor).required(),
                RoleDescriptor::new("analyst", TeamRole::Analyst),
                RoleDescriptor::new("reviewer", TeamRole::Reviewer),
            ],
            config: TeamConfig::new("security")
                .with_description("Security scanning pipeline"),
        },
        TeamTemplate {
            name: "full_stack".into(),
            description: "General-purpose team covering every phase".into(),
            roles: vec![
                RoleDescriptor::new("coordinator", TeamRole::Lead),
                RoleDescriptor::new("researcher", TeamRole::Researcher),
                RoleDescriptor::new("analyst", TeamRole::Analyst),
                RoleDescriptor::new("writer", TeamRole::Writer),
                RoleDescriptor::new("reviewer", TeamRole::Reviewer),
            ],
            config: TeamConfig::new("full_stack")
                .with_description("Catch-all pipeline for unclassified tasks"),
        },
    ]
}

/// Default capability tags for a worker kind, used when a role descriptor
/// declares none of its own.
pub fn default_capabilities(worker_kind: &str) -> Vec<String> {
    let tags: &[&str] = match worker_kind {
        "coordinator" => &[capability::ANALYZE_TASK, capability::PROCESS],
        "researcher" => &[capability::RESEARCH, capability::QUERY],
        "analyst" => &[capability::ANALYZE],
        "writer" => &[capability::CREATE_CONTENT, capability::GENERATE],
        "operator" | "scanner" => &[capability::EXECUTE, capability::RUN],
        "reviewer" => &[capability::REVIEW],
        "monitor" => &[capability::PROCESS],
        _ => &[capability::PROCESS],
    };
    tags.iter().map(|t| (*t).to_string()).collect()
}
