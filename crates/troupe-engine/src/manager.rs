use crate::config::TeamConfig;
use crate::team::{RoleSummary, Team};
use crate::templates::{default_templates, TeamTemplate};
use crate::types::{RoleDescriptor, TeamResult, TeamStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use troupe_core::{TroupeError, TroupeResult, WorkerFactory};

/// One line of [`TeamManager::list_teams`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamListing {
    /// Registered team name.
    pub name: String,
    /// The team's declared roles.
    pub roles: Vec<RoleSummary>,
    /// Lifecycle state of the team's most recent run.
    pub status: TeamStatus,
}

/// One line of [`TeamManager::list_templates`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateListing {
    /// Template name.
    pub name: String,
    /// Template description.
    pub description: String,
    /// The template's default roles.
    pub roles: Vec<RoleSummary>,
}

/// Pick the template name for a task by ordered keyword tests against
/// the lower-cased text. Falls through to the `full_stack` catch-all.
pub fn route_template(task: &str) -> &'static str {
    let text = task.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if matches(&["research", "investigate", "find", "search"]) {
        "research"
    } else if matches(&["brief", "daily", "status", "summary"]) {
        "daily_ops"
    } else if matches(&["content", "write", "create", "generate"]) {
        "content"
    } else if matches(&["security", "audit", "vulnerability", "threat"]) {
        "security"
    } else {
        "full_stack"
    }
}

/// Process-wide catalog of team instances and named templates.
///
/// Constructed once and passed by reference or injected — never an
/// ambient singleton — so tests can hold independent catalogs. The
/// catalog is the only structure touched by multiple tasks concurrently
/// and sits behind a coarse async lock.
pub struct TeamManager {
    factory: WorkerFactory,
    templates: HashMap<String, TeamTemplate>,
    teams: RwLock<HashMap<String, Arc<Team>>>,
}

impl TeamManager {
    /// Create a manager with the built-in templates.
    pub fn new(factory: WorkerFactory) -> Self {
        Self::with_templates(factory, default_templates())
    }

    /// Create a manager with a custom template set.
    pub fn with_templates(factory: WorkerFactory, templates: Vec<TeamTemplate>) -> Self {
        Self {
            factory,
            templates: templates.into_iter().map(|t| (t.name.clone(), t)).collect(),
            teams: RwLock::new(HashMap::new()),
        }
    }

    /// Create and register a team, replacing any prior team of the same
    /// name.
    ///
    /// When `roles` is `None` and `name` matches a known template, the
    /// template's roles and config are used; an explicit `config` still
    /// overrides the template's. Errs when neither argument nor template
    /// provides roles.
    pub async fn create_team(
        &self,
        name: &str,
        roles: Option<Vec<RoleDescriptor>>,
        config: Option<TeamConfig>,
    ) -> TroupeResult<Arc<Team>> {
        let template = self.templates.get(name);

        let roles = match roles {
            Some(roles) if !roles.is_empty() => roles,
            _ => template
                .map(|t| t.roles.clone())
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    TroupeError::Registry(format!(
                        "no roles given for team '{name}' and no template matches"
                    ))
                })?,
        };

        let config = config
            .or_else(|| template.map(|t| t.config.clone()))
            .unwrap_or_else(|| TeamConfig::new(name));

        let team = Arc::new(Team::new(config, roles, Arc::clone(&self.factory))?);
        info!(team = %name, "registered team");
        self.teams
            .write()
            .await
            .insert(name.to_string(), Arc::clone(&team));
        Ok(team)
    }

    /// Look up a registered team.
    pub async fn get_team(&self, name: &str) -> Option<Arc<Team>> {
        self.teams.read().await.get(name).cloned()
    }

    /// List registered teams with their roles and latest run status.
    pub async fn list_teams(&self) -> Vec<TeamListing> {
        let teams = self.teams.read().await;
        let mut listings: Vec<TeamListing> = teams
            .values()
            .map(|team| TeamListing {
                name: team.name().to_string(),
                roles: team.status().roles,
                status: team.current_status(),
            })
            .collect();
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        listings
    }

    /// List known templates.
    pub fn list_templates(&self) -> Vec<TemplateListing> {
        let mut listings: Vec<TemplateListing> = self
            .templates
            .values()
            .map(|t| TemplateListing {
                name: t.name.clone(),
                description: t.description.clone(),
                roles: t
                    .roles
                    .iter()
                    .map(|r| RoleSummary {
                        worker_kind: r.worker_kind.clone(),
                        role: r.role,
                    })
                    .collect(),
            })
            .collect();
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        listings
    }

    /// Remove a team; true iff one existed under the name.
    pub async fn destroy_team(&self, name: &str) -> bool {
        self.teams.write().await.remove(name).is_some()
    }

    /// Classify the task, ensure a team for the chosen template exists
    /// (creating it on first use), and run it off the caller's thread.
    pub async fn route_task(
        &self,
        task: &str,
        context: Option<Map<String, Value>>,
    ) -> TroupeResult<TeamResult> {
        let template = route_template(task);
        info!(template, task = %task, "routing task");

        let team = match self.get_team(template).await {
            Some(team) => team,
            None => self.create_team(template, None, None).await?,
        };

        team.execute_async(task, context)
            .await
            .map_err(|e| TroupeError::Team(format!("routed run panicked: {e}")))
    }

    /// Union of capability tags per registered team.
    pub async fn capabilities(&self) -> HashMap<String, Vec<String>> {
        let teams = self.teams.read().await;
        teams
            .values()
            .map(|team| {
                let mut tags: Vec<String> = team
                    .roles()
                    .iter()
                    .flat_map(|r| r.capabilities.iter().cloned())
                    .collect();
                tags.sort();
                tags.dedup();
                (team.name().to_string(), tags)
            })
            .collect()
    }
}
