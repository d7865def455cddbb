use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tether_core::{single_plural, BindingSuggestion, ConfigurationScope, SuggestionOrigin};
use tether_registry::{ConfigurationRepository, ConnectionRepository, Event};
use tether_scheduler::{check_cancelled, BackgroundScheduler, CancellationToken, Cancelled};

use crate::cache::SonarProjectsCache;
use crate::client::BackendClient;
use crate::clue::{BindingClueProvider, ALL_BINDING_CLUE_FILENAMES, SHARED_CONFIG_FILENAME};

/// The reactive suggestion pipeline.
///
/// Event handlers queue one background computation per trigger and return
/// immediately; results reach the host later through a single batched
/// `suggest_binding` callback. Nothing is persisted between triggers, so a
/// later computation supersedes an earlier one simply by reading fresher
/// registry state.
pub struct BindingSuggestionProvider {
    pipeline: Pipeline,
    scheduler: BackgroundScheduler,
}

#[derive(Clone)]
struct Pipeline {
    config: Arc<ConfigurationRepository>,
    connections: Arc<ConnectionRepository>,
    clue_provider: Arc<BindingClueProvider>,
    projects_cache: Arc<SonarProjectsCache>,
    client: Arc<dyn BackendClient>,
    enabled: Arc<AtomicBool>,
}

impl BindingSuggestionProvider {
    pub fn new(
        config: Arc<ConfigurationRepository>,
        connections: Arc<ConnectionRepository>,
        clue_provider: Arc<BindingClueProvider>,
        projects_cache: Arc<SonarProjectsCache>,
        client: Arc<dyn BackendClient>,
        scheduler: BackgroundScheduler,
    ) -> Self {
        Self {
            pipeline: Pipeline {
                config,
                connections,
                clue_provider,
                projects_cache,
                client,
                enabled: Arc::new(AtomicBool::new(true)),
            },
            scheduler,
        }
    }

    pub fn enable(&self) {
        self.pipeline.enabled.store(true, Ordering::SeqCst);
    }

    /// Stops queued and future computations from producing anything. Triggers
    /// still queue, so re-enabling needs no replay bookkeeping.
    pub fn disable(&self) {
        self.pipeline.enabled.store(false, Ordering::SeqCst);
    }

    pub fn on_event(&self, event: &Event) {
        match event {
            Event::ConfigurationScopesAdded { scope_ids } => {
                self.suggest_binding_for_scopes(scope_ids.clone());
            }
            Event::BindingConfigChanged {
                scope_id,
                previous,
                new_config,
            } => {
                // Only the suggestions switch flipping back on re-queues.
                if previous.binding_suggestion_disabled && !new_config.binding_suggestion_disabled
                {
                    self.suggest_binding_for_scopes(vec![scope_id.clone()]);
                }
            }
            Event::ConnectionAdded { connection_id }
            | Event::ConnectionCredentialsChanged { connection_id } => {
                // The connection may already be gone again; benign race.
                if self.pipeline.connections.get(connection_id).is_none() {
                    tracing::debug!(
                        target = "tether.binding",
                        "Connection '{connection_id}' is gone"
                    );
                    return;
                }
                self.suggest_binding_for_connection(connection_id);
            }
            Event::FileSystemUpdated { added_or_updated } => {
                let mut scope_ids: Vec<String> = added_or_updated
                    .iter()
                    .filter(|(_, file_name)| {
                        ALL_BINDING_CLUE_FILENAMES.contains(&file_name.as_str())
                            || file_name == SHARED_CONFIG_FILENAME
                    })
                    .map(|(scope_id, _)| scope_id.clone())
                    .collect();
                scope_ids.sort_unstable();
                scope_ids.dedup();
                if !scope_ids.is_empty() {
                    self.suggest_binding_for_scopes(scope_ids);
                }
            }
            _ => {}
        }
    }

    /// Queues a computation for `config_scope_ids` against every registered
    /// connection.
    pub fn suggest_binding_for_scopes(&self, config_scope_ids: Vec<String>) {
        if config_scope_ids.is_empty() {
            return;
        }
        if self.pipeline.connections.is_empty() {
            tracing::debug!(
                target = "tether.binding",
                "No connections configured, skipping binding suggestions."
            );
            return;
        }
        let candidate_connection_ids: HashSet<String> =
            self.pipeline.connections.connection_ids().into_iter().collect();
        tracing::debug!(
            target = "tether.binding",
            "Binding suggestion computation queued for config scopes '{}'...",
            config_scope_ids.join(",")
        );
        self.queue(config_scope_ids, candidate_connection_ids);
    }

    /// Queues a registry-wide computation restricted to one connection.
    pub fn suggest_binding_for_connection(&self, connection_id: &str) {
        let config_scope_ids = self.pipeline.config.scope_ids();
        if config_scope_ids.is_empty() {
            return;
        }
        tracing::debug!(
            target = "tether.binding",
            "Binding suggestion computation queued for connection '{connection_id}'..."
        );
        self.queue(
            config_scope_ids,
            std::iter::once(connection_id.to_string()).collect(),
        );
    }

    /// Synchronous variant of the pipeline for one scope and one connection.
    /// Runs on the caller's thread and returns the result instead of
    /// notifying the client.
    pub fn get_binding_suggestions(
        &self,
        config_scope_id: &str,
        connection_id: &str,
        token: &CancellationToken,
    ) -> Result<HashMap<String, Vec<BindingSuggestion>>, Cancelled> {
        let candidate_connection_ids: HashSet<String> =
            std::iter::once(connection_id.to_string()).collect();
        self.pipeline.compute_binding_suggestions(
            &[config_scope_id.to_string()],
            &candidate_connection_ids,
            token,
        )
    }

    fn queue(&self, config_scope_ids: Vec<String>, candidate_connection_ids: HashSet<String>) {
        let pipeline = self.pipeline.clone();
        // Fire and forget: dropping the handle detaches the task.
        let _task = self.scheduler.spawn(CancellationToken::new(), move |token| {
            pipeline.compute_and_notify(&config_scope_ids, &candidate_connection_ids, &token)
        });
    }
}

impl Pipeline {
    fn compute_and_notify(
        &self,
        config_scope_ids: &[String],
        candidate_connection_ids: &HashSet<String>,
        token: &CancellationToken,
    ) -> Result<(), Cancelled> {
        if !self.enabled.load(Ordering::SeqCst) {
            tracing::debug!(
                target = "tether.binding",
                "Skipping binding suggestion computation as it is disabled"
            );
            return Ok(());
        }
        let suggestions =
            self.compute_binding_suggestions(config_scope_ids, candidate_connection_ids, token)?;
        if suggestions.is_empty() {
            // No scope survived eligibility; stay quiet.
            return Ok(());
        }
        // A cancelled batch emits no partial notification.
        check_cancelled(token)?;
        self.client.suggest_binding(suggestions);
        Ok(())
    }

    fn compute_binding_suggestions(
        &self,
        config_scope_ids: &[String],
        candidate_connection_ids: &HashSet<String>,
        token: &CancellationToken,
    ) -> Result<HashMap<String, Vec<BindingSuggestion>>, Cancelled> {
        let mut suggestions_by_scope = HashMap::new();
        for config_scope_id in config_scope_ids {
            check_cancelled(token)?;
            let Some(scope) = self.eligible_scope(config_scope_id) else {
                continue;
            };
            let suggestions =
                self.suggest_for_scope(&scope, candidate_connection_ids, token)?;
            tracing::debug!(
                target = "tether.binding",
                "Found {} {} for configuration scope '{config_scope_id}'",
                suggestions.len(),
                single_plural(suggestions.len(), "suggestion", "suggestions")
            );
            suggestions_by_scope.insert(config_scope_id.clone(), suggestions);
        }
        Ok(suggestions_by_scope)
    }

    fn eligible_scope(&self, config_scope_id: &str) -> Option<ConfigurationScope> {
        let Some(scope) = self.config.scope(config_scope_id) else {
            tracing::debug!(
                target = "tether.binding",
                "Configuration scope '{config_scope_id}' is gone."
            );
            return None;
        };
        if !scope.bindable {
            tracing::debug!(
                target = "tether.binding",
                "Configuration scope '{config_scope_id}' is not bindable."
            );
            return None;
        }
        let binding = self.config.binding(config_scope_id)?;
        // A binding to a since-removed connection is orphaned, not bound.
        let bound_to_known_connection = binding
            .as_bound()
            .map_or(false, |(connection_id, _)| {
                self.connections.get(connection_id).is_some()
            });
        if bound_to_known_connection {
            tracing::debug!(
                target = "tether.binding",
                "Configuration scope '{config_scope_id}' is already bound."
            );
            return None;
        }
        if binding.binding_suggestion_disabled {
            tracing::debug!(
                target = "tether.binding",
                "Configuration scope '{config_scope_id}' has binding suggestions disabled."
            );
            return None;
        }
        Some(scope)
    }

    fn suggest_for_scope(
        &self,
        scope: &ConfigurationScope,
        candidate_connection_ids: &HashSet<String>,
        token: &CancellationToken,
    ) -> Result<Vec<BindingSuggestion>, Cancelled> {
        let clues = self.clue_provider.collect_clues_with_connections(
            &scope.id,
            candidate_connection_ids,
            token,
        )?;

        let mut suggestions = Vec::new();
        for clue_with_connections in &clues {
            let clue = &clue_with_connections.clue;
            let Some(project_key) = &clue.project_key else {
                continue;
            };
            let mut connection_ids: Vec<&String> =
                clue_with_connections.connection_ids.iter().collect();
            connection_ids.sort_unstable();
            for connection_id in connection_ids {
                check_cancelled(token)?;
                if let Some(project) =
                    self.projects_cache
                        .get_sonar_project(connection_id, project_key, token)?
                {
                    suggestions.push(BindingSuggestion {
                        config_scope_id: scope.id.clone(),
                        connection_id: connection_id.clone(),
                        project_key: project.key,
                        project_name: project.name,
                        origin: clue.origin,
                        from_shared_configuration: clue.origin
                            == SuggestionOrigin::SharedConfiguration,
                    });
                }
            }
        }

        if suggestions.is_empty() {
            // A key-less clue still narrows where the name search goes; only
            // a clue-less scope searches every candidate connection.
            let keyless_clue_connections: HashSet<&String> = clues
                .iter()
                .filter(|c| c.clue.project_key.is_none())
                .flat_map(|c| c.connection_ids.iter())
                .collect();
            let mut connection_ids: Vec<&String> = if keyless_clue_connections.is_empty() {
                candidate_connection_ids.iter().collect()
            } else {
                keyless_clue_connections.into_iter().collect()
            };
            connection_ids.sort_unstable();
            for connection_id in connection_ids {
                check_cancelled(token)?;
                tracing::debug!(
                    target = "tether.binding",
                    "Attempt to find a good match for '{}' on connection '{connection_id}'...",
                    scope.name
                );
                let index = self
                    .projects_cache
                    .get_text_search_index(connection_id, token)?;
                if let Some((matches, best_score)) = index.best_matches(&scope.name) {
                    tracing::debug!(target = "tether.binding", "Best score = {best_score:.2}");
                    for project in matches {
                        suggestions.push(BindingSuggestion {
                            config_scope_id: scope.id.clone(),
                            connection_id: connection_id.clone(),
                            project_key: project.key.clone(),
                            project_name: project.name.clone(),
                            origin: SuggestionOrigin::ProjectName,
                            from_shared_configuration: false,
                        });
                    }
                }
            }
        }

        Ok(suggestions)
    }
}
