use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tether_core::{ConfigurationScope, SuggestionOrigin};
use tether_registry::ConfigurationRepository;
use tether_scheduler::{CancellationToken, Cancelled};

use crate::cache::SonarProjectsCache;
use crate::clue::BindingClueProvider;

/// Reverse lookup: given a known remote project, find the local scopes worth
/// suggesting it to.
pub struct BindingCandidatesFinder {
    config: Arc<ConfigurationRepository>,
    clue_provider: Arc<BindingClueProvider>,
    projects_cache: Arc<SonarProjectsCache>,
}

impl BindingCandidatesFinder {
    pub fn new(
        config: Arc<ConfigurationRepository>,
        clue_provider: Arc<BindingClueProvider>,
        projects_cache: Arc<SonarProjectsCache>,
    ) -> Self {
        Self {
            config,
            clue_provider,
            projects_cache,
        }
    }

    /// Maps each unbound, bindable scope to the best origin under which the
    /// `(connection, project)` pair could be suggested to it. One origin per
    /// scope: shared configuration beats any other clue, which beats a plain
    /// display-name match.
    pub fn find_config_scopes_to_bind(
        &self,
        connection_id: &str,
        project_key: &str,
        token: &CancellationToken,
    ) -> Result<HashMap<ConfigurationScope, SuggestionOrigin>, Cancelled> {
        let candidate_connections: HashSet<String> =
            std::iter::once(connection_id.to_string()).collect();
        let mut scopes_to_bind = HashMap::new();

        for scope_id in self.config.scope_ids() {
            let Some(scope) = self.config.scope(&scope_id) else {
                continue;
            };
            if !scope.bindable {
                continue;
            }
            let already_bound = self
                .config
                .binding(&scope_id)
                .map_or(false, |binding| binding.as_bound().is_some());
            if already_bound {
                continue;
            }

            let clues = self.clue_provider.collect_clues_with_connections(
                &scope_id,
                &candidate_connections,
                token,
            )?;

            if clues
                .iter()
                .any(|c| c.clue.origin == SuggestionOrigin::SharedConfiguration)
            {
                scopes_to_bind.insert(scope, SuggestionOrigin::SharedConfiguration);
                continue;
            }
            if let Some(first) = clues.first() {
                scopes_to_bind.insert(scope, first.clue.origin);
                continue;
            }

            if let Some(project) =
                self.projects_cache
                    .get_sonar_project(connection_id, project_key, token)?
            {
                if scope.name.eq_ignore_ascii_case(&project.name) {
                    scopes_to_bind.insert(scope, SuggestionOrigin::ProjectName);
                }
            }
        }

        Ok(scopes_to_bind)
    }
}
