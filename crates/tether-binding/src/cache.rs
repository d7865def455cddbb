use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_fuzzy::TextSearchIndex;
use tether_registry::Event;
use tether_scheduler::{CancellationToken, Cancelled};
use tether_server_api::{ApiError, ServerProject};

use crate::client_manager::SonarQubeClientManager;

/// Memoizes per-connection project lookups and name indexes.
///
/// Lookups that completed are cached, including misses: a project the server
/// said does not exist stays absent until an event for that connection evicts
/// the entry. Cancellation and credential rejection are transient, so those
/// outcomes are never cached.
pub struct SonarProjectsCache {
    client_manager: Arc<SonarQubeClientManager>,
    projects: Mutex<HashMap<(String, String), Option<ServerProject>>>,
    indexes: Mutex<HashMap<String, Arc<TextSearchIndex<ServerProject>>>>,
}

impl SonarProjectsCache {
    pub fn new(client_manager: Arc<SonarQubeClientManager>) -> Self {
        Self {
            client_manager,
            projects: Mutex::new(HashMap::new()),
            indexes: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches one remote project, memoized per `(connection, key)` pair.
    /// `Ok(None)` can mean a cached miss, a fresh miss, a skipped request, or
    /// a failed one.
    pub fn get_sonar_project(
        &self,
        connection_id: &str,
        project_key: &str,
        token: &CancellationToken,
    ) -> Result<Option<ServerProject>, Cancelled> {
        let cache_key = (connection_id.to_string(), project_key.to_string());
        if let Some(cached) = self.projects.lock().get(&cache_key) {
            return Ok(cached.clone());
        }

        tracing::debug!(
            target = "tether.binding",
            "Query project '{project_key}' on connection '{connection_id}'..."
        );
        let outcome = self
            .client_manager
            .with_active_client_and_return(connection_id, |api| {
                api.get_project(project_key, token)
            });

        match outcome {
            None => Ok(None),
            Some(Ok(project)) => {
                self.projects.lock().insert(cache_key, project.clone());
                Ok(project)
            }
            Some(Err(ApiError::Cancelled)) => Err(Cancelled),
            Some(Err(ApiError::Unauthorized)) => Ok(None),
            Some(Err(err)) => {
                tracing::debug!(
                    target = "tether.binding",
                    "Error while querying project '{project_key}' from connection '{connection_id}': {err}"
                );
                self.projects.lock().insert(cache_key, None);
                Ok(None)
            }
        }
    }

    /// Returns the connection's project-name search index, building it from
    /// `search_projects` on first use. A failed listing is memoized as an
    /// empty index until evicted.
    pub fn get_text_search_index(
        &self,
        connection_id: &str,
        token: &CancellationToken,
    ) -> Result<Arc<TextSearchIndex<ServerProject>>, Cancelled> {
        if let Some(cached) = self.indexes.lock().get(connection_id) {
            return Ok(Arc::clone(cached));
        }

        tracing::debug!(
            target = "tether.binding",
            "Load projects from connection '{connection_id}'..."
        );
        let outcome = self
            .client_manager
            .with_active_client_and_return(connection_id, |api| api.search_projects(token));

        match outcome {
            None => Ok(Arc::new(TextSearchIndex::new())),
            Some(Err(ApiError::Cancelled)) => Err(Cancelled),
            Some(Err(ApiError::Unauthorized)) => Ok(Arc::new(TextSearchIndex::new())),
            Some(result) => {
                let mut index = TextSearchIndex::new();
                match result {
                    Ok(projects) => {
                        tracing::debug!(
                            target = "tether.binding",
                            "Creating index for {} {}",
                            projects.len(),
                            tether_core::single_plural(projects.len(), "project", "projects")
                        );
                        for project in projects {
                            let name = project.name.clone();
                            index.index(project, &name);
                        }
                    }
                    Err(err) => {
                        tracing::debug!(
                            target = "tether.binding",
                            "Error while loading projects from connection '{connection_id}': {err}"
                        );
                    }
                }
                let index = Arc::new(index);
                self.indexes
                    .lock()
                    .insert(connection_id.to_string(), Arc::clone(&index));
                Ok(index)
            }
        }
    }

    /// Event hook. Connection changes drop everything cached for that
    /// connection.
    pub fn on_event(&self, event: &Event) {
        match event {
            Event::ConnectionUpdated { connection_id }
            | Event::ConnectionRemoved { connection_id } => {
                self.evict_connection(connection_id);
            }
            _ => {}
        }
    }

    fn evict_connection(&self, connection_id: &str) {
        self.projects
            .lock()
            .retain(|(cached_connection_id, _), _| cached_connection_id != connection_id);
        self.indexes.lock().remove(connection_id);
    }
}
