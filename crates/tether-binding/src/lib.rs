//! Binding suggestion backend: matches local configuration scopes against
//! remote Sonar projects.
//!
//! The backend is a library embedded in a host process. The host feeds it
//! scope, binding and connection mutations; the backend reacts by scanning
//! clue files, querying the remote server through a per-connection cache, and
//! pushing ranked binding suggestions back through the [`BackendClient`]
//! callback. All heavy work runs on a background pool; event handlers never
//! block.

mod cache;
mod candidates;
mod client;
mod client_manager;
mod clue;
mod fs;
mod properties;
mod suggestions;

use std::collections::HashMap;
use std::sync::Arc;

use tether_core::{
    BindingConfiguration, BindingSuggestion, ConfigurationScope, ConnectionConfiguration,
    SonarCloudRegion, SuggestionOrigin,
};
use tether_registry::{
    validate_connection, ConfigurationRepository, ConnectionRepository, Event, EventBus,
    InvalidConnectionParams,
};
use tether_scheduler::{BackgroundScheduler, CancellationToken, Cancelled};
use tether_server_api::{CredentialsProvider, ServerApiProvider};

pub use cache::SonarProjectsCache;
pub use candidates::BindingCandidatesFinder;
pub use client::BackendClient;
pub use client_manager::SonarQubeClientManager;
pub use clue::{
    BindingClue, BindingClueKind, BindingClueProvider, BindingClueWithConnections,
    ALL_BINDING_CLUE_FILENAMES, AUTOSCAN_CONFIG_FILENAME, SCANNER_CONFIG_FILENAME,
    SHARED_CONFIG_FILENAME,
};
pub use fs::{ClientFile, ClientFileSystem, LocalFileSystem};
pub use suggestions::BindingSuggestionProvider;

/// The wired-up backend. Owns the registries, the event bus, and every
/// suggestion component, and exposes the mutation surface the host drives.
pub struct Backend {
    config: Arc<ConfigurationRepository>,
    connections: Arc<ConnectionRepository>,
    events: Arc<EventBus>,
    suggestion_provider: Arc<BindingSuggestionProvider>,
    candidates_finder: BindingCandidatesFinder,
}

impl Backend {
    pub fn new(
        client: Arc<dyn BackendClient>,
        fs: Arc<dyn ClientFileSystem>,
        credentials: Arc<dyn CredentialsProvider>,
        api_provider: Arc<dyn ServerApiProvider>,
    ) -> Self {
        let config = Arc::new(ConfigurationRepository::new());
        let connections = Arc::new(ConnectionRepository::new());
        let events = Arc::new(EventBus::new());

        let clue_provider = Arc::new(BindingClueProvider::new(
            Arc::clone(&connections),
            fs,
            SonarCloudRegion::Eu.base_url(),
        ));
        let client_manager = Arc::new(SonarQubeClientManager::new(
            Arc::clone(&connections),
            credentials,
            api_provider,
            Arc::clone(&client),
        ));
        let projects_cache = Arc::new(SonarProjectsCache::new(Arc::clone(&client_manager)));
        let suggestion_provider = Arc::new(BindingSuggestionProvider::new(
            Arc::clone(&config),
            Arc::clone(&connections),
            Arc::clone(&clue_provider),
            Arc::clone(&projects_cache),
            client,
            BackgroundScheduler::default(),
        ));
        let candidates_finder = BindingCandidatesFinder::new(
            Arc::clone(&config),
            clue_provider,
            Arc::clone(&projects_cache),
        );

        // Eviction handlers run before the suggestion provider so a requeued
        // computation always sees fresh clients and caches.
        {
            let projects_cache = Arc::clone(&projects_cache);
            events.subscribe(move |event| projects_cache.on_event(event));
        }
        {
            let client_manager = Arc::clone(&client_manager);
            events.subscribe(move |event| client_manager.on_event(event));
        }
        {
            let suggestion_provider = Arc::clone(&suggestion_provider);
            events.subscribe(move |event| suggestion_provider.on_event(event));
        }

        Self {
            config,
            connections,
            events,
            suggestion_provider,
            candidates_finder,
        }
    }

    /// Registers scopes and queues suggestions for them in one batch.
    pub fn add_configuration_scopes(
        &self,
        scopes: Vec<(ConfigurationScope, BindingConfiguration)>,
    ) {
        let scope_ids: Vec<String> = scopes.iter().map(|(scope, _)| scope.id.clone()).collect();
        for (scope, binding) in scopes {
            self.config.add_scope(scope, binding);
        }
        self.events
            .publish(&Event::ConfigurationScopesAdded { scope_ids });
    }

    pub fn remove_configuration_scope(&self, scope_id: &str) {
        if self.config.remove_scope(scope_id).is_some() {
            self.events.publish(&Event::ConfigurationScopeRemoved {
                scope_id: scope_id.to_string(),
            });
        }
    }

    /// Replaces a scope's binding. A no-op when the scope is unknown.
    pub fn update_binding(&self, scope_id: &str, new_config: BindingConfiguration) {
        if let Some(previous) = self.config.set_binding(scope_id, new_config.clone()) {
            self.events.publish(&Event::BindingConfigChanged {
                scope_id: scope_id.to_string(),
                previous,
                new_config,
            });
        }
    }

    /// Validates and registers a connection. Validation failures leave the
    /// registry untouched.
    pub fn add_connection(
        &self,
        connection: ConnectionConfiguration,
    ) -> Result<(), InvalidConnectionParams> {
        validate_connection(&connection)?;
        let connection_id = connection.id().to_string();
        self.connections.register(connection);
        self.events
            .publish(&Event::ConnectionAdded { connection_id });
        Ok(())
    }

    /// Validates and replaces a connection. Registering an id that was not
    /// known yet degrades to an add.
    pub fn update_connection(
        &self,
        connection: ConnectionConfiguration,
    ) -> Result<(), InvalidConnectionParams> {
        validate_connection(&connection)?;
        let connection_id = connection.id().to_string();
        let existed = self.connections.remove(&connection_id).is_some();
        self.connections.register(connection);
        if existed {
            self.events
                .publish(&Event::ConnectionUpdated { connection_id });
        } else {
            self.events
                .publish(&Event::ConnectionAdded { connection_id });
        }
        Ok(())
    }

    pub fn remove_connection(&self, connection_id: &str) {
        if self.connections.remove(connection_id).is_some() {
            self.events.publish(&Event::ConnectionRemoved {
                connection_id: connection_id.to_string(),
            });
        }
    }

    /// The host rotated this connection's credentials: rebuild its client and
    /// retry suggestions.
    pub fn notify_credentials_changed(&self, connection_id: &str) {
        self.events.publish(&Event::ConnectionCredentialsChanged {
            connection_id: connection_id.to_string(),
        });
    }

    /// Files created or changed, as `(scope_id, file_name)` pairs. Scopes
    /// whose clue files changed get their suggestions recomputed.
    pub fn notify_filesystem_updated(&self, added_or_updated: Vec<(String, String)>) {
        self.events
            .publish(&Event::FileSystemUpdated { added_or_updated });
    }

    pub fn enable_binding_suggestions(&self) {
        self.suggestion_provider.enable();
    }

    pub fn disable_binding_suggestions(&self) {
        self.suggestion_provider.disable();
    }

    /// Synchronous suggestion computation for one scope and one connection.
    pub fn get_binding_suggestions(
        &self,
        config_scope_id: &str,
        connection_id: &str,
        token: &CancellationToken,
    ) -> Result<HashMap<String, Vec<BindingSuggestion>>, Cancelled> {
        self.suggestion_provider
            .get_binding_suggestions(config_scope_id, connection_id, token)
    }

    /// Reverse lookup: the scopes a known remote project should be suggested
    /// to, with the origin justifying each.
    pub fn find_config_scopes_to_bind(
        &self,
        connection_id: &str,
        project_key: &str,
        token: &CancellationToken,
    ) -> Result<HashMap<ConfigurationScope, SuggestionOrigin>, Cancelled> {
        self.candidates_finder
            .find_config_scopes_to_bind(connection_id, project_key, token)
    }
}
