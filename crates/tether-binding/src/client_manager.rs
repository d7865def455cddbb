use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tether_registry::{ConnectionRepository, Event};
use tether_server_api::{
    ApiError, CredentialsProvider, EndpointParams, ServerApi, ServerApiProvider,
};

use crate::client::BackendClient;

/// A per-connection server client with its validity bit.
///
/// A client starts ACTIVE and turns INVALID the first time the server rejects
/// its credentials. INVALID clients stay in the map and short-circuit every
/// further request until an event rebuilds them.
struct ConnectionClient {
    api: Arc<dyn ServerApi>,
    active: AtomicBool,
}

impl ConnectionClient {
    fn new(api: Arc<dyn ServerApi>) -> Self {
        Self {
            api,
            active: AtomicBool::new(true),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Marks the client INVALID. Returns true only for the transition, so the
    /// caller can notify exactly once.
    fn invalidate(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }
}

/// Hands out server clients keyed by connection id, caching one per
/// connection and tracking whether its credentials are still accepted.
pub struct SonarQubeClientManager {
    connections: Arc<ConnectionRepository>,
    credentials: Arc<dyn CredentialsProvider>,
    api_provider: Arc<dyn ServerApiProvider>,
    client: Arc<dyn BackendClient>,
    clients_by_connection_id: Mutex<HashMap<String, Arc<ConnectionClient>>>,
}

impl SonarQubeClientManager {
    pub fn new(
        connections: Arc<ConnectionRepository>,
        credentials: Arc<dyn CredentialsProvider>,
        api_provider: Arc<dyn ServerApiProvider>,
        client: Arc<dyn BackendClient>,
    ) -> Self {
        Self {
            connections,
            credentials,
            api_provider,
            client,
            clients_by_connection_id: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` against the connection's client when the connection exists
    /// and its credentials are not known to be rejected.
    ///
    /// Returns `None` when the request was skipped entirely. When `f` ran,
    /// its result is returned as-is, after recording an `Unauthorized`
    /// outcome against the client.
    pub fn with_active_client_and_return<R>(
        &self,
        connection_id: &str,
        f: impl FnOnce(&dyn ServerApi) -> Result<R, ApiError>,
    ) -> Option<Result<R, ApiError>> {
        let connection_client = self.get_or_create_client(connection_id)?;
        if !connection_client.is_active() {
            tracing::debug!(
                target = "tether.binding",
                "Connection '{connection_id}' is invalid"
            );
            return None;
        }

        let result = f(connection_client.api.as_ref());
        if matches!(result, Err(ApiError::Unauthorized)) && connection_client.invalidate() {
            self.client.invalid_token(connection_id);
        }
        Some(result)
    }

    /// [`Self::with_active_client_and_return`] for callers that only care
    /// about side effects.
    pub fn with_active_client(
        &self,
        connection_id: &str,
        f: impl FnOnce(&dyn ServerApi) -> Result<(), ApiError>,
    ) {
        self.with_active_client_and_return(connection_id, f);
    }

    fn get_or_create_client(&self, connection_id: &str) -> Option<Arc<ConnectionClient>> {
        let mut clients = self.clients_by_connection_id.lock();
        if let Some(existing) = clients.get(connection_id) {
            return Some(Arc::clone(existing));
        }

        let Some(config) = self.connections.get(connection_id) else {
            tracing::debug!(
                target = "tether.binding",
                "Connection '{connection_id}' is gone"
            );
            return None;
        };

        let params = EndpointParams::for_connection(&config);
        let credentials = self.credentials.credentials(connection_id);
        let api = self.api_provider.create(&params, &credentials);
        let connection_client = Arc::new(ConnectionClient::new(api));
        clients.insert(connection_id.to_string(), Arc::clone(&connection_client));
        Some(connection_client)
    }

    /// Event hook. Updated or re-credentialed connections drop their cached
    /// client so the next request rebuilds one in the ACTIVE state.
    pub fn on_event(&self, event: &Event) {
        match event {
            Event::ConnectionUpdated { connection_id }
            | Event::ConnectionCredentialsChanged { connection_id }
            | Event::ConnectionRemoved { connection_id } => {
                self.clients_by_connection_id.lock().remove(connection_id);
            }
            _ => {}
        }
    }
}
