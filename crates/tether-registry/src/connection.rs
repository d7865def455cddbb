use std::collections::HashMap;

use parking_lot::RwLock;

use tether_core::ConnectionConfiguration;

/// Known remote connections, keyed by connection id.
#[derive(Default)]
pub struct ConnectionRepository {
    connections: RwLock<HashMap<String, ConnectionConfiguration>>,
}

impl ConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection. A duplicate id overwrites the previous entry
    /// and is reported at ERROR level.
    pub fn register(&self, config: ConnectionConfiguration) {
        let mut connections = self.connections.write();
        let id = config.id().to_string();
        if connections.contains_key(&id) {
            tracing::error!(
                target = "tether.registry",
                "Duplicate connection registered: {id}"
            );
        }
        connections.insert(id, config);
    }

    pub fn remove(&self, connection_id: &str) -> Option<ConnectionConfiguration> {
        let removed = self.connections.write().remove(connection_id);
        if removed.is_none() {
            tracing::debug!(
                target = "tether.registry",
                "Attempted to remove unknown connection '{connection_id}'"
            );
        }
        removed
    }

    #[must_use]
    pub fn get(&self, connection_id: &str) -> Option<ConnectionConfiguration> {
        self.connections.read().get(connection_id).cloned()
    }

    #[must_use]
    pub fn connection_ids(&self) -> Vec<String> {
        self.connections.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_and_lookup() {
        let repo = ConnectionRepository::new();
        repo.register(ConnectionConfiguration::sonarqube("sq1", "https://sonar.example.com"));

        assert!(repo.get("sq1").is_some());
        assert_eq!(repo.get("missing"), None);
        assert_eq!(repo.connection_ids(), vec!["sq1".to_string()]);
    }

    #[test]
    fn duplicate_id_overwrites() {
        let repo = ConnectionRepository::new();
        repo.register(ConnectionConfiguration::sonarqube("sq1", "https://one.example.com"));
        repo.register(ConnectionConfiguration::sonarqube("sq1", "https://two.example.com"));

        let config = repo.get("sq1").expect("connection");
        assert!(config.is_same_server_url("https://two.example.com"));
    }

    #[test]
    fn remove_missing_is_a_noop() {
        let repo = ConnectionRepository::new();
        assert_eq!(repo.remove("missing"), None);
    }
}
