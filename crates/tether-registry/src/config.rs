use std::collections::HashMap;

use parking_lot::RwLock;

use tether_core::{BindingConfiguration, ConfigurationScope};

struct ScopeEntry {
    scope: ConfigurationScope,
    binding: BindingConfiguration,
}

/// Configuration scopes and their binding state, keyed by scope id.
///
/// The backend never creates scopes on its own; the host's configuration
/// collaborator drives all mutations through events.
#[derive(Default)]
pub struct ConfigurationRepository {
    scopes: RwLock<HashMap<String, ScopeEntry>>,
}

impl ConfigurationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(&self, scope: ConfigurationScope, binding: BindingConfiguration) {
        let mut scopes = self.scopes.write();
        if scopes.contains_key(&scope.id) {
            tracing::error!(
                target = "tether.registry",
                "Duplicate configuration scope registered: {}",
                scope.id
            );
        }
        scopes.insert(scope.id.clone(), ScopeEntry { scope, binding });
    }

    pub fn remove_scope(&self, scope_id: &str) -> Option<ConfigurationScope> {
        let removed = self.scopes.write().remove(scope_id);
        if removed.is_none() {
            tracing::debug!(
                target = "tether.registry",
                "Attempted to remove unknown configuration scope '{scope_id}'"
            );
        }
        removed.map(|entry| entry.scope)
    }

    #[must_use]
    pub fn scope(&self, scope_id: &str) -> Option<ConfigurationScope> {
        self.scopes.read().get(scope_id).map(|e| e.scope.clone())
    }

    #[must_use]
    pub fn binding(&self, scope_id: &str) -> Option<BindingConfiguration> {
        self.scopes.read().get(scope_id).map(|e| e.binding.clone())
    }

    /// Replaces the binding in place. Returns the previous value, or `None`
    /// when the scope vanished in the meantime (benign race).
    pub fn set_binding(
        &self,
        scope_id: &str,
        binding: BindingConfiguration,
    ) -> Option<BindingConfiguration> {
        let mut scopes = self.scopes.write();
        match scopes.get_mut(scope_id) {
            Some(entry) => Some(std::mem::replace(&mut entry.binding, binding)),
            None => {
                tracing::debug!(
                    target = "tether.registry",
                    "Attempted to update binding of unknown configuration scope '{scope_id}'"
                );
                None
            }
        }
    }

    #[must_use]
    pub fn scope_ids(&self) -> Vec<String> {
        self.scopes.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scope(id: &str) -> ConfigurationScope {
        ConfigurationScope {
            id: id.to_string(),
            parent_id: None,
            bindable: true,
            name: id.to_string(),
        }
    }

    #[test]
    fn add_and_read_back() {
        let repo = ConfigurationRepository::new();
        repo.add_scope(scope("scope1"), BindingConfiguration::default());

        assert_eq!(repo.scope("scope1"), Some(scope("scope1")));
        assert_eq!(repo.binding("scope1"), Some(BindingConfiguration::default()));
        assert_eq!(repo.scope("other"), None);
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let repo = ConfigurationRepository::new();
        repo.add_scope(scope("scope1"), BindingConfiguration::default());
        let renamed = ConfigurationScope {
            name: "other name".to_string(),
            ..scope("scope1")
        };
        repo.add_scope(renamed.clone(), BindingConfiguration::default());

        assert_eq!(repo.scope("scope1"), Some(renamed));
        assert_eq!(repo.scope_ids(), vec!["scope1".to_string()]);
    }

    #[test]
    fn set_binding_replaces_in_place() {
        let repo = ConfigurationRepository::new();
        repo.add_scope(scope("scope1"), BindingConfiguration::default());

        let bound = BindingConfiguration::bound("conn1", "key1");
        let previous = repo.set_binding("scope1", bound.clone());
        assert_eq!(previous, Some(BindingConfiguration::default()));
        assert_eq!(repo.binding("scope1"), Some(bound));
    }

    #[test]
    fn mutating_missing_scope_is_a_noop() {
        let repo = ConfigurationRepository::new();
        assert_eq!(repo.set_binding("gone", BindingConfiguration::default()), None);
        assert_eq!(repo.remove_scope("gone"), None);
    }
}
