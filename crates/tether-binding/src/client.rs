use std::collections::HashMap;

use tether_core::BindingSuggestion;

/// Notifications the backend pushes to its host.
///
/// `suggest_binding` delivers one batch per trigger: suggestions for every
/// affected scope arrive together, never streamed scope by scope.
pub trait BackendClient: Send + Sync {
    fn suggest_binding(&self, suggestions_by_scope: HashMap<String, Vec<BindingSuggestion>>);

    /// The connection's credentials were rejected by the server. Sent at most
    /// once per ACTIVE → INVALID transition.
    fn invalid_token(&self, connection_id: &str);
}
