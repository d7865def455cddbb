/// Provenance of a binding clue or suggestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuggestionOrigin {
    /// A `.sonarlint/connectedMode.json` shared configuration file.
    SharedConfiguration,
    /// A scanner properties file that names a project without a server URL.
    PropertiesFile,
    /// A scanner properties file that names the server URL.
    RemoteUrl,
    /// Fuzzy match between the scope display name and a remote project name.
    ProjectName,
}

/// One ranked binding proposal for a configuration scope. Pure output value,
/// never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingSuggestion {
    pub config_scope_id: String,
    pub connection_id: String,
    pub project_key: String,
    pub project_name: String,
    pub origin: SuggestionOrigin,
    pub from_shared_configuration: bool,
}
