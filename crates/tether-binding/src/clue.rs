use std::collections::HashSet;
use std::sync::Arc;

use tether_core::{single_plural, urls_match, ConnectionConfiguration, SuggestionOrigin};
use tether_registry::ConnectionRepository;
use tether_scheduler::{check_cancelled, CancellationToken, Cancelled};

use crate::fs::{ClientFile, ClientFileSystem};
use crate::properties;

pub const SCANNER_CONFIG_FILENAME: &str = "sonar-project.properties";
pub const AUTOSCAN_CONFIG_FILENAME: &str = ".sonarcloud.properties";
pub const SHARED_CONFIG_FILENAME: &str = "connectedMode.json";

/// File names that can carry binding clues, shared configuration aside.
pub const ALL_BINDING_CLUE_FILENAMES: [&str; 2] =
    [SCANNER_CONFIG_FILENAME, AUTOSCAN_CONFIG_FILENAME];

/// Which kind of server a clue points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingClueKind {
    SonarQube { server_url: String },
    SonarCloud { organization: Option<String> },
    Unknown,
}

/// Local evidence that a scope belongs to some remote project. Ephemeral:
/// recomputed on every scan, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingClue {
    pub kind: BindingClueKind,
    pub project_key: Option<String>,
    pub origin: SuggestionOrigin,
}

/// A clue together with the candidate connections it is compatible with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingClueWithConnections {
    pub clue: BindingClue,
    pub connection_ids: HashSet<String>,
}

struct ConnectionProperties {
    project_key: Option<String>,
    organization: Option<String>,
    server_url: Option<String>,
}

/// Scans a scope's files for binding clues and correlates them against the
/// known connections.
pub struct BindingClueProvider {
    connections: Arc<ConnectionRepository>,
    fs: Arc<dyn ClientFileSystem>,
    sonarcloud_url: String,
}

impl BindingClueProvider {
    pub fn new(
        connections: Arc<ConnectionRepository>,
        fs: Arc<dyn ClientFileSystem>,
        sonarcloud_url: impl Into<String>,
    ) -> Self {
        Self {
            connections,
            fs,
            sonarcloud_url: sonarcloud_url.into(),
        }
    }

    /// Collects this scope's clues and keeps only the ones compatible with at
    /// least one of `candidate_connection_ids`.
    pub fn collect_clues_with_connections(
        &self,
        scope_id: &str,
        candidate_connection_ids: &HashSet<String>,
        token: &CancellationToken,
    ) -> Result<Vec<BindingClueWithConnections>, Cancelled> {
        let clues = self.collect_clues(scope_id, token)?;
        Ok(self.match_connections(clues, candidate_connection_ids))
    }

    fn collect_clues(
        &self,
        scope_id: &str,
        token: &CancellationToken,
    ) -> Result<Vec<BindingClue>, Cancelled> {
        // Shared configuration wins: when `.sonarlint/connectedMode.json`
        // yields clues, scanner properties files are not consulted.
        let shared_files = self.fs.find_sonarlint_configuration_files_by_scope(scope_id);
        if !shared_files.is_empty() {
            let clues = self.collect_from_files(&shared_files, token)?;
            if !clues.is_empty() {
                tracing::debug!(
                    target = "tether.binding",
                    "Found {} binding {} from shared configuration files",
                    clues.len(),
                    single_plural(clues.len(), "clue", "clues")
                );
                return Ok(clues);
            }
        }

        let clue_files = self
            .fs
            .find_files_by_names_in_scope(scope_id, &ALL_BINDING_CLUE_FILENAMES);
        if !clue_files.is_empty() {
            let clues = self.collect_from_files(&clue_files, token)?;
            if !clues.is_empty() {
                tracing::debug!(
                    target = "tether.binding",
                    "Found {} binding {}",
                    clues.len(),
                    single_plural(clues.len(), "clue", "clues")
                );
                return Ok(clues);
            }
        }

        tracing::debug!(target = "tether.binding", "No binding clues were found");
        Ok(Vec::new())
    }

    fn collect_from_files(
        &self,
        files: &[ClientFile],
        token: &CancellationToken,
    ) -> Result<Vec<BindingClue>, Cancelled> {
        let mut clues = Vec::new();
        for file in files {
            check_cancelled(token)?;
            let Some(props) = extract_connection_properties(file) else {
                continue;
            };
            if let Some(clue) = self.compute_clue(file, &props) {
                clues.push(clue);
            }
        }
        Ok(clues)
    }

    fn compute_clue(&self, file: &ClientFile, props: &ConnectionProperties) -> Option<BindingClue> {
        let shared = file.is_sonarlint_configuration();
        let origin_or = |origin: SuggestionOrigin| {
            if shared {
                SuggestionOrigin::SharedConfiguration
            } else {
                origin
            }
        };

        if file.file_name() == AUTOSCAN_CONFIG_FILENAME || props.organization.is_some() {
            return Some(BindingClue {
                kind: BindingClueKind::SonarCloud {
                    organization: props.organization.clone(),
                },
                project_key: props.project_key.clone(),
                origin: origin_or(SuggestionOrigin::PropertiesFile),
            });
        }
        if let Some(server_url) = &props.server_url {
            let kind = if urls_match(server_url, &self.sonarcloud_url) {
                BindingClueKind::SonarCloud { organization: None }
            } else {
                BindingClueKind::SonarQube {
                    server_url: server_url.clone(),
                }
            };
            return Some(BindingClue {
                kind,
                project_key: props.project_key.clone(),
                origin: origin_or(SuggestionOrigin::RemoteUrl),
            });
        }
        if let Some(project_key) = &props.project_key {
            return Some(BindingClue {
                kind: BindingClueKind::Unknown,
                project_key: Some(project_key.clone()),
                origin: origin_or(SuggestionOrigin::PropertiesFile),
            });
        }
        None
    }

    fn match_connections(
        &self,
        clues: Vec<BindingClue>,
        candidate_connection_ids: &HashSet<String>,
    ) -> Vec<BindingClueWithConnections> {
        let mut clues_and_connections = Vec::new();
        for clue in clues {
            let connection_ids = self.compatible_connections(&clue, candidate_connection_ids);
            if !connection_ids.is_empty() {
                clues_and_connections.push(BindingClueWithConnections {
                    clue,
                    connection_ids,
                });
            }
        }
        tracing::debug!(
            target = "tether.binding",
            "{} {} having at least one matching connection",
            clues_and_connections.len(),
            single_plural(clues_and_connections.len(), "clue", "clues")
        );
        clues_and_connections
    }

    fn compatible_connections(
        &self,
        clue: &BindingClue,
        candidate_connection_ids: &HashSet<String>,
    ) -> HashSet<String> {
        match &clue.kind {
            BindingClueKind::SonarQube { server_url } => candidate_connection_ids
                .iter()
                .filter(|id| {
                    self.connections
                        .get(id)
                        .is_some_and(|config| config.is_same_server_url(server_url))
                })
                .cloned()
                .collect(),
            BindingClueKind::SonarCloud { organization } => candidate_connection_ids
                .iter()
                .filter(|id| match self.connections.get(id) {
                    Some(ConnectionConfiguration::SonarCloud {
                        organization: connection_org,
                        ..
                    }) => organization
                        .as_ref()
                        .map_or(true, |org| *org == connection_org),
                    _ => false,
                })
                .cloned()
                .collect(),
            BindingClueKind::Unknown => candidate_connection_ids.clone(),
        }
    }
}

fn extract_connection_properties(file: &ClientFile) -> Option<ConnectionProperties> {
    tracing::debug!(
        target = "tether.binding",
        "Extracting scanner properties from {}",
        file.uri()
    );
    let content = match file.content() {
        Ok(content) => content,
        Err(err) => {
            tracing::error!(
                target = "tether.binding",
                "Unable to read content of file '{}': {err}",
                file.uri()
            );
            return None;
        }
    };

    if file.is_sonarlint_configuration() {
        extract_shared_configuration(file, &content)
    } else {
        match properties::parse(&content) {
            Ok(props) => Some(ConnectionProperties {
                project_key: trimmed(props.get("sonar.projectKey")),
                organization: trimmed(props.get("sonar.organization")),
                server_url: trimmed(props.get("sonar.host.url")),
            }),
            Err(err) => {
                tracing::error!(
                    target = "tether.binding",
                    "Unable to parse content of file '{}': {err}",
                    file.uri()
                );
                None
            }
        }
    }
}

fn extract_shared_configuration(file: &ClientFile, content: &str) -> Option<ConnectionProperties> {
    let json: serde_json::Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(
                target = "tether.binding",
                "Unable to parse content of file '{}': {err}",
                file.uri()
            );
            return None;
        }
    };

    // Shared configuration files exist in both camelCase and PascalCase
    // variants in the wild; accept both.
    let field = |camel: &str, pascal: &str| {
        json.get(camel)
            .or_else(|| json.get(pascal))
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(ConnectionProperties {
        project_key: field("projectKey", "ProjectKey"),
        organization: field("sonarCloudOrganization", "SonarCloudOrganization"),
        server_url: field("sonarQubeUri", "SonarQubeUri"),
    })
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
