use tether_core::ConnectionConfiguration;

/// Resolved endpoint for a connection: base URL (trailing slash stripped),
/// whether this is SonarCloud, and the organization for SonarCloud calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointParams {
    base_url: String,
    is_sonar_cloud: bool,
    organization: Option<String>,
}

impl EndpointParams {
    pub fn new(base_url: &str, is_sonar_cloud: bool, organization: Option<String>) -> Self {
        Self {
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_string(),
            is_sonar_cloud,
            organization,
        }
    }

    #[must_use]
    pub fn for_connection(config: &ConnectionConfiguration) -> Self {
        match config {
            ConnectionConfiguration::SonarQube { server_url, .. } => {
                Self::new(server_url, false, None)
            }
            ConnectionConfiguration::SonarCloud {
                organization,
                region,
                ..
            } => Self::new(region.base_url(), true, Some(organization.clone())),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn is_sonar_cloud(&self) -> bool {
        self.is_sonar_cloud
    }

    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }
}

/// How to authenticate against a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Anonymous,
    Token(String),
    Basic { username: String, password: String },
}

/// Resolves credentials for a connection id. Secrets live with the host (its
/// keychain, settings store, ...), never in the connection registry.
pub trait CredentialsProvider: Send + Sync {
    fn credentials(&self, connection_id: &str) -> Credentials;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tether_core::SonarCloudRegion;

    #[test]
    fn strips_single_trailing_slash() {
        let endpoint = EndpointParams::new("https://sonar.example.com/", false, None);
        assert_eq!(endpoint.base_url(), "https://sonar.example.com");
    }

    #[test]
    fn sonarqube_connection_keeps_configured_url() {
        let config = ConnectionConfiguration::sonarqube("sq1", "https://sonar.example.com/");
        let endpoint = EndpointParams::for_connection(&config);
        assert_eq!(endpoint.base_url(), "https://sonar.example.com");
        assert!(!endpoint.is_sonar_cloud());
        assert_eq!(endpoint.organization(), None);
    }

    #[test]
    fn sonarcloud_connection_uses_region_base_url() {
        let config = ConnectionConfiguration::SonarCloud {
            id: "sc1".to_string(),
            organization: "my-org".to_string(),
            region: SonarCloudRegion::Us,
            disable_notifications: false,
        };
        let endpoint = EndpointParams::for_connection(&config);
        assert_eq!(endpoint.base_url(), "https://sonarqube.us");
        assert!(endpoint.is_sonar_cloud());
        assert_eq!(endpoint.organization(), Some("my-org"));
    }
}
