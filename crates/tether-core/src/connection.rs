/// SonarCloud hosting region. Each region has its own base URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SonarCloudRegion {
    Eu,
    Us,
}

impl SonarCloudRegion {
    #[must_use]
    pub fn base_url(self) -> &'static str {
        match self {
            SonarCloudRegion::Eu => "https://sonarcloud.io",
            SonarCloudRegion::Us => "https://sonarqube.us",
        }
    }
}

/// A configured remote connection. Identity is the `id`; uniqueness is
/// enforced by the connection registry, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionConfiguration {
    SonarQube {
        id: String,
        server_url: String,
        disable_notifications: bool,
    },
    SonarCloud {
        id: String,
        organization: String,
        region: SonarCloudRegion,
        disable_notifications: bool,
    },
}

impl ConnectionConfiguration {
    pub fn sonarqube(id: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self::SonarQube {
            id: id.into(),
            server_url: server_url.into(),
            disable_notifications: false,
        }
    }

    pub fn sonarcloud(id: impl Into<String>, organization: impl Into<String>) -> Self {
        Self::SonarCloud {
            id: id.into(),
            organization: organization.into(),
            region: SonarCloudRegion::Eu,
            disable_notifications: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::SonarQube { id, .. } | Self::SonarCloud { id, .. } => id,
        }
    }

    /// For SonarQube connections, whether `url` points at the same server.
    #[must_use]
    pub fn is_same_server_url(&self, url: &str) -> bool {
        match self {
            Self::SonarQube { server_url, .. } => urls_match(server_url, url),
            Self::SonarCloud { .. } => false,
        }
    }
}

/// Server URL equality: case-insensitive, tolerating a single trailing `/`.
#[must_use]
pub fn urls_match(left: &str, right: &str) -> bool {
    let left = left.strip_suffix('/').unwrap_or(left);
    let right = right.strip_suffix('/').unwrap_or(right);
    left.eq_ignore_ascii_case(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_match_ignores_case_and_trailing_slash() {
        assert!(urls_match("https://mycompany.pl", "https://mycompany.pl/"));
        assert!(urls_match("https://MyCompany.pl", "https://mycompany.pl"));
        assert!(urls_match("https://mycompany.pl/", "https://mycompany.pl/"));
        assert!(!urls_match("https://mycompany.pl", "https://other.pl"));
        // Only one trailing slash is tolerated.
        assert!(!urls_match("https://mycompany.pl//", "https://mycompany.pl"));
    }

    #[test]
    fn same_server_url_only_applies_to_sonarqube() {
        let sq = ConnectionConfiguration::sonarqube("sq", "https://sonar.example.com/");
        assert!(sq.is_same_server_url("https://SONAR.example.com"));

        let sc = ConnectionConfiguration::sonarcloud("sc", "org");
        assert!(!sc.is_same_server_url("https://sonarcloud.io"));
    }
}
