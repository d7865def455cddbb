use std::fmt;

use url::Url;

use tether_core::ConnectionConfiguration;

/// One rejected field with a human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Synchronous, structured rejection of malformed connection parameters.
///
/// Registration never partially applies: a validation failure leaves the
/// registry untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidConnectionParams {
    pub field_errors: Vec<FieldError>,
}

impl std::error::Error for InvalidConnectionParams {}

impl fmt::Display for InvalidConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid connection parameters:")?;
        for error in &self.field_errors {
            write!(f, " {}: {};", error.field, error.message)?;
        }
        Ok(())
    }
}

pub fn validate_connection(
    config: &ConnectionConfiguration,
) -> Result<(), InvalidConnectionParams> {
    let mut field_errors = Vec::new();

    if config.id().trim().is_empty() {
        field_errors.push(FieldError {
            field: "id",
            message: "must not be empty".to_string(),
        });
    }

    match config {
        ConnectionConfiguration::SonarQube { server_url, .. } => {
            if server_url.trim().is_empty() {
                field_errors.push(FieldError {
                    field: "serverUrl",
                    message: "must not be empty".to_string(),
                });
            } else {
                match Url::parse(server_url) {
                    Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                    Ok(url) => field_errors.push(FieldError {
                        field: "serverUrl",
                        message: format!("unsupported scheme '{}'", url.scheme()),
                    }),
                    Err(err) => field_errors.push(FieldError {
                        field: "serverUrl",
                        message: err.to_string(),
                    }),
                }
            }
        }
        ConnectionConfiguration::SonarCloud { organization, .. } => {
            if organization.trim().is_empty() {
                field_errors.push(FieldError {
                    field: "organization",
                    message: "must not be empty".to_string(),
                });
            }
        }
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(InvalidConnectionParams { field_errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_wellformed_connections() {
        assert_eq!(
            validate_connection(&ConnectionConfiguration::sonarqube(
                "sq1",
                "https://sonar.example.com"
            )),
            Ok(())
        );
        assert_eq!(
            validate_connection(&ConnectionConfiguration::sonarcloud("sc1", "my-org")),
            Ok(())
        );
    }

    #[test]
    fn rejects_empty_id_and_url_with_per_field_diagnostics() {
        let err = validate_connection(&ConnectionConfiguration::sonarqube("", " "))
            .expect_err("should be rejected");

        let fields: Vec<&str> = err.field_errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["id", "serverUrl"]);
    }

    #[test]
    fn rejects_non_http_server_url() {
        let err = validate_connection(&ConnectionConfiguration::sonarqube(
            "sq1",
            "ftp://sonar.example.com",
        ))
        .expect_err("should be rejected");
        assert_eq!(err.field_errors[0].field, "serverUrl");
        assert!(err.field_errors[0].message.contains("unsupported scheme"));
    }

    #[test]
    fn rejects_blank_organization() {
        let err = validate_connection(&ConnectionConfiguration::sonarcloud("sc1", ""))
            .expect_err("should be rejected");
        assert_eq!(err.field_errors[0].field, "organization");
    }
}
