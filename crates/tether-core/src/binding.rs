/// A local workspace/folder the host can analyze.
///
/// Scopes can nest (`parent_id`); only `bindable` scopes participate in
/// binding suggestions. The `name` is a display name and doubles as the
/// fallback match signal when no clue file points at a remote project.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConfigurationScope {
    pub id: String,
    pub parent_id: Option<String>,
    pub bindable: bool,
    pub name: String,
}

/// The binding state of one configuration scope.
///
/// "Not bound" is both ids `None`. There is never more than one live value per
/// scope: updates replace in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingConfiguration {
    pub connection_id: Option<String>,
    pub project_key: Option<String>,
    pub binding_suggestion_disabled: bool,
}

impl BindingConfiguration {
    pub fn bound(connection_id: impl Into<String>, project_key: impl Into<String>) -> Self {
        Self {
            connection_id: Some(connection_id.into()),
            project_key: Some(project_key.into()),
            binding_suggestion_disabled: false,
        }
    }

    /// Returns the `(connection_id, project_key)` pair when both are set.
    #[must_use]
    pub fn as_bound(&self) -> Option<(&str, &str)> {
        match (self.connection_id.as_deref(), self.project_key.as_deref()) {
            (Some(connection_id), Some(project_key)) => Some((connection_id, project_key)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_binding_is_unbound() {
        let binding = BindingConfiguration::default();
        assert_eq!(binding.as_bound(), None);
        assert!(!binding.binding_suggestion_disabled);
    }

    #[test]
    fn bound_exposes_pair() {
        let binding = BindingConfiguration::bound("conn1", "projectKey");
        assert_eq!(binding.as_bound(), Some(("conn1", "projectKey")));
    }

    #[test]
    fn partial_binding_is_not_bound() {
        let binding = BindingConfiguration {
            connection_id: Some("conn1".to_string()),
            project_key: None,
            binding_suggestion_disabled: false,
        };
        assert_eq!(binding.as_bound(), None);
    }
}
