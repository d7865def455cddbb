//! Shared value types for the tether backend.
//!
//! Everything here is plain data: scopes and bindings are created and mutated
//! by the host's configuration collaborator, connections by its connection
//! collaborator. The backend only reads and reacts.

mod binding;
mod connection;
mod suggestion;

pub use binding::{BindingConfiguration, ConfigurationScope};
pub use connection::{urls_match, ConnectionConfiguration, SonarCloudRegion};
pub use suggestion::{BindingSuggestion, SuggestionOrigin};

/// Picks the singular or plural wording for a count, for log messages.
#[must_use]
pub fn single_plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_plural_picks_form() {
        assert_eq!(single_plural(0, "clue", "clues"), "clues");
        assert_eq!(single_plural(1, "clue", "clues"), "clue");
        assert_eq!(single_plural(2, "clue", "clues"), "clues");
    }
}
