//! Token-overlap text search used to match workspace names against remote
//! project names.
//!
//! The index favors concise documents that fully match the query: a document
//! scores by the fraction of *its own* tokens that appear in the query, so
//! padding a name with unrelated words lowers its score. The index is small
//! (one document per remote project) and rebuilt wholesale per connection, so
//! there is no incremental update path.

#![forbid(unsafe_code)]

/// Lowercases and splits on non-alphanumeric runs, discarding empty tokens
/// and duplicates. `"foo-bar"` tokenizes to `["bar", "foo"]`.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}

struct Document<T> {
    item: T,
    tokens: Vec<String>,
}

/// A fuzzy matcher over `(item, text)` pairs.
pub struct TextSearchIndex<T> {
    documents: Vec<Document<T>>,
}

impl<T> Default for TextSearchIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TextSearchIndex<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    /// Adds a document. Items indexed with no usable tokens never match.
    pub fn index(&mut self, item: T, text: &str) {
        let tokens = tokenize(text);
        self.documents.push(Document { item, tokens });
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Scores every document against `query` and returns the overlapping ones,
    /// best score first. Ties keep insertion order.
    ///
    /// `score(D) = |tokens(D) ∩ tokens(query)| / |tokens(D)|`
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<(&T, f64)> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<(&T, f64)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                if doc.tokens.is_empty() {
                    return None;
                }
                let overlap = doc
                    .tokens
                    .iter()
                    .filter(|token| query_tokens.binary_search(token).is_ok())
                    .count();
                if overlap == 0 {
                    return None;
                }
                let score = overlap as f64 / doc.tokens.len() as f64;
                Some((&doc.item, score))
            })
            .collect();

        results.sort_by(|(_, left), (_, right)| right.total_cmp(left));
        results
    }

    /// Returns only the top-scoring matches (ties all kept) and the best
    /// score, or `None` when nothing overlaps.
    #[must_use]
    pub fn best_matches(&self, query: &str) -> Option<(Vec<&T>, f64)> {
        let results = self.search(query);
        let (_, best_score) = *results.first()?;
        let items = results
            .into_iter()
            .take_while(|(_, score)| *score == best_score)
            .map(|(item, _)| item)
            .collect();
        Some((items, best_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenize_lowercases_and_splits_on_non_alphanumeric() {
        assert_eq!(tokenize("Foo-Bar"), vec!["bar", "foo"]);
        assert_eq!(tokenize("my_project 2"), vec!["2", "my", "project"]);
        assert_eq!(tokenize("--"), Vec::<String>::new());
    }

    #[test]
    fn score_is_fraction_of_document_tokens_matched() {
        let mut index = TextSearchIndex::new();
        index.index("exact", "foo bar");
        index.index("padded", "foo bar garbage more");

        let results = index.search("foo-bar");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], (&"exact", 1.0));
        assert_eq!(results[1], (&"padded", 0.5));
    }

    #[test]
    fn retains_only_best_score_with_ties() {
        let mut index = TextSearchIndex::new();
        index.index("a", "foo bar garbage1");
        index.index("b", "foo bar garbage2");
        index.index("c", "foo bar more garbage");

        let (items, best_score) = index.best_matches("foo-bar").expect("matches");
        assert_eq!(items, vec![&"a", &"b"]);
        assert!((best_score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn no_overlap_means_no_matches() {
        let mut index = TextSearchIndex::new();
        index.index("a", "completely unrelated");

        assert!(index.search("foo").is_empty());
        assert_eq!(index.best_matches("foo"), None);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let mut index = TextSearchIndex::new();
        index.index("a", "foo");
        assert!(index.search("--").is_empty());
    }

    #[test]
    fn duplicate_tokens_count_once() {
        let mut index = TextSearchIndex::new();
        index.index("a", "foo foo bar");

        let results = index.search("foo");
        assert_eq!(results, vec![(&"a", 0.5)]);
    }
}
