use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use walkdir::WalkDir;

/// Where a client file's text lives.
#[derive(Clone, Debug)]
enum ContentSource {
    Inline(String),
    Path(PathBuf),
}

/// A file surfaced by the host's file-system collaborator.
///
/// Content is read lazily: clue extraction only touches the handful of files
/// whose names it recognizes.
#[derive(Clone, Debug)]
pub struct ClientFile {
    uri: String,
    file_name: String,
    source: ContentSource,
    sonarlint_configuration: bool,
}

impl ClientFile {
    pub fn new(uri: impl Into<String>, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            file_name: file_name.into(),
            source: ContentSource::Inline(content.into()),
            sonarlint_configuration: false,
        }
    }

    pub fn on_disk(uri: impl Into<String>, file_name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            uri: uri.into(),
            file_name: file_name.into(),
            source: ContentSource::Path(path),
            sonarlint_configuration: false,
        }
    }

    #[must_use]
    pub fn sonarlint_configuration(mut self) -> Self {
        self.sonarlint_configuration = true;
        self
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn is_sonarlint_configuration(&self) -> bool {
        self.sonarlint_configuration
    }

    pub fn content(&self) -> io::Result<String> {
        match &self.source {
            ContentSource::Inline(content) => Ok(content.clone()),
            ContentSource::Path(path) => std::fs::read_to_string(path),
        }
    }
}

/// File lookups the backend consumes from its host.
pub trait ClientFileSystem: Send + Sync {
    /// Files anywhere under the scope whose name is one of `names`.
    fn find_files_by_names_in_scope(&self, scope_id: &str, names: &[&str]) -> Vec<ClientFile>;

    /// `connectedMode.json` files located exactly under a `.sonarlint/`
    /// directory within the scope.
    fn find_sonarlint_configuration_files_by_scope(&self, scope_id: &str) -> Vec<ClientFile>;
}

/// `walkdir`-backed [`ClientFileSystem`] for hosts without their own VFS.
/// Each scope maps to a root directory; unreadable entries are skipped with a
/// warning.
#[derive(Default)]
pub struct LocalFileSystem {
    roots: RwLock<HashMap<String, PathBuf>>,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_scope_root(&self, scope_id: impl Into<String>, root: PathBuf) {
        self.roots.write().insert(scope_id.into(), root);
    }

    fn walk(&self, scope_id: &str, mut keep: impl FnMut(&Path) -> bool) -> Vec<ClientFile> {
        let Some(root) = self.roots.read().get(scope_id).cloned() else {
            return Vec::new();
        };

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(
                        target = "tether.fs",
                        "Skipping unreadable entry under {}: {err}",
                        root.display()
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() || !keep(entry.path()) {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            let uri = format!("file://{}", entry.path().display());
            files.push(ClientFile::on_disk(uri, file_name, entry.path().to_path_buf()));
        }
        files
    }
}

impl ClientFileSystem for LocalFileSystem {
    fn find_files_by_names_in_scope(&self, scope_id: &str, names: &[&str]) -> Vec<ClientFile> {
        self.walk(scope_id, |path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| names.contains(&name))
        })
    }

    fn find_sonarlint_configuration_files_by_scope(&self, scope_id: &str) -> Vec<ClientFile> {
        self.walk(scope_id, |path| {
            let in_sonarlint_dir = path
                .parent()
                .and_then(|dir| dir.file_name())
                .and_then(|name| name.to_str())
                .is_some_and(|name| name == ".sonarlint");
            in_sonarlint_dir
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name == crate::clue::SHARED_CONFIG_FILENAME)
        })
        .into_iter()
        .map(ClientFile::sonarlint_configuration)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_named_files_and_shared_configuration() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("sonar-project.properties"), "sonar.projectKey=k")?;
        std::fs::create_dir(dir.path().join(".sonarlint"))?;
        std::fs::write(dir.path().join(".sonarlint/connectedMode.json"), "{}")?;
        std::fs::write(dir.path().join("unrelated.txt"), "ignored")?;

        let fs = LocalFileSystem::new();
        fs.register_scope_root("scope1", dir.path().to_path_buf());

        let found = fs.find_files_by_names_in_scope("scope1", &["sonar-project.properties"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_name(), "sonar-project.properties");
        assert_eq!(found[0].content()?, "sonar.projectKey=k");
        assert!(!found[0].is_sonarlint_configuration());

        let shared = fs.find_sonarlint_configuration_files_by_scope("scope1");
        assert_eq!(shared.len(), 1);
        assert!(shared[0].is_sonarlint_configuration());
        Ok(())
    }

    #[test]
    fn unknown_scope_yields_nothing() {
        let fs = LocalFileSystem::new();
        assert!(fs
            .find_files_by_names_in_scope("missing", &["sonar-project.properties"])
            .is_empty());
    }
}
