//! Manifest document loading
//!
//! The core never reads the process working directory; every loader is
//! rooted at an explicit location.

use crate::{RepoVersionError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Read manifest documents by name
pub trait ManifestLoader: Send + Sync {
    /// Load the raw XML text of the manifest called `name`
    fn load(&self, name: &str) -> Result<String>;
}

/// Loads manifests from a directory on disk (usually `.repo/manifests`)
#[derive(Debug, Clone)]
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loader for the manifest checkout inside a repo work directory
    pub fn for_workdir(workdir: impl AsRef<Path>) -> Self {
        Self::new(workdir.as_ref().join(".repo").join("manifests"))
    }

    /// Root directory manifests are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ManifestLoader for DirLoader {
    fn load(&self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        tracing::debug!(path = %path.display(), "Loading manifest");

        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RepoVersionError::ManifestNotFound(path.display().to_string())
            } else {
                RepoVersionError::Io(e)
            }
        })
    }
}

/// In-memory manifest documents, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document
    pub fn insert(&mut self, name: impl Into<String>, xml: impl Into<String>) {
        self.documents.insert(name.into(), xml.into());
    }

    /// Builder-style [`MemoryLoader::insert`]
    pub fn with_document(mut self, name: impl Into<String>, xml: impl Into<String>) -> Self {
        self.insert(name, xml);
        self
    }
}

impl ManifestLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<String> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| RepoVersionError::ManifestNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_loader_reads_relative_names() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("sub")).unwrap();
        std::fs::write(temp_dir.path().join("sub/extra.xml"), "<manifest/>").unwrap();

        let loader = DirLoader::new(temp_dir.path());
        assert_eq!(loader.load("sub/extra.xml").unwrap(), "<manifest/>");
    }

    #[test]
    fn test_dir_loader_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let loader = DirLoader::new(temp_dir.path());

        let err = loader.load("default.xml").unwrap_err();
        assert!(matches!(err, RepoVersionError::ManifestNotFound(_)));
    }

    #[test]
    fn test_for_workdir() {
        let loader = DirLoader::for_workdir("/tmp/work");
        assert_eq!(loader.root(), Path::new("/tmp/work/.repo/manifests"));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_document("default.xml", "<manifest/>");
        assert!(loader.load("default.xml").is_ok());
        assert!(matches!(
            loader.load("other.xml"),
            Err(RepoVersionError::ManifestNotFound(_))
        ));
    }
}
