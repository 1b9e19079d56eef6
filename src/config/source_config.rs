//! Manifest source configuration
//!
//! Loaded from ~/.config/repo-version/config.yaml, an explicit YAML file, or
//! the `source` object of a JSON check request.

use crate::manifest::{DirLoader, MAX_INCLUDE_DEPTH};
use crate::version::{Version, VersionEntry};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Lookups in flight when neither `check_jobs` nor `jobs` is set
pub const DEFAULT_CHECK_JOBS: usize = 2;

fn default_revision() -> String {
    "HEAD".to_string()
}

fn default_manifest_name() -> String {
    "default.xml".to_string()
}

fn default_max_include_depth() -> usize {
    MAX_INCLUDE_DEPTH
}

/// Where the manifest comes from and how to resolve it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Manifest repository URL
    #[serde(default)]
    pub url: String,

    /// Manifest repository branch ("HEAD" means the repository default)
    ///
    /// Informational only: the manifest checkout is produced outside this
    /// tool, so the branch is logged but never used to select files.
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Manifest file name inside the manifest repository
    #[serde(default = "default_manifest_name")]
    pub name: String,

    /// Sync job count; also seeds the check job count
    #[serde(default)]
    pub jobs: usize,

    /// Concurrent revision lookups (0 = derive from `jobs`)
    #[serde(default)]
    pub check_jobs: usize,

    /// Directory holding the manifest checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_dir: Option<PathBuf>,

    /// Include nesting ceiling
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
}

impl SourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            revision: default_revision(),
            name: default_manifest_name(),
            jobs: 0,
            check_jobs: 0,
            manifest_dir: None,
            max_include_depth: default_max_include_depth(),
        }
    }

    /// Concurrent revision lookups: `check_jobs`, else twice `jobs`, else 2
    pub fn effective_check_jobs(&self) -> usize {
        if self.check_jobs > 0 {
            self.check_jobs
        } else if self.jobs > 0 {
            self.jobs * 2
        } else {
            DEFAULT_CHECK_JOBS
        }
    }

    /// Manifest loader for this source, relative to `workdir` unless a
    /// manifest directory is configured
    pub fn loader(&self, workdir: &Path) -> DirLoader {
        match self.manifest_dir {
            Some(ref dir) => DirLoader::new(dir),
            None => DirLoader::for_workdir(workdir),
        }
    }

    /// Load configuration from the default path
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::RepoVersionError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading source configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            url = %config.url,
            name = %config.name,
            check_jobs = config.effective_check_jobs(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration as YAML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/repo-version/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("repo-version");
        path.push("config.yaml");
        path
    }
}

/// JSON request carrying a source and the versions seen so far
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,

    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

impl CheckRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// History versions, oldest first
    pub fn history(&self) -> Vec<Version> {
        self.versions.iter().map(|v| v.version.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_json() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"url": "https://github.com/org/manifest.git"}"#).unwrap();

        assert_eq!(config.revision, "HEAD");
        assert_eq!(config.name, "default.xml");
        assert_eq!(config.jobs, 0);
        assert_eq!(config.max_include_depth, MAX_INCLUDE_DEPTH);
        assert_eq!(config.effective_check_jobs(), DEFAULT_CHECK_JOBS);
    }

    #[test]
    fn test_effective_check_jobs() {
        let mut config = SourceConfig::new("https://h/m");
        config.jobs = 4;
        assert_eq!(config.effective_check_jobs(), 8);

        config.check_jobs = 3;
        assert_eq!(config.effective_check_jobs(), 3);
    }

    #[test]
    fn test_loader_root() {
        let mut config = SourceConfig::new("https://h/m");
        assert_eq!(
            config.loader(Path::new("/work")).root(),
            Path::new("/work/.repo/manifests")
        );

        config.manifest_dir = Some(PathBuf::from("/manifests"));
        assert_eq!(config.loader(Path::new("/work")).root(), Path::new("/manifests"));
    }

    #[test]
    fn test_revision_does_not_change_loader() {
        let config = SourceConfig::new("https://h/m");
        let mut pinned = config.clone();
        pinned.revision = "refs/heads/stable".to_string();

        assert_eq!(
            config.loader(Path::new("/work")).root(),
            pinned.loader(Path::new("/work")).root()
        );
    }

    #[test]
    fn test_yaml_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.yaml");

        let mut config = SourceConfig::new("https://android.googlesource.com/platform/manifest");
        config.revision = "android-12.0.0_r32".to_string();
        config.check_jobs = 6;
        config.save(&path).unwrap();

        assert_eq!(SourceConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = SourceConfig::load(temp_dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(crate::RepoVersionError::Config(_))));
    }

    #[test]
    fn test_check_request() {
        let request = CheckRequest::from_json(
            r#"{
                "source": {"url": "https://h/manifest", "check_jobs": 4},
                "versions": [{"version": "<manifest></manifest>"}]
            }"#,
        )
        .unwrap();

        assert_eq!(request.source.unwrap().check_jobs, 4);
        assert_eq!(request.versions.len(), 1);
    }

    #[test]
    fn test_check_request_history() {
        let request = CheckRequest::from_json(r#"{"versions": [{"version": "a"}, {"version": "b"}]}"#)
            .unwrap();
        assert!(request.source.is_none());
        assert_eq!(request.history(), vec![Version::new("a"), Version::new("b")]);
    }
}
