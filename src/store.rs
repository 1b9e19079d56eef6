//! Version computation
//!
//! Flattens the manifest, resolves every project's live revision, writes the
//! commit ids back into the tree, and canonicalizes the result. Nothing is
//! kept between calls.

use crate::manifest::{Flattener, ManifestLoader, MAX_INCLUDE_DEPTH};
use crate::resolver::{RevisionKey, RevisionQuery, RevisionResolver};
use crate::version::{canonicalize, new_versions, Version};
use crate::{RepoVersionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A project and the commit id it resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRevision {
    /// Project name
    pub name: String,

    /// Resolved commit id
    pub value: String,
}

/// Output of a version computation
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    /// Canonical resolved manifest
    pub version: Version,

    /// Per-project revisions, in manifest order
    pub projects: Vec<ProjectRevision>,
}

/// Computes manifest versions
pub struct VersionStore {
    loader: Arc<dyn ManifestLoader>,
    resolver: RevisionResolver,
    manifest_url: String,
    max_include_depth: usize,
}

impl VersionStore {
    /// `manifest_url` is the manifest repository URL, used to resolve
    /// relative remote fetch URLs
    pub fn new(
        loader: Arc<dyn ManifestLoader>,
        resolver: RevisionResolver,
        manifest_url: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            resolver,
            manifest_url: manifest_url.into(),
            max_include_depth: MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_include_depth(mut self, max_include_depth: usize) -> Self {
        self.max_include_depth = max_include_depth;
        self
    }

    /// Compute the version of the manifest called `manifest_name`
    pub async fn compute_version(&self, manifest_name: &str) -> Result<ResolvedManifest> {
        info!(manifest = manifest_name, "Updating project revisions in manifest");

        let mut flat = Flattener::new(self.loader.as_ref(), self.manifest_url.as_str())
            .with_max_depth(self.max_include_depth)
            .flatten(manifest_name)?;

        let queries: Vec<RevisionQuery> = flat
            .projects
            .iter()
            .map(RevisionQuery::for_project)
            .collect();
        let keys: Vec<RevisionKey> = queries.iter().map(RevisionQuery::key).collect();

        let table: HashMap<RevisionKey, String> = self
            .resolver
            .resolve(queries)
            .await?
            .into_iter()
            .map(|result| (result.key, result.revision))
            .collect();

        let mut projects = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            let revision = table.get(key).ok_or_else(|| {
                RepoVersionError::Other(format!("no revision resolved for {}", key))
            })?;
            flat.set_project_revision(index, revision);
            projects.push(ProjectRevision {
                name: key.project.clone(),
                value: revision.clone(),
            });
        }

        let version = canonicalize(&flat.to_tree());
        info!(projects = projects.len(), "Manifest version computed");

        Ok(ResolvedManifest { version, projects })
    }

    /// Whether the current manifest version is absent from `history`
    pub async fn is_new(&self, manifest_name: &str, history: &[Version]) -> Result<bool> {
        let resolved = self.compute_version(manifest_name).await?;
        crate::version::is_new(&resolved.version, history)
    }

    /// `history` followed by the current version if it is new
    ///
    /// History is validated before any remote is contacted.
    pub async fn check(&self, manifest_name: &str, history: Vec<Version>) -> Result<Vec<Version>> {
        for known in &history {
            known.standard()?;
        }

        let resolved = self.compute_version(manifest_name).await?;
        new_versions(resolved.version, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MemoryLoader;
    use crate::resolver::{RefLister, RetryPolicy};
    use async_trait::async_trait;
    use git_remote::RefMap;

    const SHA: &str = "abc1230000000000000000000000000000000000";
    const TAG_OBJECT: &str = "fed9870000000000000000000000000000000000";

    struct TagLister;

    #[async_trait]
    impl RefLister for TagLister {
        async fn list_refs(&self, url: &str, patterns: &[String]) -> Result<RefMap> {
            assert_eq!(url, "https://example.org/device/common");
            assert_eq!(patterns, ["refs/tags/v1", "refs/tags/v1^{}"]);
            Ok(RefMap::from([
                ("refs/tags/v1".to_string(), TAG_OBJECT.to_string()),
                ("refs/tags/v1^{}".to_string(), SHA.to_string()),
            ]))
        }
    }

    fn store(xml: &str) -> VersionStore {
        let loader = MemoryLoader::new().with_document("default.xml", xml);
        let resolver =
            RevisionResolver::new(Arc::new(TagLister)).with_retry_policy(RetryPolicy::immediate(3));
        VersionStore::new(Arc::new(loader), resolver, "https://example.org/manifest")
    }

    const MANIFEST: &str = r#"<manifest>
        <project name="device/common" upstream="refs/tags/v1" dest-branch="refs/tags/v1" />
        <default revision="refs/tags/v1" remote="aosp" />
        <remote name="aosp" fetch="https://example.org/" />
    </manifest>"#;

    #[tokio::test]
    async fn test_compute_version() {
        let resolved = store(MANIFEST).compute_version("default.xml").await.unwrap();

        assert_eq!(
            resolved.version.as_str(),
            format!(
                "<manifest><remote fetch=\"https://example.org/\" name=\"aosp\"></remote><default remote=\"aosp\" revision=\"refs/tags/v1\"></default><project name=\"device/common\" revision=\"{}\"></project></manifest>",
                SHA
            )
        );
        assert_eq!(
            resolved.projects,
            vec![ProjectRevision {
                name: "device/common".to_string(),
                value: SHA.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_check_known_version() {
        let store = store(MANIFEST);
        let current = store.compute_version("default.xml").await.unwrap().version;

        let versions = store.check("default.xml", vec![current.clone()]).await.unwrap();
        assert_eq!(versions, vec![current]);
        assert!(!store.is_new("default.xml", &versions).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_rejects_invalid_history() {
        let err = store(MANIFEST)
            .check("default.xml", vec![Version::new("invalid-version")])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoVersionError::InvalidVersion(_)));
    }
}
