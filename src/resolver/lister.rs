//! Remote reference listing seam

use crate::{RepoVersionError, Result};
use async_trait::async_trait;
use git_remote::{GitRemote, RefMap};

/// Lists the references a remote repository advertises
#[async_trait]
pub trait RefLister: Send + Sync {
    /// References of `url` matching any of `patterns`, as ref name -> commit id
    async fn list_refs(&self, url: &str, patterns: &[String]) -> Result<RefMap>;
}

/// [`RefLister`] backed by the `git` CLI
#[derive(Debug, Clone, Default)]
pub struct GitCliLister {
    git: GitRemote,
}

impl GitCliLister {
    /// Fails if `git` is not installed
    pub fn new() -> Result<Self> {
        Ok(Self {
            git: GitRemote::new()?,
        })
    }
}

#[async_trait]
impl RefLister for GitCliLister {
    async fn list_refs(&self, url: &str, patterns: &[String]) -> Result<RefMap> {
        let git = self.git;
        let url = url.to_string();
        let patterns = patterns.to_vec();

        let listing = tokio::task::spawn_blocking(move || {
            let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();
            git.ls_remote(&url, &patterns)
        })
        .await
        .map_err(|e| RepoVersionError::Other(format!("ls-remote task failed: {}", e)))?;

        listing.map_err(RepoVersionError::from)
    }
}
