//! Revision queries and reference selection

use crate::manifest::Project;
use std::collections::BTreeMap;
use std::fmt;

/// Suffix `git ls-remote` uses for the peeled commit of an annotated tag
const PEELED_SUFFIX: &str = "^{}";

/// Identity of a query, used to re-associate results with projects
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevisionKey {
    pub remote: String,
    pub project: String,
    pub reference: String,
}

impl fmt::Display for RevisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.remote, self.project, self.reference)
    }
}

/// One project's revision lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionQuery {
    /// Remote name
    pub remote: String,

    /// Remote fetch URL base
    pub remote_url: String,

    /// Project name, appended to the remote URL
    pub project: String,

    /// Branch, tag, or commit id to resolve
    pub reference: String,
}

impl RevisionQuery {
    pub fn new(
        remote: impl Into<String>,
        remote_url: impl Into<String>,
        project: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            remote: remote.into(),
            remote_url: remote_url.into(),
            project: project.into(),
            reference: reference.into(),
        }
    }

    /// Query for a flattened manifest project
    pub fn for_project(project: &Project) -> Self {
        Self::new(
            &project.remote,
            &project.remote_url,
            &project.name,
            &project.revision,
        )
    }

    pub fn key(&self) -> RevisionKey {
        RevisionKey {
            remote: self.remote.clone(),
            project: self.project.clone(),
            reference: self.reference.clone(),
        }
    }

    /// Repository URL passed to the reference lister
    pub fn repository_url(&self) -> String {
        format!("{}/{}", self.remote_url.trim_end_matches('/'), self.project)
    }

    /// Patterns passed to the reference lister
    ///
    /// `git ls-remote` only reports the peeled entry of an annotated tag when
    /// a pattern ends in `^{}`, so tags and short names ask for both forms.
    pub fn patterns(&self) -> Vec<String> {
        let bare = self.reference.trim_end_matches(PEELED_SUFFIX);
        let exact = self.reference == "HEAD"
            || (self.reference.starts_with("refs/") && !self.reference.starts_with("refs/tags/"));
        if exact {
            vec![self.reference.clone()]
        } else {
            vec![bare.to_string(), format!("{}{}", bare, PEELED_SUFFIX)]
        }
    }

    /// Pick this query's commit id out of a reference listing
    pub fn select(&self, refs: &BTreeMap<String, String>) -> Option<String> {
        candidate_refs(&self.reference)
            .iter()
            .find_map(|name| refs.get(name))
            .cloned()
    }
}

/// Ref names that may carry `reference`, most specific first
fn candidate_refs(reference: &str) -> Vec<String> {
    if reference.starts_with("refs/tags/") {
        let bare = reference.trim_end_matches(PEELED_SUFFIX);
        vec![format!("{}{}", bare, PEELED_SUFFIX), bare.to_string()]
    } else if reference.starts_with("refs/") || reference == "HEAD" {
        vec![reference.to_string()]
    } else {
        vec![
            format!("refs/heads/{}", reference),
            format!("refs/tags/{}{}", reference, PEELED_SUFFIX),
            format!("refs/tags/{}", reference),
        ]
    }
}

/// A resolved query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionResult {
    pub key: RevisionKey,

    /// Commit id the ref pointed at
    pub revision: String,
}

/// Whether `reference` is already a full lowercase SHA-1
pub fn is_commit_id(reference: &str) -> bool {
    reference.len() == 40
        && reference
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
