//! Error types for repo-version
//!
//! One enum covers every failure mode of a version computation. Uses
//! thiserror for ergonomic error handling.

use crate::resolver::retry::{RetryDecision, RetryableError};
use thiserror::Error;

/// Result type alias for repo-version operations
pub type Result<T> = std::result::Result<T, RepoVersionError>;

/// Comprehensive error type for repo-version operations
#[derive(Error, Debug)]
pub enum RepoVersionError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest document could not be loaded
    #[error("Manifest not found: {0}")]
    ManifestNotFound(String),

    /// Malformed manifest XML
    #[error("Parse error in {name}: {message}")]
    Parse { name: String, message: String },

    /// A stored version is not valid XML
    #[error("Version is not valid xml: {0}")]
    InvalidVersion(String),

    /// Include nesting went past the ceiling
    #[error("Include depth limit ({limit}) exceeded while loading {name}")]
    IncludeDepthExceeded { name: String, limit: usize },

    /// A manifest includes itself, directly or transitively
    #[error("Include cycle detected: {0}")]
    IncludeCycle(String),

    /// Project references a remote that no <remote> declares
    #[error("Project {project} references undeclared remote {remote}")]
    UnknownRemote { project: String, remote: String },

    /// Project has no remote of its own and no default remote applies
    #[error("Project {0} has no remote and no default remote is set")]
    MissingRemote(String),

    /// Project has no revision of its own, from its remote, or from the default
    #[error("Project {0} has no revision and no default revision is set")]
    MissingRevision(String),

    /// The ref is not advertised by the remote
    #[error("Reference {reference} not found for project {project} at {url}")]
    RefNotFound {
        project: String,
        url: String,
        reference: String,
    },

    /// Transient throttling by the remote host
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Permanent failure while resolving a project's revision
    #[error("Cannot fetch project {project} from {url}: {message}")]
    Resolution {
        project: String,
        url: String,
        message: String,
    },

    /// Git transport errors
    #[error("Git error: {0}")]
    Git(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<git_remote::Error> for RepoVersionError {
    fn from(err: git_remote::Error) -> Self {
        match err {
            git_remote::Error::RateLimited { url, message } => {
                RepoVersionError::RateLimited(format!("{}: {}", url, message))
            }
            git_remote::Error::Io(e) => RepoVersionError::Io(e),
            other => RepoVersionError::Git(other.to_string()),
        }
    }
}

impl RetryableError for RepoVersionError {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            RepoVersionError::RateLimited(_) => RetryDecision::Retry,
            _ => RetryDecision::NoRetry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limits_retry() {
        assert_eq!(
            RepoVersionError::RateLimited("429".to_string()).retry_decision(),
            RetryDecision::Retry
        );
        assert_eq!(
            RepoVersionError::Git("repository not found".to_string()).retry_decision(),
            RetryDecision::NoRetry
        );
        assert_eq!(
            RepoVersionError::RefNotFound {
                project: "p".to_string(),
                url: "https://host/p".to_string(),
                reference: "refs/heads/main".to_string(),
            }
            .retry_decision(),
            RetryDecision::NoRetry
        );
    }

    #[test]
    fn test_from_git_remote_error() {
        let err: RepoVersionError = git_remote::Error::RateLimited {
            url: "https://host/p".to_string(),
            message: "HTTP 429".to_string(),
        }
        .into();
        assert!(matches!(err, RepoVersionError::RateLimited(_)));

        let err: RepoVersionError = git_remote::Error::CommandFailed("denied".to_string()).into();
        assert!(matches!(err, RepoVersionError::Git(_)));
    }
}
