//! Configuration validation
//!
//! Validates a source configuration before any network access:
//! - The manifest URL is present
//! - GitLab http(s) URLs name the `.git` repository
//! - Job counts and include depth are usable

use super::source_config::SourceConfig;
use crate::RepoVersionError;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a source configuration
pub fn validate_source(config: &SourceConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.url.trim().is_empty() {
        errors.push(ValidationError::new("url", "manifest url is mandatory"));
    } else if let Some((scheme, host, path)) = split_url(&config.url) {
        if host == "gitlab.com" && (scheme == "http" || scheme == "https") && !path.ends_with(".git")
        {
            errors.push(ValidationError::new(
                "url",
                "gitlab http(s) urls must end with .git",
            ));
        }
    }

    if config.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "manifest name must not be empty"));
    }

    if config.max_include_depth == 0 {
        errors.push(ValidationError::new(
            "max_include_depth",
            "Include depth must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert failures into a single configuration error
pub fn validate_source_result(config: &SourceConfig) -> crate::Result<()> {
    validate_source(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        RepoVersionError::Config(messages.join("; "))
    })
}

/// Split `scheme://host/path` into its parts
fn split_url(url: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    let (authority, path) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    Some((scheme, host, path))
}
