//! Configuration system
//!
//! Source settings for a manifest: repository URL, manifest branch and
//! name, lookup concurrency, and include depth. Loaded from
//! ~/.config/repo-version/config.yaml or from a JSON check request.

mod source_config;
pub mod validation;

pub use source_config::{CheckRequest, SourceConfig, DEFAULT_CHECK_JOBS};
pub use validation::{validate_source, validate_source_result, ValidationError};
