//! repo-version - Deterministic versions for git-repo manifests
//!
//! Computes a comparable version for a multi-repository manifest: the
//! version changes exactly when a project's resolved revision or the
//! manifest's structure changes, which makes it a novelty signal for CI
//! polling.
//!
//! # Architecture
//!
//! - **manifest**: XML parsing, include splicing, project removal, defaults
//! - **resolver**: concurrent `ls-remote` revision lookup with retry
//! - **version**: canonical rendering and novelty detection
//! - **store**: orchestration of a full version computation
//! - **config**: source configuration and validation

pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod resolver;
pub mod store;
pub mod version;

// Re-exports
pub use error::{RepoVersionError, Result};
pub use store::{ProjectRevision, ResolvedManifest, VersionStore};
pub use version::Version;
