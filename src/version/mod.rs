//! Manifest versions and novelty detection
//!
//! A [`Version`] is opaque text. Comparisons always go through the canonical
//! form so versions written by older canonicalization rules still match.

mod canonical;

pub use canonical::{canonicalize, canonicalize_str, EXCLUDED_ATTRIBUTES, TAG_ORDER};

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque manifest version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical form of this version, the key used for comparisons
    pub fn standard(&self) -> Result<Version> {
        canonicalize_str(&self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Version {
    fn from(version: String) -> Self {
        Self(version)
    }
}

/// `{"version": "..."}` entry of a version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: Version,
}

impl From<Version> for VersionEntry {
    fn from(version: Version) -> Self {
        Self { version }
    }
}

/// Whether `candidate` differs from every entry of `history` once both are
/// canonicalized
///
/// An unparseable history entry is an error, not a mismatch.
pub fn is_new(candidate: &Version, history: &[Version]) -> Result<bool> {
    let candidate = candidate.standard()?;
    for known in history {
        if known.standard()? == candidate {
            return Ok(false);
        }
    }
    Ok(true)
}

/// History with `candidate` appended when it is new (oldest first)
pub fn new_versions(candidate: Version, mut history: Vec<Version>) -> Result<Vec<Version>> {
    let known: HashSet<Version> = history
        .iter()
        .map(Version::standard)
        .collect::<Result<_>>()?;

    if known.contains(&candidate.standard()?) {
        tracing::info!("Version already known");
    } else {
        tracing::info!("New version found");
        history.push(candidate);
    }

    Ok(history)
}
