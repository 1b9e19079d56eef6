//! Manifest parsing and flattening for git-repo manifests
//!
//! Parses XML manifests as used by Google's git-repo tool, splices
//! `<include>` directives, applies `<remove-project>`, and resolves every
//! project's effective remote and revision.
//!
//! # Example Manifest
//!
//! ```xml
//! <manifest>
//!   <remote name="aosp" fetch="https://android.googlesource.com/" />
//!   <default revision="refs/tags/android-12.0.0_r32" remote="aosp" />
//!
//!   <project path="device/generic/common" name="device/generic/common" />
//!   <include name="vendor.xml" />
//!   <remove-project name="platform/unused" />
//! </manifest>
//! ```

mod element;
mod flatten;
mod loader;
mod parser;

pub use element::Element;
pub use flatten::{
    absolute_fetch_url, apply_removals, flatten, is_absolute_url, FlatManifest, Flattener,
    ManifestDefault, Project, Remote, DEFAULT, INCLUDE, MANIFEST, MAX_INCLUDE_DEPTH, PROJECT,
    REMOTE, REMOVE_PROJECT,
};
pub use loader::{DirLoader, ManifestLoader, MemoryLoader};
pub use parser::{parse_document, XmlError};
