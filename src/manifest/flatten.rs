//! Include splicing, project removal, and default resolution
//!
//! Flattening is two-phase for every manifest: its includes are replaced by
//! their own flattened children, then its removals filter the result. A
//! parent can remove an included project, but an include cannot reach back
//! into its parent. The source trees are never mutated.

use super::element::Element;
use super::loader::ManifestLoader;
use super::parser::parse_document;
use crate::{RepoVersionError, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Maximum `<include>` nesting before flattening gives up
pub const MAX_INCLUDE_DEPTH: usize = 16;

pub const MANIFEST: &str = "manifest";
pub const REMOTE: &str = "remote";
pub const DEFAULT: &str = "default";
pub const PROJECT: &str = "project";
pub const REMOVE_PROJECT: &str = "remove-project";
pub const INCLUDE: &str = "include";

/// Remote repository definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Remote name (e.g., "aosp")
    pub name: String,

    /// Absolute fetch URL base, without trailing slash
    pub fetch: String,

    /// Revision pinned on the remote itself
    pub revision: Option<String>,
}

/// Default settings for projects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDefault {
    /// Default remote name
    pub remote: Option<String>,

    /// Default revision/branch
    pub revision: Option<String>,
}

/// A project with its effective remote and ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Repository name, relative to the remote fetch URL
    pub name: String,

    /// Checkout path, when it differs from the name
    pub path: Option<String>,

    /// Effective remote name
    pub remote: String,

    /// Effective remote fetch URL
    pub remote_url: String,

    /// Effective ref (branch, tag, or commit id)
    pub revision: String,

    /// Position of this project in [`FlatManifest::elements`]
    pub element_index: usize,
}

impl Project {
    /// Full repository URL
    pub fn url(&self) -> String {
        format!("{}/{}", self.remote_url, self.name)
    }
}

/// A manifest with includes spliced and removals applied
#[derive(Debug, Clone, Default)]
pub struct FlatManifest {
    /// Surviving top-level elements in document order
    pub elements: Vec<Element>,

    /// Remotes keyed by name
    pub remotes: BTreeMap<String, Remote>,

    /// Effective defaults (last `<default>` wins)
    pub default: ManifestDefault,

    /// Surviving projects in document order
    pub projects: Vec<Project>,
}

impl FlatManifest {
    /// Rebuild a `<manifest>` tree from the flattened elements
    pub fn to_tree(&self) -> Element {
        Element {
            tag: MANIFEST.to_string(),
            children: self.elements.clone(),
            ..Default::default()
        }
    }

    /// Write a resolved commit id into a project's `revision` attribute
    pub fn set_project_revision(&mut self, project_index: usize, revision: &str) {
        let element_index = self.projects[project_index].element_index;
        self.elements[element_index].set_attr("revision", revision);
    }
}

/// Flattens a manifest and its includes
pub struct Flattener<'a> {
    loader: &'a dyn ManifestLoader,
    origin_url: String,
    max_depth: usize,
}

impl<'a> Flattener<'a> {
    /// `origin_url` is the URL of the manifest repository, used to resolve
    /// relative remote fetch URLs
    pub fn new(loader: &'a dyn ManifestLoader, origin_url: impl Into<String>) -> Self {
        Self {
            loader,
            origin_url: origin_url.into(),
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Flatten the manifest called `name`
    pub fn flatten(&self, name: &str) -> Result<FlatManifest> {
        let mut chain = Vec::new();
        let elements = self.splice(name, 0, &mut chain)?;

        let remotes = collect_remotes(&elements, &self.origin_url, name)?;
        let default = collect_default(&elements);
        let projects = resolve_projects(&elements, &remotes, &default, name)?;

        debug!(
            manifest = name,
            remotes = remotes.len(),
            projects = projects.len(),
            "Manifest flattened"
        );

        Ok(FlatManifest {
            elements,
            remotes,
            default,
            projects,
        })
    }

    /// Load `name` and replace its includes with their flattened children.
    ///
    /// Removals are applied before returning, so each manifest's
    /// `<remove-project>` directives only see its own projects and those of
    /// its includes.
    fn splice(&self, name: &str, depth: usize, chain: &mut Vec<String>) -> Result<Vec<Element>> {
        if depth > self.max_depth {
            return Err(RepoVersionError::IncludeDepthExceeded {
                name: name.to_string(),
                limit: self.max_depth,
            });
        }
        if chain.iter().any(|seen| seen == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(RepoVersionError::IncludeCycle(cycle.join(" -> ")));
        }

        let xml = self.loader.load(name)?;
        let root = parse_document(&xml).map_err(|e| RepoVersionError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        if !root.is(MANIFEST) {
            return Err(RepoVersionError::Parse {
                name: name.to_string(),
                message: format!("root element is <{}>, expected <manifest>", root.tag),
            });
        }

        chain.push(name.to_string());
        let mut out = Vec::with_capacity(root.children.len());
        for child in root.children {
            if child.is(INCLUDE) {
                let included = child.name().ok_or_else(|| RepoVersionError::Parse {
                    name: name.to_string(),
                    message: "<include> without name attribute".to_string(),
                })?;
                debug!(parent = name, include = included, "Splicing include");
                out.extend(self.splice(included, depth + 1, chain)?);
            } else {
                out.push(child);
            }
        }
        chain.pop();

        Ok(apply_removals(out))
    }
}

/// Convenience wrapper around [`Flattener`]
pub fn flatten(
    loader: &dyn ManifestLoader,
    name: &str,
    origin_url: &str,
) -> Result<FlatManifest> {
    Flattener::new(loader, origin_url).flatten(name)
}

/// Apply every `<remove-project>` in document order.
///
/// Each directive removes the first project with its name that no earlier
/// directive removed. Directives are always dropped from the result.
pub fn apply_removals(elements: Vec<Element>) -> Vec<Element> {
    let mut removed = vec![false; elements.len()];

    for directive in elements.iter().filter(|e| e.is(REMOVE_PROJECT)) {
        let Some(target) = directive.name() else {
            continue;
        };

        let found = (0..elements.len()).find(|&i| {
            !removed[i] && elements[i].is(PROJECT) && elements[i].name() == Some(target)
        });
        match found {
            Some(i) => removed[i] = true,
            None => debug!(project = target, "remove-project matched nothing"),
        }
    }

    elements
        .into_iter()
        .zip(removed)
        .filter(|(element, gone)| !gone && !element.is(REMOVE_PROJECT))
        .map(|(element, _)| element)
        .collect()
}

/// Whether `url` already carries a scheme (`https://`, `ssh://`) or is an
/// scp-style `git@host:path`
pub fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("git@") {
        return true;
    }
    match url.find("://") {
        Some(0) | None => false,
        Some(pos) => url[..pos]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
    }
}

/// Resolve a remote's fetch attribute against the manifest repository URL
///
/// Relative fetch paths are appended to `origin_url` with its last path
/// segment removed, so `..` against `https://host/platform/manifest`
/// becomes `https://host/platform/..`.
pub fn absolute_fetch_url(fetch: &str, origin_url: &str) -> String {
    let fetch = fetch.trim_end_matches('/');
    if is_absolute_url(fetch) {
        return fetch.to_string();
    }

    let base = match origin_url.rfind('/') {
        Some(pos) => &origin_url[..=pos],
        None => "",
    };
    format!("{}{}", base, fetch)
}

fn collect_remotes(
    elements: &[Element],
    origin_url: &str,
    manifest: &str,
) -> Result<BTreeMap<String, Remote>> {
    let mut remotes = BTreeMap::new();

    for element in elements.iter().filter(|e| e.is(REMOTE)) {
        let name = element.name().ok_or_else(|| RepoVersionError::Parse {
            name: manifest.to_string(),
            message: "<remote> without name attribute".to_string(),
        })?;
        let fetch = element.attr("fetch").ok_or_else(|| RepoVersionError::Parse {
            name: manifest.to_string(),
            message: format!("remote {} has no fetch attribute", name),
        })?;

        remotes.insert(
            name.to_string(),
            Remote {
                name: name.to_string(),
                fetch: absolute_fetch_url(fetch, origin_url),
                revision: present(element.attr("revision")).map(str::to_string),
            },
        );
    }

    Ok(remotes)
}

/// An empty attribute counts as unset
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn collect_default(elements: &[Element]) -> ManifestDefault {
    elements
        .iter()
        .filter(|e| e.is(DEFAULT))
        .last()
        .map(|e| ManifestDefault {
            remote: present(e.attr("remote")).map(str::to_string),
            revision: present(e.attr("revision")).map(str::to_string),
        })
        .unwrap_or_default()
}

fn resolve_projects(
    elements: &[Element],
    remotes: &BTreeMap<String, Remote>,
    default: &ManifestDefault,
    manifest: &str,
) -> Result<Vec<Project>> {
    let mut projects: Vec<Project> = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        if !element.is(PROJECT) {
            continue;
        }

        let name = element.name().ok_or_else(|| RepoVersionError::Parse {
            name: manifest.to_string(),
            message: "<project> without name attribute".to_string(),
        })?;

        let remote_name = present(element.attr("remote"))
            .or(default.remote.as_deref())
            .ok_or_else(|| RepoVersionError::MissingRemote(name.to_string()))?;

        let remote = remotes
            .get(remote_name)
            .ok_or_else(|| RepoVersionError::UnknownRemote {
                project: name.to_string(),
                remote: remote_name.to_string(),
            })?;

        let revision = present(element.attr("revision"))
            .or(remote.revision.as_deref())
            .or(default.revision.as_deref())
            .ok_or_else(|| RepoVersionError::MissingRevision(name.to_string()))?;

        if projects.iter().any(|p| p.name == name && p.remote == remote.name) {
            warn!(project = name, remote = %remote.name, "Project declared more than once");
        }

        projects.push(Project {
            name: name.to_string(),
            path: element.attr("path").map(str::to_string),
            remote: remote.name.clone(),
            remote_url: remote.fetch.clone(),
            revision: revision.to_string(),
            element_index: index,
        });
    }

    Ok(projects)
}
