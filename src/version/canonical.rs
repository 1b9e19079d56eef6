//! Canonical manifest rendering
//!
//! Two manifests that check out the same trees render to the same bytes:
//! top-level elements outside [`TAG_ORDER`] are dropped, the rest are sorted
//! by kind then name, attributes are sorted and filtered, and insignificant
//! whitespace, comments, and the XML declaration disappear.

use super::Version;
use crate::manifest::{parse_document, Element, MANIFEST};
use crate::{RepoVersionError, Result};
use tracing::debug;

/// Recognized top-level element kinds, in canonical order
pub const TAG_ORDER: [&str; 6] = [
    "remote",
    "default",
    "project",
    "remove-project",
    "superproject",
    "contactinfo",
];

/// Attributes that never affect what gets checked out
pub const EXCLUDED_ATTRIBUTES: [&str; 2] = ["dest-branch", "upstream"];

fn tag_rank(tag: &str) -> Option<usize> {
    TAG_ORDER.iter().position(|known| *known == tag)
}

/// Render the children of `root` as a canonical `<manifest>` document
pub fn canonicalize(root: &Element) -> Version {
    let mut kept: Vec<(usize, &str, &Element)> = Vec::with_capacity(root.children.len());
    for child in &root.children {
        match tag_rank(&child.tag) {
            Some(rank) => kept.push((rank, child.name().unwrap_or(""), child)),
            None => debug!(tag = %child.tag, "Dropping unrecognized element"),
        }
    }
    kept.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut out = String::new();
    out.push('<');
    out.push_str(MANIFEST);
    out.push('>');
    escape_text(&mut out, root.text.trim());
    for (_, _, element) in kept {
        write_element(&mut out, element);
    }
    out.push_str("</");
    out.push_str(MANIFEST);
    out.push('>');

    Version::new(out)
}

/// Parse `xml` and canonicalize it
///
/// Malformed input yields [`RepoVersionError::InvalidVersion`], never a
/// version that merely compares unequal.
pub fn canonicalize_str(xml: &str) -> Result<Version> {
    let root = parse_document(xml).map_err(|e| RepoVersionError::InvalidVersion(e.to_string()))?;
    Ok(canonicalize(&root))
}

fn write_element(out: &mut String, element: &Element) {
    let mut attributes: Vec<&(String, String)> = element
        .attributes
        .iter()
        .filter(|(name, _)| !EXCLUDED_ATTRIBUTES.contains(&name.as_str()))
        .collect();
    attributes.sort_by(|a, b| a.0.cmp(&b.0));

    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(out, value);
        out.push('"');
    }
    out.push('>');

    escape_text(out, element.text.trim());
    for child in &element.children {
        write_element(out, child);
    }

    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
    escape_text(out, element.tail.trim());
}

fn escape_attribute(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}
