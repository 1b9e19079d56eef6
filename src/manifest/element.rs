//! Generic manifest element tree
//!
//! Elements keep their attributes in document order; the canonical writer is
//! responsible for any reordering.

/// A single XML element with its attributes, trimmed text, and children
///
/// Mixed content keeps its placement: `text` is the character data before
/// the first child, and each child's `tail` is the data that follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name (e.g., "project")
    pub tag: String,

    /// Attributes in document order
    pub attributes: Vec<(String, String)>,

    /// Child elements in document order
    pub children: Vec<Element>,

    /// Character data before the first child, surrounding whitespace removed
    pub text: String,

    /// Character data after this element's end tag, inside its parent
    pub tail: String,
}

impl Element {
    /// Create an empty element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The `name` attribute, which identifies most manifest elements
    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }

    /// Set an attribute, replacing any existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Whether this element has the given tag
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}
