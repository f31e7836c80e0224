//! Per-node storage.
//!
//! A `NodeData` holds one element: its name and attributes, the raw text
//! delivered while it was open, the resolved content range, its closed flag,
//! and the arena links used for navigation.

use super::{AttrList, NodeId};

/// A byte range into a node's raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    /// Offset of the first byte.
    pub start: usize,
    /// Number of bytes.
    pub len: usize,
}

impl TextRange {
    /// Returns the exclusive end offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Where a node stands with respect to explicit content sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Section {
    /// No section has been opened on this node.
    #[default]
    None,
    /// The first section is open; content starts at this offset.
    Open(usize),
    /// The first section has been completed and fixes the content range.
    Done,
}

/// Storage for a single element in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub(crate) name: String,
    pub(crate) attributes: AttrList,
    pub(crate) raw_text: String,
    pub(crate) content: Option<TextRange>,
    pub(crate) section: Section,
    pub(crate) closed: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
}

impl NodeData {
    pub(crate) fn new(name: String, attributes: AttrList) -> Self {
        Self {
            name,
            attributes,
            raw_text: String::new(),
            content: None,
            section: Section::None,
            closed: false,
            parent: None,
            first_child: None,
            next_sibling: None,
        }
    }

    /// The element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element's attributes.
    #[must_use]
    pub fn attributes(&self) -> &AttrList {
        &self.attributes
    }

    /// Every piece of character data delivered while the element was open,
    /// concatenated in arrival order. Includes CDATA text.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// The resolved content: the first CDATA section if there was one,
    /// otherwise the raw text with surrounding whitespace removed.
    ///
    /// Empty until the element is closed, unless a CDATA section completed
    /// earlier.
    #[must_use]
    pub fn content(&self) -> &str {
        self.content
            .and_then(|r| self.raw_text.get(r.start..r.end()))
            .unwrap_or("")
    }

    /// The resolved content as a range into [`raw_text`](Self::raw_text).
    #[must_use]
    pub fn content_range(&self) -> Option<TextRange> {
        self.content
    }

    /// Returns `true` once the matching end tag has been processed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The parent element, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The first child element.
    #[must_use]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    /// The next sibling element.
    #[must_use]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Fixes the content range from the raw text with leading and trailing
    /// space, tab, CR and LF removed.
    pub(crate) fn resolve_trimmed_content(&mut self) {
        let is_space = |c: char| matches!(c, ' ' | '\t' | '\r' | '\n');
        let start_trimmed = self.raw_text.trim_start_matches(is_space);
        let start = self.raw_text.len() - start_trimmed.len();
        let len = start_trimmed.trim_end_matches(is_space).len();
        self.content = Some(TextRange { start, len });
    }
}
