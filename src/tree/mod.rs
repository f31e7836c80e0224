//! Arena-based element tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a newtype over `NonZeroU32`. Parent,
//! first-child and next-sibling links are arena indices, so dropping or
//! clearing a `Document` releases every node in one flat pass regardless of
//! how deep the tree is.
//!
//! Only elements are nodes. Character data is accumulated on the element that
//! was open when it arrived (see [`NodeData::raw_text`]) and a trimmed or
//! CDATA-delimited view of it is exposed as [`NodeData::content`].

mod attr;
mod node;

pub use attr::{AttrList, Attribute};
pub use node::{NodeData, TextRange};
pub(crate) use node::Section;

use crate::error::ParseError;
use std::num::NonZeroU32;

/// A typed index into the document's node arena.
///
/// `Option<NodeId>` has the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> Option<Self> {
        let raw = u32::try_from(index.checked_add(1)?).ok()?;
        NonZeroU32::new(raw).map(Self)
    }

    fn as_index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// Returns the raw, always non-zero, value of this id.
    #[must_use]
    pub fn into_raw(self) -> u32 {
        self.0.get()
    }

    /// Creates a `NodeId` from a raw `u32`, if non-zero.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

/// An element tree.
///
/// The first element created is the root. Nodes are never removed
/// individually; the whole tree is released together.
///
/// # Examples
///
/// ```
/// use xmldom::Document;
///
/// let doc = Document::parse_str(r#"<a x="1"><b>hi</b><c/></a>"#).unwrap();
/// let root = doc.root().unwrap();
/// assert_eq!(doc.node_name(root), "a");
/// assert_eq!(doc.find_attr(root, "X"), Some("1"));
///
/// let b = doc.find_node(root, "B").unwrap();
/// assert_eq!(doc.content(b), "hi");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Parses a complete XML string.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        crate::parser::parse_str(input)
    }

    /// Parses a complete buffer of UTF-8 encoded XML.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed or not UTF-8.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        crate::parser::parse_buffer(input)
    }

    /// Returns the root element, or `None` for an empty document.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            NodeId::from_index(0)
        }
    }

    /// Returns `true` if the document has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of nodes in the document.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node data for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    /// Returns the node data for `id`, or `None` if `id` is out of range.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.as_index())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the element name of a node.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    /// Returns the resolved content of a node.
    #[must_use]
    pub fn content(&self, id: NodeId) -> &str {
        self.node(id).content()
    }

    /// Returns all character data delivered to a node.
    #[must_use]
    pub fn raw_text(&self, id: NodeId) -> &str {
        self.node(id).raw_text()
    }

    /// Returns the attributes of a node.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &AttrList {
        self.node(id).attributes()
    }

    /// Returns the value of the named attribute on `id`, compared without
    /// regard to ASCII case.
    #[must_use]
    pub fn find_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attributes().find(name)
    }

    /// Finds the first node named `name` (ignoring ASCII case) in the subtree
    /// rooted at `start`, `start` itself included.
    ///
    /// The search is depth-first and visits earlier siblings before later
    /// ones.
    #[must_use]
    pub fn find_node(&self, start: NodeId, name: &str) -> Option<NodeId> {
        std::iter::once(start)
            .chain(self.descendants(start))
            .find(|&id| self.node(id).name().eq_ignore_ascii_case(name))
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns an iterator over the children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Returns an iterator over a node and its ancestors, innermost first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns a depth-first iterator over all descendants of a node, not
    /// including the node itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Returns `true` if every node in the document has been closed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.nodes.iter().all(NodeData::is_closed)
    }

    /// Releases every node.
    pub fn clear(&mut self) {
        self.nodes = Vec::new();
    }

    /// Allocates a new, unlinked node.
    pub(crate) fn create_node(
        &mut self,
        name: String,
        attributes: AttrList,
    ) -> Result<NodeId, ParseError> {
        let id = NodeId::from_index(self.nodes.len())
            .ok_or_else(|| ParseError::no_memory("node arena exhausted"))?;
        self.nodes.try_reserve(1)?;
        self.nodes.push(NodeData::new(name, attributes));
        Ok(id)
    }

    /// Links `child` as the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match self.children(parent).last() {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(child).parent = Some(parent);
    }

    /// Links `sibling` directly after `id`, under the same parent.
    pub(crate) fn insert_after(&mut self, id: NodeId, sibling: NodeId) {
        let parent = self.parent(id);
        let displaced = self.node_mut(id).next_sibling.replace(sibling);
        let node = self.node_mut(sibling);
        node.parent = parent;
        node.next_sibling = displaced;
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        // Walk up until a node with a next sibling, stopping at the root.
        let mut node = current;
        loop {
            if node == self.root {
                self.next = None;
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(node) {
                self.next = Some(sibling);
                break;
            }
            match self.doc.parent(node) {
                Some(parent) => node = parent,
                None => {
                    self.next = None;
                    break;
                }
            }
        }
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(doc: &mut Document, name: &str) -> NodeId {
        doc.create_node(name.to_string(), AttrList::new()).unwrap()
    }

    /// Builds `<r><a><a1/><a2/></a><b><b1/></b><c/></r>`.
    fn sample() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let r = element(&mut doc, "r");
        let a = element(&mut doc, "a");
        let a1 = element(&mut doc, "a1");
        let a2 = element(&mut doc, "a2");
        let b = element(&mut doc, "b");
        let b1 = element(&mut doc, "b1");
        let c = element(&mut doc, "c");
        doc.append_child(r, a);
        doc.append_child(a, a1);
        doc.append_child(a, a2);
        doc.append_child(r, b);
        doc.append_child(b, b1);
        doc.append_child(r, c);
        (doc, vec![r, a, a1, a2, b, b1, c])
    }

    fn names(doc: &Document, ids: impl Iterator<Item = NodeId>) -> Vec<&str> {
        ids.map(|id| doc.node_name(id)).collect()
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.root(), None);
        assert_eq!(doc.node_count(), 0);
        assert!(doc.is_complete());
    }

    #[test]
    fn test_first_node_is_root() {
        let (doc, ids) = sample();
        assert_eq!(doc.root(), Some(ids[0]));
        assert_eq!(doc.parent(ids[0]), None);
        assert_eq!(doc.node_count(), 7);
    }

    #[test]
    fn test_links() {
        let (doc, ids) = sample();
        let (r, a, a1, a2, b) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
        assert_eq!(doc.first_child(r), Some(a));
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(a1), Some(a2));
        assert_eq!(doc.parent(a2), Some(a));
        assert_eq!(doc.parent(b), Some(r));
    }

    #[test]
    fn test_children_iterator() {
        let (doc, ids) = sample();
        assert_eq!(names(&doc, doc.children(ids[0])), vec!["a", "b", "c"]);
        assert_eq!(names(&doc, doc.children(ids[6])), Vec::<&str>::new());
    }

    #[test]
    fn test_ancestors_iterator() {
        let (doc, ids) = sample();
        assert_eq!(names(&doc, doc.ancestors(ids[5])), vec!["b1", "b", "r"]);
    }

    #[test]
    fn test_descendants_iterator() {
        let (doc, ids) = sample();
        assert_eq!(
            names(&doc, doc.descendants(ids[0])),
            vec!["a", "a1", "a2", "b", "b1", "c"]
        );
        // Does not escape the starting subtree.
        assert_eq!(names(&doc, doc.descendants(ids[1])), vec!["a1", "a2"]);
        assert_eq!(names(&doc, doc.descendants(ids[2])), Vec::<&str>::new());
    }

    #[test]
    fn test_find_node_ignores_case_and_prefers_earlier() {
        let (doc, ids) = sample();
        assert_eq!(doc.find_node(ids[0], "B1"), Some(ids[5]));
        assert_eq!(doc.find_node(ids[0], "R"), Some(ids[0]));
        assert_eq!(doc.find_node(ids[0], "missing"), None);
        // Searching below `a` never reaches `b`.
        assert_eq!(doc.find_node(ids[1], "b"), None);
    }

    #[test]
    fn test_find_attr() {
        let mut doc = Document::new();
        let attrs: AttrList = [("Year", "1994")].into_iter().collect();
        let id = doc.create_node("book".to_string(), attrs).unwrap();
        assert_eq!(doc.find_attr(id, "year"), Some("1994"));
        assert_eq!(doc.find_attr(id, "title"), None);
    }

    #[test]
    fn test_insert_after() {
        let mut doc = Document::new();
        let r = element(&mut doc, "r");
        let a = element(&mut doc, "a");
        let b = element(&mut doc, "b");
        doc.append_child(r, a);
        doc.insert_after(a, b);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.parent(b), Some(r));
        assert_eq!(names(&doc, doc.children(r)), vec!["a", "b"]);
    }

    #[test]
    fn test_clear_releases_nodes() {
        let (mut doc, _) = sample();
        doc.clear();
        assert!(doc.is_empty());
        assert_eq!(doc.root(), None);
    }

    #[test]
    fn test_node_id_raw_round_trip() {
        let (doc, ids) = sample();
        let raw = ids[3].into_raw();
        assert_ne!(raw, 0);
        assert_eq!(NodeId::from_raw(raw), Some(ids[3]));
        assert_eq!(NodeId::from_raw(0), None);
        assert!(doc.get(ids[3]).is_some());
    }

    #[test]
    fn test_deep_tree_drops_without_recursion() {
        let mut doc = Document::new();
        let mut parent = element(&mut doc, "d");
        for _ in 0..100_000 {
            let child = element(&mut doc, "d");
            doc.append_child(parent, child);
            parent = child;
        }
        assert_eq!(doc.node_count(), 100_001);
        drop(doc);
    }
}
