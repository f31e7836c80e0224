//! Incremental tree construction.
//!
//! [`TreeBuilder`] turns a flat stream of element, text and CDATA events into
//! a [`Document`]. The only state kept between events is a single cursor: the
//! most recently started node, or the most recently closed one. Nesting is
//! recovered from each node's `closed` flag and parent link instead of a
//! separate stack:
//!
//! - a start event while the cursor is open adds a child of the cursor;
//! - a start event while the cursor is closed adds a sibling after it;
//! - an end event closes the cursor, or, if the cursor is already closed,
//!   walks up the parent links to the nearest open ancestor and closes that.
//!
//! The builder trusts the event source to be balanced. It does not report
//! well-formedness errors of its own and stays memory-safe on any sequence of
//! events: surplus end events are ignored once the walk reaches the root.
//!
//! # Examples
//!
//! ```
//! use xmldom::builder::TreeBuilder;
//!
//! let mut builder = TreeBuilder::new();
//! builder.start_element("a", Vec::new()).unwrap();
//! builder.characters("  hi  ").unwrap();
//! builder.end_element("a");
//!
//! let doc = builder.finish().unwrap();
//! let root = doc.root().unwrap();
//! assert_eq!(doc.content(root), "hi");
//! assert_eq!(doc.raw_text(root), "  hi  ");
//! ```

use crate::error::{ErrorKind, ParseError};
use crate::sax::SaxHandler;
use crate::tree::{AttrList, Attribute, Document, NodeId, Section, TextRange};

/// Builds a [`Document`] from parse events.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    doc: Document,
    cursor: Option<NodeId>,
}

impl TreeBuilder {
    /// Creates a builder with an empty tree and no cursor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            doc: Document::new(),
            cursor: None,
        }
    }

    /// The node the next event is interpreted against, `None` before the
    /// first start event.
    #[must_use]
    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    /// The tree built so far.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Handles a start tag: allocates a node and places it relative to the
    /// cursor, which then moves to the new node.
    ///
    /// An attribute that cannot be stored for lack of memory is dropped.
    ///
    /// # Errors
    ///
    /// Returns a `NoMemory` error if the node itself cannot be allocated.
    pub fn start_element(
        &mut self,
        name: &str,
        attributes: Vec<Attribute>,
    ) -> Result<NodeId, ParseError> {
        let mut owned_name = String::new();
        owned_name.try_reserve_exact(name.len())?;
        owned_name.push_str(name);

        let mut attrs = AttrList::new();
        for attr in attributes {
            match attrs.try_reserve(1) {
                Ok(()) => attrs.push(attr),
                Err(err) => log::warn!(
                    target: "xmldom.builder",
                    "dropping attribute '{}' on <{name}>: {err}",
                    attr.name
                ),
            }
        }

        let id = self.doc.create_node(owned_name, attrs)?;
        match self.cursor {
            None => {
                log::trace!(target: "xmldom.builder", "<{name}> becomes the root");
            }
            Some(cursor) if self.doc.node(cursor).is_closed() => {
                log::trace!(
                    target: "xmldom.builder",
                    "<{name}> follows closed <{}>",
                    self.doc.node_name(cursor)
                );
                self.doc.insert_after(cursor, id);
            }
            Some(cursor) => {
                log::trace!(
                    target: "xmldom.builder",
                    "<{name}> is a child of <{}>",
                    self.doc.node_name(cursor)
                );
                self.doc.append_child(cursor, id);
            }
        }
        self.cursor = Some(id);
        Ok(id)
    }

    /// Handles an end tag: closes the cursor, first walking up to the nearest
    /// open ancestor if the cursor is already closed.
    ///
    /// On close the node's content is resolved: the first CDATA section if one
    /// was opened, otherwise the raw text with surrounding whitespace removed.
    pub fn end_element(&mut self, name: &str) {
        let Some(mut node) = self.cursor else {
            log::debug!(target: "xmldom.builder", "ignoring </{name}>: no element started");
            return;
        };

        while self.doc.node(node).is_closed() {
            match self.doc.parent(node) {
                Some(parent) => node = parent,
                None => {
                    log::debug!(
                        target: "xmldom.builder",
                        "ignoring </{name}>: every element is already closed"
                    );
                    self.cursor = Some(node);
                    return;
                }
            }
        }

        let data = self.doc.node_mut(node);
        if data.name != name {
            log::debug!(
                target: "xmldom.builder",
                "end tag </{name}> closes <{}>",
                data.name
            );
        }
        match data.section {
            Section::None => data.resolve_trimmed_content(),
            Section::Open(start) => {
                data.content = Some(TextRange {
                    start,
                    len: data.raw_text.len() - start,
                });
                data.section = Section::Done;
            }
            Section::Done => {}
        }
        data.closed = true;
        log::trace!(target: "xmldom.builder", "closed <{}>", data.name);
        self.cursor = Some(node);
    }

    /// Handles character data: appends it to the innermost open element.
    /// The cursor does not move.
    ///
    /// # Errors
    ///
    /// Returns a `NoMemory` error if the text buffer cannot grow.
    pub fn characters(&mut self, text: &str) -> Result<(), ParseError> {
        let Some(target) = self.open_target() else {
            log::debug!(
                target: "xmldom.builder",
                "ignoring {} bytes of character data outside any open element",
                text.len()
            );
            return Ok(());
        };
        let raw = &mut self.doc.node_mut(target).raw_text;
        raw.try_reserve(text.len())?;
        raw.push_str(text);
        Ok(())
    }

    /// Handles the start of a CDATA section. Only the first section opened on
    /// an element defines its content.
    pub fn start_content_section(&mut self) {
        let Some(target) = self.open_target() else {
            return;
        };
        let data = self.doc.node_mut(target);
        if data.section == Section::None {
            data.section = Section::Open(data.raw_text.len());
            log::trace!(target: "xmldom.builder", "content section opens on <{}>", data.name);
        }
    }

    /// Handles the end of a CDATA section, fixing the content range if this
    /// ends the element's first section.
    pub fn end_content_section(&mut self) {
        let Some(target) = self.open_target() else {
            return;
        };
        let data = self.doc.node_mut(target);
        if let Section::Open(start) = data.section {
            data.content = Some(TextRange {
                start,
                len: data.raw_text.len() - start,
            });
            data.section = Section::Done;
            log::trace!(target: "xmldom.builder", "content section closes on <{}>", data.name);
        }
    }

    /// Returns the finished tree.
    ///
    /// # Errors
    ///
    /// Returns a well-formedness error if no element was started or if any
    /// element is still open.
    pub fn finish(self) -> Result<Document, ParseError> {
        if self.doc.is_empty() {
            return Err(unfinished("no element found"));
        }
        if let Some(open) = self.open_target() {
            let name = self.doc.node_name(open).to_string();
            return Err(unfinished(format!("unclosed element <{name}>")));
        }
        Ok(self.doc)
    }

    /// Returns the tree as built so far, open elements included.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Releases the tree and forgets the cursor.
    pub fn clear(&mut self) {
        self.cursor = None;
        self.doc.clear();
    }

    /// The cursor if it is open, otherwise its nearest open ancestor.
    fn open_target(&self) -> Option<NodeId> {
        let cursor = self.cursor?;
        self.doc
            .ancestors(cursor)
            .find(|&id| !self.doc.node(id).is_closed())
    }
}

fn unfinished(message: impl Into<String>) -> ParseError {
    ParseError::new(ErrorKind::WellFormedness, message)
}

impl SaxHandler for TreeBuilder {
    fn start_element(&mut self, name: &str, attributes: Vec<Attribute>) -> Result<(), ParseError> {
        TreeBuilder::start_element(self, name, attributes).map(|_| ())
    }

    fn end_element(&mut self, name: &str) -> Result<(), ParseError> {
        TreeBuilder::end_element(self, name);
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), ParseError> {
        TreeBuilder::characters(self, text)
    }

    fn start_cdata(&mut self) -> Result<(), ParseError> {
        self.start_content_section();
        Ok(())
    }

    fn end_cdata(&mut self) -> Result<(), ParseError> {
        self.end_content_section();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn start(builder: &mut TreeBuilder, name: &str) -> NodeId {
        builder.start_element(name, Vec::new()).unwrap()
    }

    fn child_names(doc: &Document, id: NodeId) -> Vec<&str> {
        doc.children(id).map(|c| doc.node_name(c)).collect()
    }

    #[test]
    fn test_first_start_becomes_root() {
        let mut builder = TreeBuilder::new();
        assert_eq!(builder.cursor(), None);
        let a = start(&mut builder, "a");
        assert_eq!(builder.cursor(), Some(a));
        assert_eq!(builder.document().root(), Some(a));
        assert_eq!(builder.document().parent(a), None);
    }

    #[test]
    fn test_children_and_siblings() {
        // <a><b>hi</b><c/></a>
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        let b = start(&mut builder, "b");
        builder.characters("hi").unwrap();
        builder.end_element("b");
        assert_eq!(builder.cursor(), Some(b));
        let c = start(&mut builder, "c");
        builder.end_element("c");
        builder.end_element("a");
        assert_eq!(builder.cursor(), Some(a));

        let doc = builder.finish().unwrap();
        assert_eq!(child_names(&doc, a), vec!["b", "c"]);
        assert_eq!(doc.parent(b), Some(a));
        assert_eq!(doc.parent(c), Some(a));
        assert_eq!(doc.content(b), "hi");
        assert_eq!(doc.content(c), "");
        assert!(doc.is_complete());
    }

    #[test]
    fn test_end_ascends_through_closed_nodes() {
        // <a><b><c/></b></a>: the end of b arrives while the cursor is on c.
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        let b = start(&mut builder, "b");
        start(&mut builder, "c");
        builder.end_element("c");
        builder.end_element("b");
        assert_eq!(builder.cursor(), Some(b));
        assert!(builder.document().node(b).is_closed());
        assert!(!builder.document().node(a).is_closed());
        builder.end_element("a");
        assert_eq!(builder.cursor(), Some(a));
        assert!(builder.document().is_complete());
    }

    #[test]
    fn test_sibling_after_deep_close() {
        // <a><b><c/></b><d/></a>
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        start(&mut builder, "b");
        start(&mut builder, "c");
        builder.end_element("c");
        builder.end_element("b");
        let d = start(&mut builder, "d");
        builder.end_element("d");
        builder.end_element("a");
        let doc = builder.finish().unwrap();
        assert_eq!(child_names(&doc, a), vec!["b", "d"]);
        assert_eq!(doc.parent(d), Some(a));
    }

    #[test]
    fn test_text_after_child_goes_to_parent() {
        // <a>x<b/>y</a>
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        builder.characters("x").unwrap();
        let b = start(&mut builder, "b");
        builder.end_element("b");
        builder.characters("y").unwrap();
        assert_eq!(builder.cursor(), Some(b));
        builder.end_element("a");
        let doc = builder.finish().unwrap();
        assert_eq!(doc.raw_text(a), "xy");
        assert_eq!(doc.raw_text(b), "");
    }

    #[test]
    fn test_whitespace_trimmed_at_close() {
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        builder.characters(" \t\r\n  hi there \n").unwrap();
        assert_eq!(builder.document().content(a), "");
        builder.end_element("a");
        assert_eq!(builder.document().content(a), "hi there");
    }

    #[test]
    fn test_first_content_section_wins() {
        // <a> <![CDATA[one]]> <![CDATA[two]]> </a>
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        builder.characters(" ").unwrap();
        builder.start_content_section();
        builder.characters("one").unwrap();
        builder.end_content_section();
        assert_eq!(builder.document().content(a), "one");
        builder.characters(" ").unwrap();
        builder.start_content_section();
        builder.characters("two").unwrap();
        builder.end_content_section();
        builder.characters(" ").unwrap();
        builder.end_element("a");

        let doc = builder.finish().unwrap();
        assert_eq!(doc.content(a), "one");
        assert_eq!(doc.raw_text(a), " one two ");
        assert_eq!(
            doc.node(a).content_range(),
            Some(TextRange { start: 1, len: 3 })
        );
    }

    #[test]
    fn test_content_section_keeps_whitespace() {
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        builder.start_content_section();
        builder.characters("  padded  ").unwrap();
        builder.end_content_section();
        builder.end_element("a");
        assert_eq!(builder.document().content(a), "  padded  ");
    }

    #[test]
    fn test_content_section_open_at_close() {
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        builder.characters("x").unwrap();
        builder.start_content_section();
        builder.characters("rest").unwrap();
        builder.end_element("a");
        assert_eq!(builder.document().content(a), "rest");
    }

    #[test]
    fn test_mismatched_end_name_still_closes_cursor() {
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        let b = start(&mut builder, "b");
        builder.end_element("zzz");
        assert!(builder.document().node(b).is_closed());
        assert!(!builder.document().node(a).is_closed());
        builder.end_element("a");
        assert!(builder.finish().is_ok());
    }

    #[test]
    fn test_surplus_end_events_are_ignored() {
        let mut builder = TreeBuilder::new();
        builder.end_element("nothing");
        assert_eq!(builder.cursor(), None);

        let a = start(&mut builder, "a");
        start(&mut builder, "b");
        builder.end_element("b");
        builder.end_element("a");
        builder.end_element("extra");
        builder.end_element("extra");
        assert_eq!(builder.cursor(), Some(a));
        assert!(builder.document().is_complete());
    }

    #[test]
    fn test_events_without_open_element_are_ignored() {
        let mut builder = TreeBuilder::new();
        builder.characters("stray").unwrap();
        builder.start_content_section();
        builder.end_content_section();
        let a = start(&mut builder, "a");
        builder.end_element("a");
        builder.characters("after").unwrap();
        assert_eq!(builder.document().raw_text(a), "");
    }

    #[test]
    fn test_start_after_closed_root_adds_root_sibling() {
        let mut builder = TreeBuilder::new();
        let a = start(&mut builder, "a");
        builder.end_element("a");
        let b = start(&mut builder, "b");
        builder.end_element("b");
        let doc = builder.into_document();
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.parent(b), None);
    }

    #[test]
    fn test_attributes_are_kept() {
        let mut builder = TreeBuilder::new();
        let a = builder
            .start_element(
                "a",
                vec![Attribute::new("x", "1"), Attribute::new("Y", "2")],
            )
            .unwrap();
        builder.end_element("a");
        let doc = builder.finish().unwrap();
        assert_eq!(doc.find_attr(a, "X"), Some("1"));
        assert_eq!(doc.find_attr(a, "y"), Some("2"));
        assert_eq!(doc.attributes(a).len(), 2);
    }

    #[test]
    fn test_finish_rejects_open_elements() {
        let mut builder = TreeBuilder::new();
        start(&mut builder, "a");
        start(&mut builder, "b");
        builder.end_element("b");
        let err = builder.finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::WellFormedness);
        assert!(err.message.contains("<a>"));

        let err = TreeBuilder::new().finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::WellFormedness);
    }

    #[test]
    fn test_clear() {
        let mut builder = TreeBuilder::new();
        start(&mut builder, "a");
        builder.clear();
        assert_eq!(builder.cursor(), None);
        assert!(builder.document().is_empty());
    }

    #[test]
    fn test_deep_nesting_is_iterative() {
        let depth = 50_000;
        let mut builder = TreeBuilder::new();
        for _ in 0..depth {
            start(&mut builder, "d");
        }
        for _ in 0..depth {
            builder.end_element("d");
        }
        let doc = builder.finish().unwrap();
        assert_eq!(doc.node_count(), depth);
    }
}
