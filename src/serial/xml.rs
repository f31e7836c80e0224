//! XML printer.
//!
//! Writes a `Document` back out as markup. Each element becomes a start tag
//! with its attributes, then its escaped content, then its children, then an
//! end tag; an element with neither content nor children becomes an
//! empty-element tag. With `pretty` set, a line break follows every tag and
//! every content segment.
//!
//! Only the resolved content of an element is printed, not its raw text, so
//! whitespace around text and text following child elements is not
//! reproduced. Printing and re-parsing yields an equivalent tree.

use std::io;

use crate::escape::push_escaped;
use crate::tree::{Document, NodeId};

enum Visit {
    Open(NodeId),
    Close(NodeId),
}

/// Prints a whole document: the root element and any elements that follow
/// it at the top level.
///
/// # Examples
///
/// ```
/// use xmldom::Document;
/// use xmldom::serial::print;
///
/// let doc = Document::parse_str(r#"<a x="1"><b> hi </b><c/></a>"#).unwrap();
/// assert_eq!(print(&doc, false), r#"<a x="1"><b>hi</b><c/></a>"#);
/// assert_eq!(print(&doc, true), "<a x=\"1\">\n<b>\nhi\n</b>\n<c/>\n</a>\n");
/// ```
#[must_use]
pub fn print(doc: &Document, pretty: bool) -> String {
    let mut out = String::new();
    if let Some(root) = doc.root() {
        write_nodes(&mut out, doc, root, true, pretty);
    }
    out
}

/// Prints the subtree rooted at `id`.
#[must_use]
pub fn print_node(doc: &Document, id: NodeId, pretty: bool) -> String {
    let mut out = String::new();
    write_nodes(&mut out, doc, id, false, pretty);
    out
}

/// Prints a whole document to `writer`.
///
/// # Errors
///
/// Returns any error reported by `writer`.
pub fn write_document<W: io::Write>(mut writer: W, doc: &Document, pretty: bool) -> io::Result<()> {
    writer.write_all(print(doc, pretty).as_bytes())?;
    writer.flush()
}

fn write_nodes(out: &mut String, doc: &Document, start: NodeId, with_siblings: bool, pretty: bool) {
    let newline = if pretty { "\n" } else { "" };
    let mut stack = vec![Visit::Open(start)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Open(id) => {
                let node = doc.node(id);
                if with_siblings || id != start {
                    if let Some(next) = node.next_sibling() {
                        stack.push(Visit::Open(next));
                    }
                }

                out.push('<');
                out.push_str(node.name());
                for attr in node.attributes().iter_added() {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    push_escaped(out, &attr.value);
                    out.push('"');
                }

                let content = node.content();
                match node.first_child() {
                    None if content.is_empty() => {
                        out.push_str("/>");
                        out.push_str(newline);
                    }
                    first_child => {
                        out.push('>');
                        out.push_str(newline);
                        if !content.is_empty() {
                            push_escaped(out, content);
                            out.push_str(newline);
                        }
                        stack.push(Visit::Close(id));
                        if let Some(child) = first_child {
                            stack.push(Visit::Open(child));
                        }
                    }
                }
            }
            Visit::Close(id) => {
                out.push_str("</");
                out.push_str(doc.node_name(id));
                out.push('>');
                out.push_str(newline);
            }
        }
    }
}
