//! # xmldom
//!
//! A small XML DOM built incrementally from streaming parser events.
//!
//! The tokenizer checks the input and reports elements, character data and
//! CDATA sections as events. A [`TreeBuilder`] turns those events into a
//! [`Document`] with a single cursor: the node most recently started, plus
//! its closed flag. Input can be parsed in one go, from a file, or in
//! chunks through a [`PushParser`], and the tree can be printed back with
//! [`serial::print`]. The [`escape`] module holds the entity codec the
//! printer relies on.
//!
//! ## Quick Start
//!
//! ```
//! use xmldom::Document;
//!
//! let doc = Document::parse_str(r#"<root id="1"><child>Hello</child></root>"#).unwrap();
//! let root = doc.root().unwrap();
//! assert_eq!(doc.node_name(root), "root");
//! assert_eq!(doc.find_attr(root, "ID"), Some("1"));
//!
//! let child = doc.find_node(root, "child").unwrap();
//! assert_eq!(doc.content(child), "Hello");
//! ```

pub mod builder;
pub mod error;
pub mod escape;
pub mod parser;
pub mod sax;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use builder::TreeBuilder;
pub use error::{ErrorKind, ParseError, SourceLocation};
pub use parser::{parse_buffer, parse_file, parse_str, ParseOptions, PushParser};
pub use tree::{AttrList, Attribute, Document, NodeId};
