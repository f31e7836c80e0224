//! XML serialization.
//!
//! This module prints a `Document` tree back to XML text, escaping attribute
//! values and content with the entity codec.

pub mod xml;

pub use xml::{print, print_node, write_document};
