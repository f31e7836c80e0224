//! Streaming event handler API.
//!
//! The tokenizer reports what it sees through a [`SaxHandler`]: element
//! starts and ends, character data, and the boundaries of CDATA sections.
//! The tree builder is one such handler; implement the trait yourself to
//! process documents without building a tree.
//!
//! # Examples
//!
//! ```
//! use xmldom::error::ParseError;
//! use xmldom::parser::ParseOptions;
//! use xmldom::sax::{parse_sax, SaxHandler};
//! use xmldom::tree::Attribute;
//!
//! struct Counter {
//!     elements: usize,
//! }
//!
//! impl SaxHandler for Counter {
//!     fn start_element(&mut self, _name: &str, _attrs: Vec<Attribute>) -> Result<(), ParseError> {
//!         self.elements += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut counter = Counter { elements: 0 };
//! parse_sax(b"<root><a/><b/><c/></root>", &ParseOptions::default(), &mut counter).unwrap();
//! assert_eq!(counter.elements, 4);
//! ```

use crate::error::ParseError;
use crate::parser::tokenizer::Tokenizer;
use crate::parser::ParseOptions;
use crate::tree::Attribute;

/// Receives tokenizer events.
///
/// Every method has a no-op default. Returning an error from any callback
/// aborts tokenization and the error is handed back to the caller of
/// [`Tokenizer::feed`] unchanged.
///
/// Character data may arrive split over any number of `characters` calls,
/// but never in the middle of a UTF-8 sequence or a reference.
#[allow(unused_variables)]
pub trait SaxHandler {
    /// Called for a start tag or the start of an empty-element tag.
    /// `attributes` are in source order.
    fn start_element(&mut self, name: &str, attributes: Vec<Attribute>) -> Result<(), ParseError> {
        Ok(())
    }

    /// Called for an end tag or the end of an empty-element tag.
    fn end_element(&mut self, name: &str) -> Result<(), ParseError> {
        Ok(())
    }

    /// Called for character data, including the text of CDATA sections.
    fn characters(&mut self, text: &str) -> Result<(), ParseError> {
        Ok(())
    }

    /// Called when a `<![CDATA[` section opens.
    fn start_cdata(&mut self) -> Result<(), ParseError> {
        Ok(())
    }

    /// Called when a CDATA section closes.
    fn end_cdata(&mut self) -> Result<(), ParseError> {
        Ok(())
    }

    /// Called for a comment.
    fn comment(&mut self, content: &str) -> Result<(), ParseError> {
        Ok(())
    }

    /// Called for a processing instruction other than the XML declaration.
    fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<(), ParseError> {
        Ok(())
    }
}

/// A handler that ignores every event. Useful for checking well-formedness.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandler;

impl SaxHandler for DefaultHandler {}

/// Tokenizes a complete buffer, firing events on `handler`.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed, exceeds a limit in
/// `options`, or if the handler fails.
///
/// # Examples
///
/// ```
/// use xmldom::parser::ParseOptions;
/// use xmldom::sax::{parse_sax, DefaultHandler};
///
/// assert!(parse_sax(b"<root/>", &ParseOptions::default(), &mut DefaultHandler).is_ok());
/// assert!(parse_sax(b"<root>", &ParseOptions::default(), &mut DefaultHandler).is_err());
/// ```
pub fn parse_sax(
    input: &[u8],
    options: &ParseOptions,
    handler: &mut dyn SaxHandler,
) -> Result<(), ParseError> {
    Tokenizer::new(options.clone()).feed(input, true, handler)
}
