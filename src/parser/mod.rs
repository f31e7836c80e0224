//! Parsing entry points.
//!
//! Every entry point drives the same machinery: a [`tokenizer::Tokenizer`]
//! checks the input and fires events into a
//! [`TreeBuilder`](crate::builder::TreeBuilder). The one-shot functions here
//! feed the whole input at once; [`PushParser`] accepts it in chunks.
//!
//! On failure no partial tree is returned: everything built so far is
//! released before the error reaches the caller.

pub(crate) mod input;
pub mod push;
pub mod tokenizer;

pub use push::PushParser;

use std::io::Read;
use std::path::Path;

use crate::builder::TreeBuilder;
use crate::error::ParseError;
use crate::tree::Document;

use input::{
    DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_ATTRIBUTE_LENGTH, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_TEXT_LENGTH,
};
use tokenizer::Tokenizer;

/// Size of the chunks read by [`parse_reader`] and [`parse_file`].
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Parse options controlling resource limits.
///
/// Every limit is unlimited by default, so the default options accept any
/// well-formed document. Set limits with the builder methods when parsing
/// untrusted input; exceeding one fails with
/// [`ErrorKind::LimitExceeded`](crate::error::ErrorKind::LimitExceeded):
///
/// ```
/// use xmldom::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .max_depth(64)
///     .max_attributes(16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum element nesting depth (default: unlimited).
    pub max_depth: u32,
    /// Maximum number of attributes on a single element (default: unlimited).
    pub max_attributes: u32,
    /// Maximum length in bytes of a single attribute value (default: unlimited).
    pub max_attribute_length: usize,
    /// Maximum length in bytes of a run of character data between two tags
    /// (default: unlimited).
    pub max_text_length: usize,
    /// Maximum length in bytes of an element or attribute name
    /// (default: unlimited).
    pub max_name_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_attribute_length: DEFAULT_MAX_ATTRIBUTE_LENGTH,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes per element.
    #[must_use]
    pub fn max_attributes(mut self, max: u32) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum attribute value length in bytes.
    #[must_use]
    pub fn max_attribute_length(mut self, max: usize) -> Self {
        self.max_attribute_length = max;
        self
    }

    /// Sets the maximum text run length in bytes.
    #[must_use]
    pub fn max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }
}

/// Parses a complete buffer of UTF-8 encoded XML with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML.
///
/// # Examples
///
/// ```
/// use xmldom::parser::parse_buffer;
///
/// let doc = parse_buffer(b"<a x=\"1\"><b>hi</b><c/></a>").unwrap();
/// assert_eq!(doc.node_count(), 3);
/// assert!(parse_buffer(b"<a><b></a>").is_err());
/// ```
pub fn parse_buffer(input: &[u8]) -> Result<Document, ParseError> {
    parse_buffer_with_options(input, &ParseOptions::default())
}

/// Parses a complete buffer with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML, exceeds a limit
/// in `options`, or memory runs out.
pub fn parse_buffer_with_options(
    input: &[u8],
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let mut builder = TreeBuilder::new();
    Tokenizer::new(options.clone()).feed(input, true, &mut builder)?;
    let doc = builder.finish()?;
    log::debug!(
        target: "xmldom.parser",
        "parsed {} bytes into {} nodes",
        input.len(),
        doc.node_count()
    );
    Ok(doc)
}

/// Parses an XML string with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_buffer(input.as_bytes())
}

/// Parses an XML string with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML or exceeds a
/// limit in `options`.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    parse_buffer_with_options(input.as_bytes(), options)
}

/// Parses XML read from `reader` in chunks of [`READ_CHUNK_SIZE`] bytes.
///
/// # Errors
///
/// Returns an `Io` error if reading fails, otherwise as for
/// [`parse_buffer`].
pub fn parse_reader<R: Read>(reader: R) -> Result<Document, ParseError> {
    parse_reader_with_options(reader, &ParseOptions::default())
}

/// Parses XML read from `reader` with the given options.
///
/// # Errors
///
/// Returns an `Io` error if reading fails, otherwise as for
/// [`parse_buffer_with_options`].
pub fn parse_reader_with_options<R: Read>(
    mut reader: R,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let mut parser = PushParser::with_options(options.clone());
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        parser.push(&chunk[..read], read == 0)?;
        if read == 0 {
            break;
        }
    }
    parser.finish()
}

/// Parses the XML file at `path`.
///
/// # Errors
///
/// Returns an `Io` error if the file cannot be opened or read, otherwise as
/// for [`parse_buffer`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, ParseError> {
    parse_file_with_options(path, &ParseOptions::default())
}

/// Parses the XML file at `path` with the given options.
///
/// # Errors
///
/// Returns an `Io` error if the file cannot be opened or read, otherwise as
/// for [`parse_buffer_with_options`].
pub fn parse_file_with_options(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let path = path.as_ref();
    log::debug!(target: "xmldom.parser", "parsing {}", path.display());
    let file = std::fs::File::open(path)?;
    parse_reader_with_options(file, options)
}
