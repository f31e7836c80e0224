//! Push/incremental parsing session.
//!
//! A [`PushParser`] accepts XML in arbitrarily sized chunks via
//! [`PushParser::push`]. Each chunk is tokenized as soon as it arrives and the
//! resulting events extend the tree immediately, so the tree built so far can
//! be inspected between pushes. Chunks may split tags, references or
//! multi-byte characters at any point.
//!
//! The tokenizer and the tree are created by the first push. The tokenizer is
//! released after the final chunk. If any chunk fails, the session releases
//! the whole tree and the tokenizer before reporting the error; the next push
//! then starts a new document.
//!
//! # Examples
//!
//! ```
//! use xmldom::parser::PushParser;
//!
//! let mut parser = PushParser::new();
//! parser.push(b"<root><chi", false).unwrap();
//! parser.push(b"ld>Hello</child>", false).unwrap();
//! parser.push(b"</root>", true).unwrap();
//!
//! let doc = parser.finish().unwrap();
//! let child = doc.find_node(doc.root().unwrap(), "child").unwrap();
//! assert_eq!(doc.content(child), "Hello");
//! ```

use crate::builder::TreeBuilder;
use crate::error::ParseError;
use crate::parser::tokenizer::Tokenizer;
use crate::parser::ParseOptions;
use crate::tree::Document;

/// A chunked parse session.
///
/// # Construction
///
/// Use [`PushParser::new`] for default options, or [`PushParser::with_options`]
/// to set limits.
pub struct PushParser {
    options: ParseOptions,
    tokenizer: Option<Tokenizer>,
    builder: Option<TreeBuilder>,
    bytes_consumed: usize,
    finished: bool,
}

impl PushParser {
    /// Creates a new session with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    /// Creates a new session with the specified options.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::parser::{ParseOptions, PushParser};
    ///
    /// let mut parser = PushParser::with_options(ParseOptions::default().max_depth(2));
    /// assert!(parser.push(b"<a><b><c/></b></a>", true).is_err());
    /// ```
    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            tokenizer: None,
            builder: None,
            bytes_consumed: 0,
            finished: false,
        }
    }

    /// Feeds the next chunk. Pass `is_final = true` with the last chunk (which
    /// may be empty).
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input so far is not well-formed, exceeds a
    /// limit, or memory runs out. The partial tree has been released by the
    /// time the error is returned.
    ///
    /// Pushing after a successful final chunk is a well-formedness error; the
    /// finished tree is kept.
    pub fn push(&mut self, data: &[u8], is_final: bool) -> Result<(), ParseError> {
        if self.finished {
            return Err(ParseError::new(
                crate::error::ErrorKind::WellFormedness,
                "push after the final chunk",
            ));
        }

        let options = &self.options;
        let tokenizer = self
            .tokenizer
            .get_or_insert_with(|| Tokenizer::new(options.clone()));
        let builder = self.builder.get_or_insert_with(TreeBuilder::new);

        let result = tokenizer.feed(data, is_final, builder);
        self.bytes_consumed = tokenizer.bytes_consumed();

        match result {
            Ok(()) => {
                if is_final {
                    log::debug!(
                        target: "xmldom.parser",
                        "push session finished after {} bytes",
                        self.bytes_consumed
                    );
                    self.tokenizer = None;
                    self.finished = true;
                }
                Ok(())
            }
            Err(err) => {
                log::debug!(target: "xmldom.parser", "push session failed: {err}");
                self.discard();
                Err(err)
            }
        }
    }

    /// The tree built so far, once a push has succeeded. Until the final chunk
    /// it may contain elements that are still open.
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        self.builder.as_ref().map(TreeBuilder::document)
    }

    /// Moves the tree built so far out of the session and resets the session.
    pub fn take_document(&mut self) -> Option<Document> {
        let doc = self.builder.take().map(TreeBuilder::into_document);
        self.reset();
        doc
    }

    /// Finalizes parsing and returns the constructed [`Document`].
    ///
    /// Sends an empty final chunk first if no final chunk has been pushed.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the input is incomplete or malformed.
    pub fn finish(mut self) -> Result<Document, ParseError> {
        if !self.finished {
            self.push(&[], true)?;
        }
        match self.builder.take() {
            Some(builder) => builder.finish(),
            None => TreeBuilder::new().finish(),
        }
    }

    /// Number of input bytes tokenized so far in the current document.
    #[must_use]
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_consumed
    }

    /// Returns `true` once the final chunk has been accepted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Discards all state, keeping the options.
    pub fn reset(&mut self) {
        self.discard();
        self.finished = false;
    }

    fn discard(&mut self) {
        if let Some(mut builder) = self.builder.take() {
            builder.clear();
        }
        self.tokenizer = None;
        self.bytes_consumed = 0;
    }
}

impl Default for PushParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PushParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushParser")
            .field("options", &self.options)
            .field("tokenizer", &self.tokenizer)
            .field("nodes", &self.document().map(Document::node_count))
            .field("bytes_consumed", &self.bytes_consumed)
            .field("finished", &self.finished)
            .finish()
    }
}
