//! Error types for tree construction.
//!
//! Every fallible entry point in the crate returns [`ParseError`]. The
//! [`ErrorKind`] carried by the error is enough to tell bad input apart from
//! resource exhaustion and from I/O failure. Errors carry line, column and
//! byte offset information when the tokenizer knows where the problem is.

use std::fmt;

/// Classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input is not well-formed XML, or it ended with open elements.
    WellFormedness,
    /// An allocation failed while growing a node, the arena, or a text buffer.
    NoMemory,
    /// A configured limit (depth, name length, attribute count, ...) was hit.
    LimitExceeded,
    /// Reading the input failed. Only produced at the file boundary.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WellFormedness => write!(f, "not well-formed"),
            Self::NoMemory => write!(f, "out of memory"),
            Self::LimitExceeded => write!(f, "limit exceeded"),
            Self::Io => write!(f, "i/o error"),
        }
    }
}

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl SourceLocation {
    /// The location of the first byte of a document.
    #[must_use]
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            byte_offset: 0,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when building a tree fails.
///
/// A `ParseError` is only ever returned after every partially built node of
/// the failing parse has been released.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// What class of failure this is.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Where in the source the error occurred. `None` for failures that are
    /// not tied to a position (I/O, allocation).
    pub location: Option<SourceLocation>,
}

impl ParseError {
    /// Creates an error of `kind` that is not tied to a source location.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Creates a well-formedness error at `location`.
    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind: ErrorKind::WellFormedness,
            message: message.into(),
            location: Some(location),
        }
    }

    /// Creates a limit error at `location`.
    pub fn limit(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind: ErrorKind::LimitExceeded,
            message: message.into(),
            location: Some(location),
        }
    }

    /// Creates an allocation failure error.
    pub fn no_memory(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoMemory, message)
    }

    /// Returns `true` if the input itself was rejected.
    #[must_use]
    pub fn is_well_formedness(&self) -> bool {
        self.kind == ErrorKind::WellFormedness
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{} at {loc}: {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string())
    }
}

impl From<std::collections::TryReserveError> for ParseError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::no_memory(err.to_string())
    }
}
