//! Low-level scanning of complete markup tokens.
//!
//! The tokenizer isolates one complete token at a time (a start tag, an end
//! tag, a run of character data, ...) and hands its text to a
//! [`ParserInput`], which tracks line and column from the token's origin and
//! provides the primitives for names, references and attribute values.
//!
//! # Security
//!
//! Only the five predefined entities and character references are resolved.
//! No external entity loading is performed. Name and attribute lengths are
//! bounded by [`ParseOptions`](super::ParseOptions).

use crate::error::{ParseError, SourceLocation};

// -------------------------------------------------------------------------
// Limit defaults
// -------------------------------------------------------------------------
//
// Every limit is off by default: any well-formed document parses, however
// deep or large. Callers handling untrusted input opt in through
// `ParseOptions`.

/// Default maximum element nesting depth (unlimited).
pub(crate) const DEFAULT_MAX_DEPTH: u32 = u32::MAX;

/// Default maximum number of attributes on a single element (unlimited).
pub(crate) const DEFAULT_MAX_ATTRIBUTES: u32 = u32::MAX;

/// Default maximum length (in bytes) of an attribute value (unlimited).
pub(crate) const DEFAULT_MAX_ATTRIBUTE_LENGTH: usize = usize::MAX;

/// Default maximum length (in bytes) of a text run (unlimited).
pub(crate) const DEFAULT_MAX_TEXT_LENGTH: usize = usize::MAX;

/// Default maximum length (in bytes) of an element or attribute name
/// (unlimited).
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = usize::MAX;

// -------------------------------------------------------------------------
// XML character classes (XML 1.0 §2.2, §2.3)
// -------------------------------------------------------------------------

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Returns `true` for the four XML whitespace bytes.
pub(crate) fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Cursor over the text of one complete token.
pub(crate) struct ParserInput<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    origin_offset: usize,
    max_name_length: usize,
}

impl<'a> ParserInput<'a> {
    /// Creates a cursor over `input`, whose first byte sits at `origin`.
    pub fn new(input: &'a str, origin: SourceLocation, max_name_length: usize) -> Self {
        Self {
            input,
            pos: 0,
            line: origin.line,
            column: origin.column,
            origin_offset: origin.byte_offset,
            max_name_length,
        }
    }

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.origin_offset + self.pos,
        }
    }

    /// Returns `true` when every byte has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the unconsumed text.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Returns the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the next character without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Advances by one character, updating line/column.
    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Advances over `count` bytes of ASCII text.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek_char() {
                Some(ch) => self.advance_char(ch),
                None => break,
            }
        }
    }

    /// Consumes and returns the next character with line-end normalization
    /// (XML 1.0 §2.11) and character validation (XML 1.0 §2.2).
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance_char('\n');
            }
            return Ok('\n');
        }
        Ok(ch)
    }

    /// Consumes the next byte and asserts it matches `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(_) => {
                let found = self.peek_char().unwrap_or('?');
                Err(self.fatal(format!(
                    "expected '{}', found '{found}'",
                    char::from(expected)
                )))
            }
            None => Err(self.fatal(format!(
                "expected '{}', found end of input",
                char::from(expected)
            ))),
        }
    }

    /// Consumes bytes and asserts they match the `expected` sequence.
    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    /// Returns `true` if the unconsumed input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.remaining().as_bytes().starts_with(s)
    }

    /// Skips whitespace, returning `true` if any was skipped.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_xml_whitespace) {
            self.advance(1);
        }
        self.pos > start
    }

    /// Skips whitespace, failing if there is none.
    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if self.skip_whitespace() {
            Ok(())
        } else {
            Err(self.fatal("whitespace required"))
        }
    }

    /// Parses an XML `Name` (XML 1.0 §2.3 `[5]`).
    pub fn parse_name(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);

        while let Some(ch) = self.peek_char() {
            if !is_name_char(ch) {
                break;
            }
            self.advance_char(ch);
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(ParseError::limit(
                format!(
                    "name length ({len}) exceeds maximum ({})",
                    self.max_name_length
                ),
                self.location(),
            ));
        }
        Ok(&self.input[start..self.pos])
    }

    /// Parses an entity or character reference (`&...;`) and appends its
    /// replacement text to `out`.
    ///
    /// Only the five predefined entities are known; any other name is an
    /// error.
    pub fn parse_reference(&mut self, out: &mut String) -> Result<(), ParseError> {
        let start = self.location();
        self.expect_byte(b'&')?;

        if self.peek() == Some(b'#') {
            self.advance(1);
            let (digits, radix) = if self.peek() == Some(b'x') {
                self.advance(1);
                (self.take_while(|b| b.is_ascii_hexdigit()), 16)
            } else {
                (self.take_while(|b| b.is_ascii_digit()), 10)
            };
            if digits.is_empty() {
                return Err(self.fatal("empty character reference"));
            }
            self.expect_byte(b';')?;

            let ch = u32::from_str_radix(digits, radix)
                .ok()
                .and_then(char::from_u32)
                .filter(|&c| is_xml_char(c))
                .ok_or_else(|| {
                    ParseError::syntax(
                        format!("character reference '{digits}' is not a valid XML character"),
                        start,
                    )
                })?;
            out.try_reserve(ch.len_utf8())?;
            out.push(ch);
            return Ok(());
        }

        let name = self.parse_name()?;
        self.expect_byte(b';')?;
        let replacement = match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "apos" => '\'',
            "quot" => '"',
            _ => {
                return Err(ParseError::syntax(
                    format!("undefined entity: &{name};"),
                    start,
                ))
            }
        };
        out.try_reserve(1)?;
        out.push(replacement);
        Ok(())
    }

    /// Parses a quoted attribute value with reference resolution and
    /// whitespace normalization (XML 1.0 §3.3.3).
    pub fn parse_attribute_value(&mut self, max_length: usize) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fatal("attribute value must be quoted")),
        };
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    break;
                }
                Some(b'&') => self.parse_reference(&mut value)?,
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(_) => {
                    let ch = match self.next_char()? {
                        '\n' | '\t' => ' ',
                        ch => ch,
                    };
                    value.try_reserve(ch.len_utf8())?;
                    value.push(ch);
                }
            }
            if value.len() > max_length {
                return Err(ParseError::limit(
                    format!("attribute value exceeds maximum length ({max_length})"),
                    self.location(),
                ));
            }
        }
        Ok(value)
    }

    /// Parses a quoted value without reference resolution.
    pub fn parse_quoted_value(&mut self) -> Result<&'a str, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fatal("expected quoted value")),
        };
        self.advance(1);
        let start = self.pos;
        let len = memchr::memchr(quote, self.remaining().as_bytes())
            .ok_or_else(|| self.fatal("unterminated quoted value"))?;
        let value = &self.input[start..start + len];
        for ch in value.chars() {
            self.advance_char(ch);
        }
        self.advance(1);
        Ok(value)
    }

    /// Creates a well-formedness error at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, self.location())
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance(1);
        }
        &self.input[start..self.pos]
    }
}

/// Decodes a run of character data: resolves references, normalizes line
/// ends and validates characters. Appends the result to `out`.
pub(crate) fn decode_char_data(
    text: &str,
    origin: SourceLocation,
    resolve_references: bool,
    out: &mut String,
) -> Result<(), ParseError> {
    if resolve_references {
        if let Some(at) = memchr::memmem::find(text.as_bytes(), b"]]>") {
            let mut input = ParserInput::new(text, origin, usize::MAX);
            for ch in text[..at].chars() {
                input.advance_char(ch);
            }
            return Err(input.fatal("']]>' not allowed in character data"));
        }
    }

    // Fast path: nothing to rewrite.
    let special = if resolve_references {
        memchr::memchr2(b'&', b'\r', text.as_bytes())
    } else {
        memchr::memchr(b'\r', text.as_bytes())
    };
    if special.is_none() && text.chars().all(is_xml_char) {
        out.try_reserve(text.len())?;
        out.push_str(text);
        return Ok(());
    }

    out.try_reserve(text.len())?;
    let mut input = ParserInput::new(text, origin, usize::MAX);
    while let Some(b) = input.peek() {
        if b == b'&' && resolve_references {
            input.parse_reference(out)?;
        } else {
            let ch = input.next_char()?;
            out.push(ch);
        }
    }
    Ok(())
}

/// Parses an XML comment body (`<!--` already stripped, `-->` excluded).
pub(crate) fn check_comment_content(
    body: &str,
    origin: SourceLocation,
) -> Result<(), ParseError> {
    let mut input = ParserInput::new(body, origin, usize::MAX);
    while !input.at_end() {
        if input.looking_at(b"--") {
            return Err(input.fatal("'--' not allowed inside comments"));
        }
        input.next_char()?;
    }
    Ok(())
}

/// Parses a processing instruction body (`<?` already stripped, `?>`
/// excluded), returning `(target, data)`.
pub(crate) fn parse_pi_content(
    body: &str,
    origin: SourceLocation,
    max_name_length: usize,
) -> Result<(&str, Option<&str>), ParseError> {
    let mut input = ParserInput::new(body, origin, max_name_length);
    let target = input.parse_name()?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(input.fatal("PI target 'xml' is reserved"));
    }
    if input.at_end() {
        return Ok((target, None));
    }
    input.skip_whitespace_required()?;
    let data = input.remaining();
    while !input.at_end() {
        input.next_char()?;
    }
    Ok((target, (!data.is_empty()).then_some(data)))
}

/// Parsed XML declaration data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlDeclaration {
    /// XML version (e.g. `"1.0"`).
    pub version: String,
    /// Optional encoding declaration.
    pub encoding: Option<String>,
    /// Optional standalone declaration.
    pub standalone: Option<bool>,
}

/// Parses an XML declaration body (`<?xml` already stripped, `?>`
/// excluded).
///
/// See XML 1.0 §2.8 production `[23]`.
pub(crate) fn parse_xml_decl(
    body: &str,
    origin: SourceLocation,
) -> Result<XmlDeclaration, ParseError> {
    let mut input = ParserInput::new(body, origin, usize::MAX);
    input.skip_whitespace_required()?;

    input.expect_str(b"version")?;
    input.skip_whitespace();
    input.expect_byte(b'=')?;
    input.skip_whitespace();
    let version = input.parse_quoted_value()?;
    if !is_valid_version_num(version) {
        return Err(input.fatal(format!("invalid version number: '{version}'")));
    }

    let had_ws = input.skip_whitespace();
    let encoding = if input.looking_at(b"encoding") {
        if !had_ws {
            return Err(input.fatal("whitespace required before encoding"));
        }
        input.expect_str(b"encoding")?;
        input.skip_whitespace();
        input.expect_byte(b'=')?;
        input.skip_whitespace();
        let enc = input.parse_quoted_value()?;
        if !is_valid_encoding_name(enc) {
            return Err(input.fatal(format!("invalid encoding name: '{enc}'")));
        }
        Some(enc.to_string())
    } else {
        None
    };

    let had_ws2 = input.skip_whitespace() || (encoding.is_none() && had_ws);
    let standalone = if input.looking_at(b"standalone") {
        if !had_ws2 {
            return Err(input.fatal("whitespace required before standalone"));
        }
        input.expect_str(b"standalone")?;
        input.skip_whitespace();
        input.expect_byte(b'=')?;
        input.skip_whitespace();
        match input.parse_quoted_value()? {
            "yes" => Some(true),
            "no" => Some(false),
            _ => return Err(input.fatal("standalone must be 'yes' or 'no'")),
        }
    } else {
        None
    };

    input.skip_whitespace();
    if !input.at_end() {
        return Err(input.fatal("unexpected content in XML declaration"));
    }

    Ok(XmlDeclaration {
        version: version.to_string(),
        encoding,
        standalone,
    })
}

/// `VersionNum ::= '1.' [0-9]+`
fn is_valid_version_num(s: &str) -> bool {
    s.strip_prefix("1.")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_valid_encoding_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            first.is_ascii_alphabetic()
                && rest
                    .iter()
                    .all(|&b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
        }
        None => false,
    }
}
