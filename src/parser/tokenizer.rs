//! Resumable XML tokenizer.
//!
//! [`Tokenizer`] accepts input in arbitrary byte chunks and fires
//! [`SaxHandler`] events as soon as a construct is complete. Bytes that
//! cannot be interpreted yet (half a tag, a partial reference, an incomplete
//! UTF-8 sequence) are kept until the next [`feed`](Tokenizer::feed).
//!
//! Character data is emitted eagerly, so a text run may reach the handler in
//! several pieces. Each piece is valid UTF-8 with references resolved and
//! line ends normalized.
//!
//! Well-formedness is checked as the input is consumed: tags must nest and
//! match, there must be exactly one root element, only whitespace, comments
//! and processing instructions may surround it, and only the five predefined
//! entities may be referenced. Input must be UTF-8.

use std::fmt;

use memchr::{memchr, memmem, memrchr};

use crate::error::{ParseError, SourceLocation};
use crate::sax::SaxHandler;
use crate::tree::Attribute;

use super::input::{
    check_comment_content, decode_char_data, is_xml_whitespace, parse_pi_content,
    parse_xml_decl, ParserInput,
};
use super::ParseOptions;

const BOM: &[u8] = b"\xEF\xBB\xBF";

const DECLARATIONS: [&[u8]; 3] = [b"<!--", b"<![CDATA[", b"<!DOCTYPE"];

/// Where in the document the tokenizer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Before the root element.
    Prolog,
    /// Inside the root element.
    Content,
    /// Inside a CDATA section.
    Cdata,
    /// After the root element has closed.
    Epilog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Progress,
    NeedMoreInput,
}

/// Line, column and byte offset of the next unconsumed byte.
#[derive(Debug, Clone, Copy)]
struct Position {
    line: u32,
    column: u32,
    offset: usize,
}

impl Position {
    fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    fn advance(&mut self, bytes: &[u8]) {
        self.offset += bytes.len();
        let tail = match memrchr(b'\n', bytes) {
            Some(last) => {
                let lines = memchr::memchr_iter(b'\n', bytes).count();
                self.line = self
                    .line
                    .saturating_add(u32::try_from(lines).unwrap_or(u32::MAX));
                self.column = 1;
                &bytes[last + 1..]
            }
            None => bytes,
        };
        let chars = tail.iter().filter(|&&b| b & 0xC0 != 0x80).count();
        self.column = self
            .column
            .saturating_add(u32::try_from(chars).unwrap_or(u32::MAX));
    }

    fn location(self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.offset,
        }
    }
}

/// A resumable, well-formedness checking XML tokenizer.
///
/// # Examples
///
/// ```
/// use xmldom::parser::tokenizer::Tokenizer;
/// use xmldom::parser::ParseOptions;
/// use xmldom::sax::DefaultHandler;
///
/// let mut tokenizer = Tokenizer::new(ParseOptions::default());
/// tokenizer.feed(b"<root><chi", false, &mut DefaultHandler).unwrap();
/// tokenizer.feed(b"ld/></root>", true, &mut DefaultHandler).unwrap();
/// assert!(tokenizer.is_finished());
/// ```
pub struct Tokenizer {
    options: ParseOptions,
    buf: Vec<u8>,
    pos: usize,
    position: Position,
    mode: Mode,
    open: Vec<String>,
    text_run: usize,
    scratch: String,
    decl_allowed: bool,
    seen_doctype: bool,
    finished: bool,
}

impl Tokenizer {
    /// Creates a tokenizer that enforces the limits in `options`.
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            buf: Vec::new(),
            pos: 0,
            position: Position::start(),
            mode: Mode::Prolog,
            open: Vec::new(),
            text_run: 0,
            scratch: String::new(),
            decl_allowed: true,
            seen_doctype: false,
            finished: false,
        }
    }

    /// Feeds the next chunk of input.
    ///
    /// Set `is_final` on the last chunk; the tokenizer then reports input
    /// that ends inside a construct or with open elements. After the final
    /// chunk, or after any error, the tokenizer accepts no more input.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is malformed, exceeds a configured
    /// limit, or if a handler callback fails.
    pub fn feed(
        &mut self,
        data: &[u8],
        is_final: bool,
        handler: &mut dyn SaxHandler,
    ) -> Result<(), ParseError> {
        if self.finished {
            return Err(ParseError::syntax(
                "input fed after parsing finished",
                self.position.location(),
            ));
        }
        let result = self.run(data, is_final, handler);
        if is_final || result.is_err() {
            self.finished = true;
            self.buf = Vec::new();
            self.pos = 0;
            self.scratch = String::new();
        } else {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        result
    }

    /// Returns `true` once the final chunk has been processed or an error
    /// occurred.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of input bytes consumed so far. Bytes held back for the next
    /// chunk are not counted.
    #[must_use]
    pub fn bytes_consumed(&self) -> usize {
        self.position.offset
    }

    /// Location of the next unconsumed byte.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.position.location()
    }

    /// Current element nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn run(
        &mut self,
        data: &[u8],
        is_final: bool,
        handler: &mut dyn SaxHandler,
    ) -> Result<(), ParseError> {
        self.buf.try_reserve(data.len())?;
        self.buf.extend_from_slice(data);

        loop {
            let step = match self.mode {
                Mode::Prolog | Mode::Epilog => self.step_misc(is_final, handler)?,
                Mode::Content => self.step_content(is_final, handler)?,
                Mode::Cdata => self.step_cdata(is_final, handler)?,
            };
            if step == Step::NeedMoreInput {
                break;
            }
        }

        if is_final {
            self.check_complete()?;
        }
        Ok(())
    }

    fn check_complete(&self) -> Result<(), ParseError> {
        if self.pos < self.buf.len() {
            return Err(self.error("unexpected end of input"));
        }
        match self.mode {
            Mode::Epilog => Ok(()),
            Mode::Prolog => Err(self.error("no root element")),
            Mode::Cdata => Err(self.error("unterminated CDATA section")),
            Mode::Content => {
                let name = self.open.last().map_or("", String::as_str);
                Err(self.error(format!("unclosed element <{name}>")))
            }
        }
    }

    // -- Input helpers --

    fn rest(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    fn consume(&mut self, count: usize) {
        self.position.advance(&self.buf[self.pos..self.pos + count]);
        self.pos += count;
        self.decl_allowed = false;
    }

    /// Location `skip` bytes past the next unconsumed byte.
    fn origin(&self, skip: usize) -> SourceLocation {
        let mut position = self.position;
        position.advance(&self.buf[self.pos..self.pos + skip]);
        position.location()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, self.position.location())
    }

    fn utf8<'b>(&self, bytes: &'b [u8], skip: usize) -> Result<&'b str, ParseError> {
        std::str::from_utf8(bytes).map_err(|e| {
            let mut position = self.position;
            position.advance(&self.buf[self.pos..self.pos + skip + e.valid_up_to()]);
            ParseError::syntax("invalid UTF-8", position.location())
        })
    }

    fn pending_markup(&self) -> Result<Step, ParseError> {
        let limit = self
            .options
            .max_text_length
            .saturating_add(self.options.max_attribute_length);
        if self.rest().len() > limit {
            return Err(ParseError::limit(
                format!("unterminated markup longer than {limit} bytes"),
                self.position.location(),
            ));
        }
        Ok(Step::NeedMoreInput)
    }

    fn add_text_run(&mut self, len: usize) -> Result<(), ParseError> {
        self.text_run = self.text_run.saturating_add(len);
        if self.text_run > self.options.max_text_length {
            return Err(ParseError::limit(
                format!(
                    "text length exceeds maximum ({})",
                    self.options.max_text_length
                ),
                self.position.location(),
            ));
        }
        Ok(())
    }

    // -- Steps --

    fn step_misc(&mut self, is_final: bool, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        let rest = self.rest();
        if self.position.offset == 0 && self.decl_allowed {
            if rest.starts_with(BOM) {
                self.consume(BOM.len());
                self.decl_allowed = true;
                return Ok(Step::Progress);
            }
            if !is_final && !rest.is_empty() && BOM.starts_with(rest) {
                return Ok(Step::NeedMoreInput);
            }
        }

        let ws = rest.iter().take_while(|&&b| is_xml_whitespace(b)).count();
        if ws > 0 {
            self.consume(ws);
            return Ok(Step::Progress);
        }
        match rest.first() {
            None => Ok(Step::NeedMoreInput),
            Some(b'<') => self.step_markup(handler),
            Some(_) => Err(self.error("text is not allowed outside the root element")),
        }
    }

    fn step_content(&mut self, is_final: bool, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        let rest = self.rest();
        if rest.first() == Some(&b'<') {
            return self.step_markup(handler);
        }

        let len = match memchr(b'<', rest) {
            Some(lt) => lt,
            None if is_final => rest.len(),
            None => held_back_text_len(rest),
        };
        if len == 0 {
            return Ok(Step::NeedMoreInput);
        }
        self.add_text_run(len)?;

        self.scratch.clear();
        let text = self.utf8(&self.buf[self.pos..self.pos + len], 0)?;
        decode_char_data(text, self.position.location(), true, &mut self.scratch)?;
        log::trace!(target: "xmldom.tokenizer", "characters: {} bytes", self.scratch.len());
        handler.characters(&self.scratch)?;
        self.consume(len);
        Ok(Step::Progress)
    }

    fn step_cdata(&mut self, is_final: bool, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        let rest = self.rest();
        let (len, closed) = match memmem::find(rest, b"]]>") {
            Some(end) => (end, true),
            None if is_final => return Ok(Step::NeedMoreInput),
            None => (held_back_cdata_len(rest), false),
        };
        if len == 0 && !closed {
            return Ok(Step::NeedMoreInput);
        }

        if len > 0 {
            self.add_text_run(len)?;
            self.scratch.clear();
            let text = self.utf8(&self.buf[self.pos..self.pos + len], 0)?;
            decode_char_data(text, self.position.location(), false, &mut self.scratch)?;
            log::trace!(target: "xmldom.tokenizer", "cdata characters: {} bytes", self.scratch.len());
            handler.characters(&self.scratch)?;
            self.consume(len);
        }
        if closed {
            log::trace!(target: "xmldom.tokenizer", "cdata end");
            handler.end_cdata()?;
            self.consume(3);
            self.mode = Mode::Content;
        }
        Ok(Step::Progress)
    }

    fn step_markup(&mut self, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        let rest = self.rest();
        let Some(&second) = rest.get(1) else {
            return Ok(Step::NeedMoreInput);
        };
        match second {
            b'?' => self.processing_instruction(handler),
            b'/' => self.end_tag(handler),
            b'!' => {
                if rest.starts_with(b"<!--") {
                    self.comment(handler)
                } else if rest.starts_with(b"<![CDATA[") {
                    self.start_cdata(handler)
                } else if rest.starts_with(b"<!DOCTYPE") {
                    self.doctype()
                } else if DECLARATIONS.iter().any(|keyword| keyword.starts_with(rest)) {
                    Ok(Step::NeedMoreInput)
                } else {
                    Err(self.error("unsupported markup declaration"))
                }
            }
            _ => self.start_tag(handler),
        }
    }

    fn start_tag(&mut self, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        if self.mode == Mode::Epilog {
            return Err(self.error("junk after document element: multiple root elements"));
        }
        let rest = self.rest();
        let Some(gt) = find_tag_end(rest) else {
            return self.pending_markup();
        };
        let body = self.utf8(&rest[1..gt], 1)?;
        let (body, self_closing) = match body.strip_suffix('/') {
            Some(body) => (body, true),
            None => (body, false),
        };

        let mut input = ParserInput::new(body, self.origin(1), self.options.max_name_length);
        let name = input.parse_name()?.to_string();
        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            let had_ws = input.skip_whitespace();
            if input.at_end() {
                break;
            }
            if !had_ws {
                return Err(input.fatal("whitespace required between attributes"));
            }
            let attr_start = input.location();
            let attr_name = input.parse_name()?;
            input.skip_whitespace();
            input.expect_byte(b'=')?;
            input.skip_whitespace();
            let value = input.parse_attribute_value(self.options.max_attribute_length)?;

            if attributes.iter().any(|a| a.name == attr_name) {
                return Err(ParseError::syntax(
                    format!("duplicate attribute '{attr_name}'"),
                    attr_start,
                ));
            }
            if attributes.len() >= self.options.max_attributes as usize {
                return Err(ParseError::limit(
                    format!(
                        "attribute count exceeds maximum ({})",
                        self.options.max_attributes
                    ),
                    attr_start,
                ));
            }
            attributes.try_reserve(1)?;
            attributes.push(Attribute::new(attr_name, value));
        }

        if self.open.len() >= self.options.max_depth as usize {
            return Err(ParseError::limit(
                format!(
                    "maximum nesting depth exceeded ({})",
                    self.options.max_depth
                ),
                self.position.location(),
            ));
        }

        self.consume(gt + 1);
        self.text_run = 0;
        log::trace!(
            target: "xmldom.tokenizer",
            "start element <{name}> ({} attributes{})",
            attributes.len(),
            if self_closing { ", empty" } else { "" }
        );
        handler.start_element(&name, attributes)?;
        if self_closing {
            handler.end_element(&name)?;
            self.mode = if self.open.is_empty() {
                Mode::Epilog
            } else {
                Mode::Content
            };
        } else {
            self.open.try_reserve(1)?;
            self.open.push(name);
            self.mode = Mode::Content;
        }
        Ok(Step::Progress)
    }

    fn end_tag(&mut self, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        if self.mode != Mode::Content {
            return Err(self.error("end tag outside the root element"));
        }
        let rest = self.rest();
        let Some(gt) = memchr(b'>', rest) else {
            return self.pending_markup();
        };
        let body = self.utf8(&rest[2..gt], 2)?;
        let mut input = ParserInput::new(body, self.origin(2), self.options.max_name_length);
        let name = input.parse_name()?;
        input.skip_whitespace();
        if !input.at_end() {
            return Err(input.fatal("unexpected content in end tag"));
        }
        let expected = self.open.last().map_or("", String::as_str);
        if name != expected {
            return Err(self.error(format!(
                "mismatched end tag: expected </{expected}>, found </{name}>"
            )));
        }

        log::trace!(target: "xmldom.tokenizer", "end element </{name}>");
        handler.end_element(name)?;
        self.consume(gt + 1);
        self.open.pop();
        self.text_run = 0;
        if self.open.is_empty() {
            self.mode = Mode::Epilog;
        }
        Ok(Step::Progress)
    }

    fn start_cdata(&mut self, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        if self.mode != Mode::Content {
            return Err(self.error("CDATA section outside the root element"));
        }
        log::trace!(target: "xmldom.tokenizer", "cdata start");
        handler.start_cdata()?;
        self.consume(b"<![CDATA[".len());
        self.mode = Mode::Cdata;
        Ok(Step::Progress)
    }

    fn comment(&mut self, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        let rest = self.rest();
        let Some(end) = memmem::find(&rest[4..], b"-->") else {
            return self.pending_markup();
        };
        let body = self.utf8(&rest[4..4 + end], 4)?;
        check_comment_content(body, self.origin(4))?;
        if body.ends_with('-') {
            return Err(self.error("comment must not end with '-'"));
        }
        handler.comment(body)?;
        self.consume(4 + end + 3);
        Ok(Step::Progress)
    }

    fn processing_instruction(&mut self, handler: &mut dyn SaxHandler) -> Result<Step, ParseError> {
        let rest = self.rest();
        let Some(end) = memmem::find(&rest[2..], b"?>") else {
            return self.pending_markup();
        };
        let body = self.utf8(&rest[2..2 + end], 2)?;

        let is_decl = body
            .strip_prefix("xml")
            .is_some_and(|after| after.bytes().next().map_or(true, is_xml_whitespace));
        if is_decl {
            if !self.decl_allowed {
                return Err(self.error("XML declaration allowed only at the start of the document"));
            }
            let decl = parse_xml_decl(&body[3..], self.origin(5))?;
            if let Some(encoding) = &decl.encoding {
                if !is_utf8_compatible(encoding) {
                    return Err(self.error(format!("unsupported encoding '{encoding}'")));
                }
            }
            log::debug!(
                target: "xmldom.tokenizer",
                "XML declaration: version {}, encoding {:?}, standalone {:?}",
                decl.version,
                decl.encoding,
                decl.standalone
            );
        } else {
            let (target, data) =
                parse_pi_content(body, self.origin(2), self.options.max_name_length)?;
            handler.processing_instruction(target, data)?;
        }
        self.consume(2 + end + 2);
        Ok(Step::Progress)
    }

    fn doctype(&mut self) -> Result<Step, ParseError> {
        if self.mode != Mode::Prolog || self.seen_doctype {
            return Err(self.error("unexpected document type declaration"));
        }
        let rest = self.rest();
        let Some(gt) = find_doctype_end(rest) else {
            return self.pending_markup();
        };
        log::debug!(target: "xmldom.tokenizer", "skipping document type declaration");
        self.consume(gt + 1);
        self.seen_doctype = true;
        Ok(Step::Progress)
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("mode", &self.mode)
            .field("depth", &self.open.len())
            .field("buffered", &(self.buf.len() - self.pos))
            .field("bytes_consumed", &self.position.offset)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

fn is_utf8_compatible(encoding: &str) -> bool {
    ["UTF-8", "UTF8", "US-ASCII", "ASCII"]
        .iter()
        .any(|e| e.eq_ignore_ascii_case(encoding))
}

/// Finds the `>` that ends a start tag, skipping quoted attribute values.
fn find_tag_end(bytes: &[u8]) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(1) {
        match (quote, b) {
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Finds the `>` that ends a document type declaration, skipping quoted
/// literals and the internal subset.
fn find_doctype_end(bytes: &[u8]) -> Option<usize> {
    let mut quote = None;
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if q == b => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'[') => depth += 1,
            (None, b']') => depth = depth.saturating_sub(1),
            (None, b'>') if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Length of the prefix of a text run that can be decoded now, holding back
/// anything the next chunk could change the meaning of: an unterminated
/// reference, a trailing `]` (start of `]]>`), a trailing CR (start of CRLF),
/// or an incomplete UTF-8 sequence.
fn held_back_text_len(bytes: &[u8]) -> usize {
    let mut len = bytes.len();
    if let Some(amp) = memrchr(b'&', bytes) {
        if memchr(b';', &bytes[amp..]).is_none() {
            len = amp;
        }
    }
    while len > 0 && matches!(bytes[len - 1], b']' | b'\r') {
        len -= 1;
    }
    complete_utf8_len(&bytes[..len])
}

/// Like [`held_back_text_len`] for CDATA content, where references are not
/// recognized.
fn held_back_cdata_len(bytes: &[u8]) -> usize {
    let mut len = bytes.len();
    while len > 0 && matches!(bytes[len - 1], b']' | b'\r') {
        len -= 1;
    }
    complete_utf8_len(&bytes[..len])
}

/// Length of `bytes` without a trailing incomplete UTF-8 sequence.
fn complete_utf8_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let b = bytes[len - back];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let width = match b {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return len,
        };
        return if back < width { len - back } else { len };
    }
    len
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sax::DefaultHandler;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TextCollector {
        pieces: Vec<String>,
        elements: Vec<String>,
    }

    impl SaxHandler for TextCollector {
        fn start_element(&mut self, name: &str, _attributes: Vec<Attribute>) -> Result<(), ParseError> {
            self.elements.push(name.to_string());
            Ok(())
        }

        fn characters(&mut self, text: &str) -> Result<(), ParseError> {
            self.pieces.push(text.to_string());
            Ok(())
        }
    }

    fn check(input: &str) -> Result<(), ParseError> {
        Tokenizer::new(ParseOptions::default()).feed(input.as_bytes(), true, &mut DefaultHandler)
    }

    fn feed_bytewise(input: &[u8]) -> Result<TextCollector, ParseError> {
        let mut tokenizer = Tokenizer::new(ParseOptions::default());
        let mut handler = TextCollector::default();
        for &b in input {
            tokenizer.feed(&[b], false, &mut handler)?;
        }
        tokenizer.feed(&[], true, &mut handler)?;
        Ok(handler)
    }

    #[test]
    fn test_well_formed_documents() {
        for input in [
            "<a/>",
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<a/>\n",
            "\u{FEFF}<a/>",
            "<!-- lead --><a><b/><c>t</c></a><!-- trail --><?pi x?>",
            "<a x='1' y=\"2\"  >text</a  >",
            "<a><![CDATA[ <not> &markup; ]]></a>",
        ] {
            assert!(check(input).is_ok(), "should accept {input:?}");
        }
    }

    #[test]
    fn test_malformed_documents() {
        for input in [
            "",
            "   ",
            "<a>",
            "<a><b></a>",
            "<a></b>",
            "<a/><b/>",
            "text<a/>",
            "<a/>text",
            "<a x=1/>",
            "<a x='1' x='2'/>",
            "<a>&nbsp;</a>",
            "<a>]]></a>",
            "<a><!-- -- --></a>",
            "<a/><?xml version=\"1.0\"?>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a/>",
            "</a>",
            "<a><![CDATA[open</a>",
            "<a",
        ] {
            let err = check(input).unwrap_err();
            assert_eq!(err.kind, ErrorKind::WellFormedness, "input {input:?}: {err}");
        }
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = Tokenizer::new(ParseOptions::default())
            .feed(b"<a>\xFF\xFE</a>", true, &mut DefaultHandler)
            .unwrap_err();
        assert!(err.message.contains("UTF-8"));
    }

    #[test]
    fn test_error_location() {
        let err = check("<a>\n  <b></c>\n</a>").unwrap_err();
        let loc = err.location.unwrap();
        assert_eq!((loc.line, loc.column), (2, 6));
    }

    #[test]
    fn test_bytewise_feed_matches_whole() {
        let input = "<r a=\"x &amp; y\">caf\u{e9} &lt;\r\n<![CDATA[a]b]]c]]>]</r>";
        let handler = feed_bytewise(input.as_bytes()).unwrap();
        assert_eq!(handler.elements, vec!["r"]);
        assert_eq!(handler.pieces.concat(), "caf\u{e9} <\na]b]]c]");
        for piece in &handler.pieces {
            assert!(!piece.is_empty());
        }
    }

    #[test]
    fn test_bytewise_feed_detects_errors() {
        assert!(feed_bytewise(b"<a>x]]>y</a>").is_err());
        assert!(feed_bytewise(b"<a><b></a>").is_err());
        assert!(feed_bytewise(b"<a>").is_err());
    }

    #[test]
    fn test_feed_after_finish_is_error() {
        let mut tokenizer = Tokenizer::new(ParseOptions::default());
        tokenizer.feed(b"<a/>", true, &mut DefaultHandler).unwrap();
        assert!(tokenizer.is_finished());
        assert!(tokenizer.feed(b"<b/>", true, &mut DefaultHandler).is_err());
    }

    #[test]
    fn test_bytes_consumed_excludes_held_back_input() {
        let mut tokenizer = Tokenizer::new(ParseOptions::default());
        tokenizer.feed(b"<a>x<b", false, &mut DefaultHandler).unwrap();
        assert_eq!(tokenizer.bytes_consumed(), 4);
        assert_eq!(tokenizer.depth(), 1);
        tokenizer.feed(b"/></a>", true, &mut DefaultHandler).unwrap();
        assert_eq!(tokenizer.bytes_consumed(), 12);
    }

    #[test]
    fn test_depth_limit() {
        let options = ParseOptions::default().max_depth(3);
        let mut tokenizer = Tokenizer::new(options);
        let err = tokenizer
            .feed(b"<a><b><c><d/></c></b></a>", true, &mut DefaultHandler)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::LimitExceeded);
    }

    #[test]
    fn test_attribute_count_limit() {
        let options = ParseOptions::default().max_attributes(2);
        let err = Tokenizer::new(options)
            .feed(b"<a x='1' y='2' z='3'/>", true, &mut DefaultHandler)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::LimitExceeded);
    }

    #[test]
    fn test_text_length_limit() {
        let options = ParseOptions::default().max_text_length(8);
        let mut tokenizer = Tokenizer::new(options);
        tokenizer.feed(b"<a>12345", false, &mut DefaultHandler).unwrap();
        let err = tokenizer
            .feed(b"67890</a>", true, &mut DefaultHandler)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::LimitExceeded);
    }

    #[test]
    fn test_complete_utf8_len() {
        let e_acute = "\u{e9}".as_bytes();
        assert_eq!(complete_utf8_len(b"abc"), 3);
        assert_eq!(complete_utf8_len(&e_acute[..1]), 0);
        assert_eq!(complete_utf8_len(e_acute), 2);
        let snowman = "x\u{2603}".as_bytes();
        assert_eq!(complete_utf8_len(&snowman[..3]), 1);
        assert_eq!(complete_utf8_len(snowman), 4);
    }

    #[test]
    fn test_held_back_text_len() {
        assert_eq!(held_back_text_len(b"abc &am"), 4);
        assert_eq!(held_back_text_len(b"abc &amp; d"), 11);
        assert_eq!(held_back_text_len(b"abc]]"), 3);
        assert_eq!(held_back_text_len(b"line\r"), 4);
    }

    #[test]
    fn test_find_tag_end_skips_quotes() {
        assert_eq!(find_tag_end(b"<a x='>' y=\">\">rest"), Some(15));
        assert_eq!(find_tag_end(b"<a x='>"), None);
    }

    #[test]
    fn test_find_doctype_end() {
        let doctype = b"<!DOCTYPE a [<!ENTITY e \">\">]>";
        assert_eq!(find_doctype_end(doctype), Some(doctype.len() - 1));
        assert_eq!(find_doctype_end(b"<!DOCTYPE a ["), None);
    }
}
