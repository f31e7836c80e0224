//! Entity codec for the five predefined XML entities.
//!
//! Converts between the reserved characters `<`, `>`, `'`, `"` and `&` and
//! their named entities `&lt;`, `&gt;`, `&apos;`, `&quot;` and `&amp;`. No
//! other entity or character reference is recognized.
//!
//! Three shapes are offered for each direction:
//!
//! - a length query that never allocates ([`escaped_length`],
//!   [`unescaped_length`]);
//! - a bounded form writing into a caller-supplied buffer ([`escape_into`],
//!   [`unescape_into`], [`unescape_in_place`]);
//! - an owning form ([`escape`], [`unescape`]) and a caller-owned, reusable
//!   scratch buffer ([`EscapeBuffer`]).
//!
//! None of these keep shared state, so all of them may be called from any
//! number of threads at once.
//!
//! # Examples
//!
//! ```
//! use xmldom::escape::{escape, escaped_length, unescape};
//!
//! assert_eq!(escape("<a href='x'>"), "&lt;a href=&apos;x&apos;&gt;");
//! assert_eq!(escaped_length("a&b"), 7);
//! assert_eq!(unescape("&amp;amp;"), "&amp;");
//! ```

use memchr::memchr;

/// `(reserved byte, entity)` pairs.
const ENTITIES: [(u8, &str); 5] = [
    (b'<', "&lt;"),
    (b'>', "&gt;"),
    (b'\'', "&apos;"),
    (b'"', "&quot;"),
    (b'&', "&amp;"),
];

/// Outcome of a bounded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedWrite {
    /// Bytes actually written to the output buffer.
    pub written: usize,
    /// Bytes the complete result needs. Equal to `written` when nothing was
    /// truncated.
    pub required: usize,
}

impl BoundedWrite {
    /// Returns `true` if the whole result fit into the buffer.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.written == self.required
    }
}

/// Returns `true` if `byte` is one of the five characters that [`escape`]
/// replaces.
#[must_use]
pub fn is_escaped(byte: u8) -> bool {
    matches!(byte, b'<' | b'>' | b'\'' | b'"' | b'&')
}

fn entity_for(byte: u8) -> Option<&'static str> {
    ENTITIES
        .iter()
        .find(|(b, _)| *b == byte)
        .map(|(_, entity)| *entity)
}

/// Matches one of the five entities at the start of `input` (which must begin
/// with `&`). Returns the decoded byte and the entity length.
fn match_entity(input: &[u8]) -> Option<(u8, usize)> {
    ENTITIES
        .iter()
        .find(|(_, entity)| input.starts_with(entity.as_bytes()))
        .map(|(b, entity)| (*b, entity.len()))
}

/// Returns the exact length of `escape(text)` without allocating.
#[must_use]
pub fn escaped_length(text: &str) -> usize {
    text.bytes()
        .map(|b| entity_for(b).map_or(1, str::len))
        .sum()
}

/// Escapes `text`, returning a new string.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(escaped_length(text));
    push_escaped(&mut out, text);
    out
}

/// Appends the escaped form of `text` to `out`.
pub(crate) fn push_escaped(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(pos) = rest.bytes().position(is_escaped) {
        out.push_str(&rest[..pos]);
        if let Some(entity) = entity_for(rest.as_bytes()[pos]) {
            out.push_str(entity);
        }
        rest = &rest[pos + 1..];
    }
    out.push_str(rest);
}

/// Escapes `text` into `out`, writing as much as fits.
///
/// Output is produced in whole units: an entity, or one complete UTF-8
/// character. When the next unit does not fit, writing stops, so `out` never
/// ends with a partial entity such as `&l`. The returned
/// [`BoundedWrite::required`] is the length an unbounded buffer would have
/// received; call again with a larger buffer when it exceeds `out.len()`.
///
/// ```
/// use xmldom::escape::escape_into;
///
/// let mut out = [0u8; 10];
/// let res = escape_into("<>'\"&", &mut out);
/// assert_eq!(res.required, 26);
/// assert_eq!(&out[..res.written], b"&lt;&gt;");
/// ```
pub fn escape_into(text: &str, out: &mut [u8]) -> BoundedWrite {
    let mut written = 0;
    let mut required = 0;
    let mut full = false;
    for (i, ch) in text.char_indices() {
        let raw = &text.as_bytes()[i..i + ch.len_utf8()];
        let unit = entity_for(raw[0]).map_or(raw, str::as_bytes);
        required += unit.len();
        if !full {
            if written + unit.len() <= out.len() {
                out[written..written + unit.len()].copy_from_slice(unit);
                written += unit.len();
            } else {
                full = true;
            }
        }
    }
    BoundedWrite { written, required }
}

/// Returns the exact length of `unescape(text)` without allocating.
#[must_use]
pub fn unescaped_length(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut len = 0;
    let mut i = 0;
    while i < bytes.len() {
        match memchr(b'&', &bytes[i..]) {
            Some(off) => {
                len += off;
                i += off;
                i += match_entity(&bytes[i..]).map_or(1, |(_, n)| n);
                len += 1;
            }
            None => {
                len += bytes.len() - i;
                break;
            }
        }
    }
    len
}

/// Replaces the five named entities in `text` with their characters.
///
/// Matching is literal and case-sensitive; an `&` that does not start one of
/// the five entities is kept as is. A single pass is made, so `&amp;amp;`
/// decodes to `&amp;`.
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(unescaped_length(text));
    push_unescaped(&mut out, text);
    out
}

/// Appends the unescaped form of `text` to `out`.
pub(crate) fn push_unescaped(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while let Some(off) = memchr(b'&', &bytes[i..]) {
        out.push_str(&text[i..i + off]);
        i += off;
        match match_entity(&bytes[i..]) {
            Some((b, n)) => {
                out.push(char::from(b));
                i += n;
            }
            None => {
                out.push('&');
                i += 1;
            }
        }
    }
    out.push_str(&text[i..]);
}

/// Unescapes `text` into `out`, writing as much as fits.
///
/// Like [`escape_into`], output is produced in whole units (a decoded
/// character or one complete UTF-8 character) and the returned
/// [`BoundedWrite::required`] is the unbounded length.
pub fn unescape_into(text: &str, out: &mut [u8]) -> BoundedWrite {
    let bytes = text.as_bytes();
    let mut written = 0;
    let mut required = 0;
    let mut full = false;
    let mut i = 0;
    while i < bytes.len() {
        let decoded;
        let unit: &[u8] = if bytes[i] == b'&' {
            if let Some((b, n)) = match_entity(&bytes[i..]) {
                decoded = [b];
                i += n;
                &decoded
            } else {
                i += 1;
                b"&"
            }
        } else {
            let len = utf8_len(bytes[i]);
            let unit = &bytes[i..i + len];
            i += len;
            unit
        };
        required += unit.len();
        if !full {
            if written + unit.len() <= out.len() {
                out[written..written + unit.len()].copy_from_slice(unit);
                written += unit.len();
            } else {
                full = true;
            }
        }
    }
    BoundedWrite { written, required }
}

/// Unescapes `buf` in place and returns the new length.
///
/// The decoded form is never longer than the input, so the output overwrites
/// the input from the front; bytes past the returned length are unspecified.
///
/// ```
/// use xmldom::escape::unescape_in_place;
///
/// let mut buf = *b"&lt;b&gt;";
/// let len = unescape_in_place(&mut buf);
/// assert_eq!(&buf[..len], b"<b>");
/// ```
pub fn unescape_in_place(buf: &mut [u8]) -> usize {
    let mut read = 0;
    let mut write = 0;
    while read < buf.len() {
        if buf[read] == b'&' {
            if let Some((b, n)) = match_entity(&buf[read..]) {
                buf[write] = b;
                write += 1;
                read += n;
                continue;
            }
        }
        buf[write] = buf[read];
        write += 1;
        read += 1;
    }
    write
}

/// Length of the UTF-8 sequence introduced by `lead`.
fn utf8_len(lead: u8) -> usize {
    match lead {
        0xF0..=0xF7 => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

/// A reusable, caller-owned scratch buffer for escaping and unescaping.
///
/// The buffer grows as needed and is reused across calls, so repeated
/// conversions do not allocate once it is large enough. Growth uses fallible
/// reservation: when memory cannot be obtained the call returns `None` and
/// the buffer is left empty.
///
/// ```
/// use xmldom::escape::EscapeBuffer;
///
/// let mut scratch = EscapeBuffer::new();
/// assert_eq!(scratch.escape("a<b"), Some("a&lt;b"));
/// assert_eq!(scratch.unescape("a&lt;b"), Some("a<b"));
/// ```
#[derive(Debug, Default)]
pub struct EscapeBuffer {
    buf: String,
}

impl EscapeBuffer {
    /// Creates an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Creates a scratch buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Escapes `text` into the buffer and returns a view of the result.
    ///
    /// Returns `None` if the buffer could not be grown.
    pub fn escape(&mut self, text: &str) -> Option<&str> {
        self.buf.clear();
        self.buf.try_reserve(escaped_length(text)).ok()?;
        push_escaped(&mut self.buf, text);
        Some(&self.buf)
    }

    /// Unescapes `text` into the buffer and returns a view of the result.
    ///
    /// Returns `None` if the buffer could not be grown.
    pub fn unescape(&mut self, text: &str) -> Option<&str> {
        self.buf.clear();
        self.buf.try_reserve(unescaped_length(text)).ok()?;
        push_unescaped(&mut self.buf, text);
        Some(&self.buf)
    }

    /// Returns the current capacity of the buffer in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}
