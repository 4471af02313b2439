//! Byte cursor and byte classification shared by the parser and the writer.
//!
//! The cursor holds nothing but the input slice and a position. Line and column
//! numbers are only computed when an error is reported.

use crate::error::{Error, ParseErrorKind};

#[inline]
pub(crate) const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline]
pub(crate) const fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

#[inline]
pub(crate) const fn is_hyphen(b: u8) -> bool {
    b == b'-'
}

/// Space or tab. Newlines are significant in TOML and handled separately.
#[inline]
pub(crate) const fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[inline]
pub(crate) const fn is_newline_start(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

#[inline]
pub(crate) const fn is_escape(b: u8) -> bool {
    b == b'\\'
}

/// ASCII letters, digits, `-` and `_`.
#[inline]
pub(crate) const fn is_bare_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Control characters TOML forbids in strings and comments (tab is allowed).
#[inline]
pub(crate) const fn is_forbidden_control(b: u8) -> bool {
    (b < 0x20 && b != b'\t') || b == 0x7f
}

/// Whether `key` can be written without quotes.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::lexer::is_bare_key;
///
/// assert!(is_bare_key("server-name_2"));
/// assert!(!is_bare_key("a.b"));
/// assert!(!is_bare_key(""));
/// ```
pub fn is_bare_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(is_bare_key_byte)
}

pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    pub(crate) fn advance_by(&mut self, n: usize) {
        self.pos += n;
    }

    #[inline]
    pub(crate) fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub(crate) fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes[self.pos.min(self.bytes.len())..].starts_with(prefix)
    }

    pub(crate) fn eat_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if is_whitespace(b)) {
            self.pos += 1;
        }
    }

    /// Consumes `\n` or `\r\n`.
    pub(crate) fn eat_newline(&mut self) -> bool {
        match self.peek() {
            Some(b'\n') => {
                self.pos += 1;
                true
            }
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                true
            }
            _ => false,
        }
    }

    /// Validates `start..end` as UTF-8, reporting the first bad byte.
    pub(crate) fn str_slice(&self, start: usize, end: usize) -> Result<&'a str, Error> {
        std::str::from_utf8(&self.bytes[start..end])
            .map_err(|e| self.error_at(start + e.valid_up_to(), ParseErrorKind::InvalidUtf8))
    }

    pub(crate) fn error(&self, kind: ParseErrorKind) -> Error {
        self.error_at(self.pos, kind)
    }

    /// Builds a parse error at byte `offset` with 1-based line and column.
    pub(crate) fn error_at(&self, offset: usize, kind: ParseErrorKind) -> Error {
        let offset = offset.min(self.bytes.len());
        let before = &self.bytes[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        // Count characters, not bytes, so columns match what editors show.
        let column = before[line_start..]
            .iter()
            .filter(|&&b| (b & 0xC0) != 0x80)
            .count()
            + 1;
        Error::parse(kind, line, column)
    }

    /// The error for whatever byte sits at the cursor (or end of input).
    pub(crate) fn unexpected(&self) -> Error {
        match self.peek() {
            Some(b) => self.error(ParseErrorKind::UnexpectedByte(b)),
            None => self.error(ParseErrorKind::UnexpectedEof),
        }
    }
}
