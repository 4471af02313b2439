//! TOML parser.
//!
//! Turns source bytes into a [`TomlMap`]. Parsing is single pass and stops at
//! the first error, which carries the line and column of the offending byte.
//!
//! Tables are collected in a builder tree that remembers how each table came to
//! exist, because that decides which later statements may touch it:
//!
//! | Origin                        | Extended by dotted keys | Reopened by `[header]` |
//! |-------------------------------|-------------------------|------------------------|
//! | implicit (`[a.b]` creates `a`) | yes                    | yes, once              |
//! | dotted (`a.b = 1` creates `a`) | yes                    | yes, once; existing keys are sealed |
//! | header (`[a]`)                 | only from its own section | no                  |
//! | inline (`a = {…}`)             | no                     | no                     |
//! | array of tables (`[[a]]`)      | no                     | no; `[[a]]` appends    |

use crate::datetime::{looks_temporal, scan_temporal};
use crate::error::{Error, ParseErrorKind, Result};
use crate::lexer::{
    is_bare_key_byte, is_digit, is_escape, is_forbidden_control, is_hex_digit, is_newline_start,
    is_whitespace, Cursor,
};
use crate::{TomlMap, TomlValue};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// Parses a whole document.
pub(crate) fn parse_document(input: &[u8]) -> Result<TomlMap> {
    debug!(bytes = input.len(), "parsing TOML document");
    let mut parser = Parser::new(input);
    parser.skip_bom();
    parser.parse_statements()?;
    let map = parser.root.into_map(false);
    debug!(keys = map.len(), "parsed TOML document");
    Ok(map)
}

/// Parses one standalone value, surrounded by optional whitespace.
pub(crate) fn parse_value(input: &[u8]) -> Result<TomlValue> {
    let mut parser = Parser::new(input);
    parser.cursor.eat_whitespace();
    let value = parser.parse_value()?;
    parser.cursor.eat_whitespace();
    parser.end_of_statement()?;
    parser.skip_trivia()?;
    if !parser.cursor.at_end() {
        return Err(parser.cursor.unexpected());
    }
    Ok(value)
}

/// A dotted key after quote removal, with the byte offset where it started.
struct KeyPath {
    segments: Vec<String>,
    offset: usize,
}

impl KeyPath {
    fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    Implicit,
    Dotted,
    Header,
}

enum Item {
    Value(TomlValue),
    Table(TableBuilder),
    ArrayOfTables(Vec<TableBuilder>),
}

struct TableBuilder {
    entries: IndexMap<String, Item>,
    origin: Origin,
    // Entries below this index were defined before a header reopened the table.
    sealed: usize,
}

impl TableBuilder {
    fn new(origin: Origin) -> Self {
        TableBuilder {
            entries: IndexMap::new(),
            origin,
            sealed: 0,
        }
    }

    fn conflict(&self, index: usize, key: &str) -> ParseErrorKind {
        if index < self.sealed {
            ParseErrorKind::TableRedefinition(key.to_string())
        } else {
            ParseErrorKind::DuplicateKey(key.to_string())
        }
    }

    fn insert_value(&mut self, key: &str, value: TomlValue) -> std::result::Result<(), ParseErrorKind> {
        if let Some(index) = self.entries.get_index_of(key) {
            return Err(self.conflict(index, key));
        }
        self.entries.insert(key.to_string(), Item::Value(value));
        Ok(())
    }

    /// Steps into (or creates) the table a dotted-key segment names.
    fn descend_dotted(&mut self, key: &str) -> std::result::Result<&mut TableBuilder, ParseErrorKind> {
        let index = match self.entries.get_index_of(key) {
            Some(index) => index,
            None => {
                self.entries
                    .insert(key.to_string(), Item::Table(TableBuilder::new(Origin::Dotted)));
                self.entries.len() - 1
            }
        };
        let conflict = self.conflict(index, key);
        match self.entries.get_index_mut(index) {
            Some((_, Item::Table(table))) if table.origin != Origin::Header => Ok(table),
            Some((_, Item::Value(TomlValue::Table(_) | TomlValue::InlineTable(_))))
            | Some((_, Item::Table(_)))
            | Some((_, Item::ArrayOfTables(_))) => {
                Err(ParseErrorKind::TableRedefinition(key.to_string()))
            }
            _ => Err(conflict),
        }
    }

    /// Steps through an intermediate segment of a `[header]` path.
    fn descend_header(&mut self, key: &str) -> std::result::Result<&mut TableBuilder, ParseErrorKind> {
        let index = match self.entries.get_index_of(key) {
            Some(index) => index,
            None => {
                self.entries
                    .insert(key.to_string(), Item::Table(TableBuilder::new(Origin::Implicit)));
                self.entries.len() - 1
            }
        };
        let conflict = self.conflict(index, key);
        match self.entries.get_index_mut(index) {
            Some((_, Item::Table(table))) => Ok(table),
            Some((_, Item::ArrayOfTables(tables))) => tables
                .last_mut()
                .ok_or_else(|| ParseErrorKind::TableRedefinition(key.to_string())),
            Some((_, Item::Value(TomlValue::Table(_) | TomlValue::InlineTable(_)))) => {
                Err(ParseErrorKind::TableRedefinition(key.to_string()))
            }
            _ => Err(conflict),
        }
    }

    /// Defines the final segment of a `[header]`.
    fn open_table(&mut self, key: &str) -> std::result::Result<(), ParseErrorKind> {
        let index = match self.entries.get_index_of(key) {
            Some(index) => index,
            None => {
                self.entries
                    .insert(key.to_string(), Item::Table(TableBuilder::new(Origin::Header)));
                return Ok(());
            }
        };
        let conflict = self.conflict(index, key);
        match self.entries.get_index_mut(index) {
            Some((_, Item::Table(table))) => match table.origin {
                Origin::Implicit => {
                    table.origin = Origin::Header;
                    Ok(())
                }
                Origin::Dotted => {
                    table.origin = Origin::Header;
                    table.sealed = table.entries.len();
                    Ok(())
                }
                Origin::Header => Err(ParseErrorKind::TableRedefinition(key.to_string())),
            },
            Some((_, Item::ArrayOfTables(_)))
            | Some((_, Item::Value(TomlValue::Table(_) | TomlValue::InlineTable(_)))) => {
                Err(ParseErrorKind::TableRedefinition(key.to_string()))
            }
            _ => Err(conflict),
        }
    }

    /// Appends a table for the final segment of a `[[header]]`.
    fn push_array_table(&mut self, key: &str) -> std::result::Result<(), ParseErrorKind> {
        let index = match self.entries.get_index_of(key) {
            Some(index) => index,
            None => {
                self.entries.insert(
                    key.to_string(),
                    Item::ArrayOfTables(vec![TableBuilder::new(Origin::Header)]),
                );
                return Ok(());
            }
        };
        let conflict = self.conflict(index, key);
        match self.entries.get_index_mut(index) {
            Some((_, Item::ArrayOfTables(tables))) => {
                tables.push(TableBuilder::new(Origin::Header));
                Ok(())
            }
            Some((_, Item::Table(_)))
            | Some((_, Item::Value(TomlValue::Array(_) | TomlValue::Table(_) | TomlValue::InlineTable(_)))) => {
                Err(ParseErrorKind::TableRedefinition(key.to_string()))
            }
            _ => Err(conflict),
        }
    }

    /// Follows an already-validated section path, entering the newest array element.
    fn section_mut(&mut self, path: &[String]) -> Option<&mut TableBuilder> {
        let mut current = self;
        for key in path {
            current = match current.entries.get_mut(key.as_str())? {
                Item::Table(table) => table,
                Item::ArrayOfTables(tables) => tables.last_mut()?,
                Item::Value(_) => return None,
            };
        }
        Some(current)
    }

    fn into_map(self, inline: bool) -> TomlMap {
        self.entries
            .into_iter()
            .map(|(key, item)| {
                let value = match item {
                    Item::Value(value) => value,
                    Item::Table(table) if inline => TomlValue::InlineTable(table.into_map(true)),
                    Item::Table(table) => TomlValue::Table(table.into_map(false)),
                    Item::ArrayOfTables(tables) => TomlValue::Array(
                        tables
                            .into_iter()
                            .map(|t| TomlValue::Table(t.into_map(false)))
                            .collect(),
                    ),
                };
                (key, value)
            })
            .collect()
    }
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    root: TableBuilder,
    section: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Parser {
            cursor: Cursor::new(input),
            root: TableBuilder::new(Origin::Header),
            section: Vec::new(),
        }
    }

    fn skip_bom(&mut self) {
        if self.cursor.starts_with(b"\xEF\xBB\xBF") {
            self.cursor.advance_by(3);
        }
    }

    fn parse_statements(&mut self) -> Result<()> {
        loop {
            self.cursor.eat_whitespace();
            match self.cursor.peek() {
                None => return Ok(()),
                Some(b'#') => {
                    self.skip_comment()?;
                    self.end_of_line()?;
                }
                Some(b) if is_newline_start(b) => self.end_of_line()?,
                Some(b'[') => {
                    self.parse_header()?;
                    self.end_of_statement()?;
                }
                Some(_) => {
                    self.parse_key_value()?;
                    self.end_of_statement()?;
                }
            }
        }
    }

    /// Trailing whitespace, an optional comment, then a newline or end of input.
    fn end_of_statement(&mut self) -> Result<()> {
        self.cursor.eat_whitespace();
        if self.cursor.peek() == Some(b'#') {
            self.skip_comment()?;
        }
        self.end_of_line()
    }

    fn end_of_line(&mut self) -> Result<()> {
        if self.cursor.at_end() || self.cursor.eat_newline() {
            Ok(())
        } else if self.cursor.peek() == Some(b'\r') {
            Err(self.cursor.unexpected())
        } else {
            Err(self.cursor.error(ParseErrorKind::ExpectedNewline))
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let start = self.cursor.pos();
        self.cursor.advance();
        while let Some(b) = self.cursor.peek() {
            if b == b'\n' || (b == b'\r' && self.cursor.peek_at(1) == Some(b'\n')) {
                break;
            }
            if is_forbidden_control(b) {
                return Err(self.cursor.error(ParseErrorKind::ControlCharacter));
            }
            self.cursor.advance();
        }
        self.cursor.str_slice(start, self.cursor.pos())?;
        Ok(())
    }

    /// Whitespace, newlines and comments between array elements.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            self.cursor.eat_whitespace();
            match self.cursor.peek() {
                Some(b'#') => self.skip_comment()?,
                Some(b) if is_newline_start(b) => {
                    if !self.cursor.eat_newline() {
                        return Err(self.cursor.unexpected());
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_header(&mut self) -> Result<()> {
        self.cursor.advance();
        let array = self.cursor.eat(b'[');
        self.cursor.eat_whitespace();
        let path = self.parse_key_path()?;
        self.cursor.eat_whitespace();
        if !self.cursor.eat(b']') || (array && !self.cursor.eat(b']')) {
            return Err(self.cursor.unexpected());
        }
        trace!(path = %path.dotted(), array, "table header");

        let offset = path.offset;
        let (last, parents) = match path.segments.split_last() {
            Some(split) => split,
            None => return Err(self.cursor.error_at(offset, ParseErrorKind::ExpectedKey)),
        };
        let mut table = &mut self.root;
        for key in parents {
            table = table
                .descend_header(key)
                .map_err(|kind| self.cursor.error_at(offset, kind))?;
        }
        let defined = if array {
            table.push_array_table(last)
        } else {
            table.open_table(last)
        };
        defined.map_err(|kind| self.cursor.error_at(offset, kind))?;
        self.section = path.segments;
        Ok(())
    }

    fn parse_key_value(&mut self) -> Result<()> {
        let path = self.parse_key_path()?;
        self.cursor.eat_whitespace();
        if !self.cursor.eat(b'=') {
            return Err(self.cursor.error(ParseErrorKind::ExpectedEquals));
        }
        self.cursor.eat_whitespace();
        let value = self.parse_value()?;

        let offset = path.offset;
        let table = match self.root.section_mut(&self.section) {
            Some(table) => table,
            None => {
                return Err(self.cursor.error_at(
                    offset,
                    ParseErrorKind::TableRedefinition(self.section.join(".")),
                ))
            }
        };
        insert_dotted(table, &path, value).map_err(|kind| self.cursor.error_at(offset, kind))
    }

    fn parse_key_path(&mut self) -> Result<KeyPath> {
        let offset = self.cursor.pos();
        let mut segments = Vec::new();
        loop {
            self.cursor.eat_whitespace();
            segments.push(self.parse_simple_key()?);
            self.cursor.eat_whitespace();
            if !self.cursor.eat(b'.') {
                break;
            }
        }
        Ok(KeyPath { segments, offset })
    }

    fn parse_simple_key(&mut self) -> Result<String> {
        match self.cursor.peek() {
            Some(b'"') => {
                if self.cursor.starts_with(b"\"\"\"") {
                    return Err(self.cursor.error(ParseErrorKind::ExpectedKey));
                }
                self.parse_basic_string()
            }
            Some(b'\'') => {
                if self.cursor.starts_with(b"'''") {
                    return Err(self.cursor.error(ParseErrorKind::ExpectedKey));
                }
                self.parse_literal_string()
            }
            Some(b) if is_bare_key_byte(b) => {
                let start = self.cursor.pos();
                while matches!(self.cursor.peek(), Some(b) if is_bare_key_byte(b)) {
                    self.cursor.advance();
                }
                Ok(self.cursor.str_slice(start, self.cursor.pos())?.to_string())
            }
            _ => Err(self.cursor.error(ParseErrorKind::ExpectedKey)),
        }
    }

    fn parse_value(&mut self) -> Result<TomlValue> {
        match self.cursor.peek() {
            Some(b'"') if self.cursor.starts_with(b"\"\"\"") => {
                self.parse_multiline_basic_string().map(TomlValue::String)
            }
            Some(b'"') => self.parse_basic_string().map(TomlValue::String),
            Some(b'\'') if self.cursor.starts_with(b"'''") => {
                self.parse_multiline_literal_string().map(TomlValue::String)
            }
            Some(b'\'') => self.parse_literal_string().map(TomlValue::String),
            Some(b't') => self.parse_keyword(b"true", TomlValue::Boolean(true)),
            Some(b'f') => self.parse_keyword(b"false", TomlValue::Boolean(false)),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_inline_table(),
            Some(b'i' | b'n' | b'+' | b'-') => self.parse_number(),
            Some(b) if is_digit(b) => {
                if looks_temporal(&self.cursor) {
                    scan_temporal(&mut self.cursor)
                } else {
                    self.parse_number()
                }
            }
            Some(_) => Err(self.cursor.error(ParseErrorKind::ExpectedValue)),
            None => Err(self.cursor.error(ParseErrorKind::UnexpectedEof)),
        }
    }

    fn parse_keyword(&mut self, keyword: &[u8], value: TomlValue) -> Result<TomlValue> {
        if !self.cursor.starts_with(keyword) {
            return Err(self.cursor.error(ParseErrorKind::ExpectedValue));
        }
        self.cursor.advance_by(keyword.len());
        Ok(value)
    }

    fn parse_array(&mut self) -> Result<TomlValue> {
        self.cursor.advance();
        let mut values = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.cursor.eat(b']') {
                return Ok(TomlValue::Array(values));
            }
            values.push(self.parse_value()?);
            self.skip_trivia()?;
            if self.cursor.eat(b']') {
                return Ok(TomlValue::Array(values));
            }
            if !self.cursor.eat(b',') {
                return Err(self.cursor.unexpected());
            }
        }
    }

    fn parse_inline_table(&mut self) -> Result<TomlValue> {
        self.cursor.advance();
        let mut table = TableBuilder::new(Origin::Header);
        self.cursor.eat_whitespace();
        if self.cursor.eat(b'}') {
            return Ok(TomlValue::InlineTable(TomlMap::new()));
        }
        loop {
            let path = self.parse_key_path()?;
            self.cursor.eat_whitespace();
            if !self.cursor.eat(b'=') {
                return Err(self.cursor.error(ParseErrorKind::ExpectedEquals));
            }
            self.cursor.eat_whitespace();
            let value = self.parse_value()?;
            insert_dotted(&mut table, &path, value)
                .map_err(|kind| self.cursor.error_at(path.offset, kind))?;
            self.cursor.eat_whitespace();
            if self.cursor.eat(b'}') {
                return Ok(TomlValue::InlineTable(table.into_map(true)));
            }
            if !self.cursor.eat(b',') {
                return Err(self.cursor.unexpected());
            }
            self.cursor.eat_whitespace();
        }
    }

    /// Digits with single underscores between them, appended to `out`.
    fn digits(&mut self, out: &mut String, valid: fn(u8) -> bool) -> Result<()> {
        match self.cursor.peek() {
            Some(b) if valid(b) => {}
            _ => return Err(self.cursor.error(ParseErrorKind::InvalidNumber)),
        }
        loop {
            match self.cursor.peek() {
                Some(b) if valid(b) => {
                    out.push(b as char);
                    self.cursor.advance();
                }
                Some(b'_') => {
                    self.cursor.advance();
                    match self.cursor.peek() {
                        Some(b) if valid(b) => {}
                        _ => return Err(self.cursor.error(ParseErrorKind::InvalidNumber)),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_number(&mut self) -> Result<TomlValue> {
        let start = self.cursor.pos();
        let negative = match self.cursor.peek() {
            Some(b'-') => {
                self.cursor.advance();
                true
            }
            Some(b'+') => {
                self.cursor.advance();
                false
            }
            _ => false,
        };
        let signed = self.cursor.pos() != start;

        if self.cursor.starts_with(b"inf") {
            self.cursor.advance_by(3);
            let inf = if negative { f64::NEG_INFINITY } else { f64::INFINITY };
            return Ok(TomlValue::Float(inf));
        }
        if self.cursor.starts_with(b"nan") {
            self.cursor.advance_by(3);
            return Ok(TomlValue::Float(f64::NAN));
        }

        if !signed && self.cursor.peek() == Some(b'0') {
            let radix = match self.cursor.peek_at(1) {
                Some(b'x') => Some(16),
                Some(b'o') => Some(8),
                Some(b'b') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.cursor.advance_by(2);
                return self.parse_radix_integer(start, radix);
            }
        }

        let mut text = String::new();
        if negative {
            text.push('-');
        }
        let integral_start = self.cursor.pos();
        self.digits(&mut text, is_digit)?;
        let integral_len = text.len() - usize::from(negative);
        if integral_len > 1 && self.cursor.bytes()[integral_start] == b'0' {
            return Err(self.cursor.error_at(integral_start, ParseErrorKind::InvalidNumber));
        }

        let mut is_float = false;
        if self.cursor.eat(b'.') {
            text.push('.');
            self.digits(&mut text, is_digit)?;
            is_float = true;
        }
        if matches!(self.cursor.peek(), Some(b'e' | b'E')) {
            self.cursor.advance();
            text.push('e');
            match self.cursor.peek() {
                Some(b'-') => {
                    text.push('-');
                    self.cursor.advance();
                }
                Some(b'+') => self.cursor.advance(),
                _ => {}
            }
            self.digits(&mut text, is_digit)?;
            is_float = true;
        }

        if is_float {
            return match text.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(TomlValue::Float(f)),
                _ => Err(self.cursor.error_at(start, ParseErrorKind::InvalidNumber)),
            };
        }

        let mut acc: i64 = 0;
        for b in text.bytes().filter(u8::is_ascii_digit) {
            let digit = i64::from(b - b'0');
            let next = acc.checked_mul(10).and_then(|v| {
                if negative {
                    v.checked_sub(digit)
                } else {
                    v.checked_add(digit)
                }
            });
            acc = match next {
                Some(v) => v,
                None => return Err(self.cursor.error_at(start, ParseErrorKind::InvalidNumber)),
            };
        }
        Ok(TomlValue::Integer(acc))
    }

    fn parse_radix_integer(&mut self, start: usize, radix: u32) -> Result<TomlValue> {
        let valid: fn(u8) -> bool = match radix {
            16 => is_hex_digit,
            8 => |b| (b'0'..=b'7').contains(&b),
            _ => |b| b == b'0' || b == b'1',
        };
        let mut text = String::new();
        self.digits(&mut text, valid)?;
        let mut acc: i64 = 0;
        for c in text.chars() {
            let digit = c.to_digit(radix).map(i64::from);
            let next = digit.and_then(|d| acc.checked_mul(i64::from(radix))?.checked_add(d));
            acc = match next {
                Some(v) => v,
                None => return Err(self.cursor.error_at(start, ParseErrorKind::InvalidNumber)),
            };
        }
        Ok(TomlValue::Integer(acc))
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        let start = self.cursor.pos();
        self.cursor.advance();
        let c = match self.cursor.next_byte() {
            Some(b'b') => '\u{8}',
            Some(b't') => '\t',
            Some(b'n') => '\n',
            Some(b'f') => '\u{c}',
            Some(b'r') => '\r',
            Some(b'"') => '"',
            Some(b'\\') => '\\',
            Some(b'u') => self.parse_unicode_escape(start, 4)?,
            Some(b'U') => self.parse_unicode_escape(start, 8)?,
            _ => return Err(self.cursor.error_at(start, ParseErrorKind::InvalidEscape)),
        };
        out.push(c);
        Ok(())
    }

    fn parse_unicode_escape(&mut self, start: usize, len: usize) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..len {
            match self.cursor.next_byte() {
                Some(b) if is_hex_digit(b) => {
                    code = code * 16 + (b as char).to_digit(16).unwrap_or(0);
                }
                _ => return Err(self.cursor.error_at(start, ParseErrorKind::InvalidEscape)),
            }
        }
        char::from_u32(code).ok_or_else(|| self.cursor.error_at(start, ParseErrorKind::InvalidEscape))
    }

    fn parse_basic_string(&mut self) -> Result<String> {
        let open = self.cursor.pos();
        self.cursor.advance();
        let mut out = String::new();
        let mut run = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None => return Err(self.cursor.error_at(open, ParseErrorKind::UnterminatedString)),
                Some(b'"') => {
                    out.push_str(self.cursor.str_slice(run, self.cursor.pos())?);
                    self.cursor.advance();
                    return Ok(out);
                }
                Some(b) if is_escape(b) => {
                    out.push_str(self.cursor.str_slice(run, self.cursor.pos())?);
                    self.parse_escape(&mut out)?;
                    run = self.cursor.pos();
                }
                Some(b) if is_newline_start(b) => {
                    return Err(self.cursor.error_at(open, ParseErrorKind::UnterminatedString))
                }
                Some(b) if is_forbidden_control(b) => {
                    return Err(self.cursor.error(ParseErrorKind::ControlCharacter))
                }
                Some(_) => self.cursor.advance(),
            }
        }
    }

    fn parse_literal_string(&mut self) -> Result<String> {
        let open = self.cursor.pos();
        self.cursor.advance();
        let start = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None => return Err(self.cursor.error_at(open, ParseErrorKind::UnterminatedString)),
                Some(b'\'') => {
                    let text = self.cursor.str_slice(start, self.cursor.pos())?;
                    self.cursor.advance();
                    return Ok(text.to_string());
                }
                Some(b) if is_newline_start(b) => {
                    return Err(self.cursor.error_at(open, ParseErrorKind::UnterminatedString))
                }
                Some(b) if is_forbidden_control(b) => {
                    return Err(self.cursor.error(ParseErrorKind::ControlCharacter))
                }
                Some(_) => self.cursor.advance(),
            }
        }
    }

    /// Handles a run of `quote` bytes inside a multi-line string.
    ///
    /// Returns `true` once the closing delimiter was consumed. Up to two quotes
    /// directly before the delimiter belong to the content.
    fn multiline_quotes(&mut self, quote: u8, out: &mut String) -> bool {
        let mut count = 0;
        while self.cursor.peek_at(count) == Some(quote) {
            count += 1;
        }
        if count < 3 {
            for _ in 0..count {
                out.push(quote as char);
            }
            self.cursor.advance_by(count);
            return false;
        }
        let extra = (count - 3).min(2);
        for _ in 0..extra {
            out.push(quote as char);
        }
        self.cursor.advance_by(3 + extra);
        true
    }

    fn parse_multiline_basic_string(&mut self) -> Result<String> {
        let open = self.cursor.pos();
        self.cursor.advance_by(3);
        self.cursor.eat_newline();
        let mut out = String::new();
        let mut run = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None => return Err(self.cursor.error_at(open, ParseErrorKind::UnterminatedString)),
                Some(b'"') => {
                    out.push_str(self.cursor.str_slice(run, self.cursor.pos())?);
                    if self.multiline_quotes(b'"', &mut out) {
                        return Ok(out);
                    }
                    run = self.cursor.pos();
                }
                Some(b) if is_escape(b) => {
                    out.push_str(self.cursor.str_slice(run, self.cursor.pos())?);
                    if !self.line_ending_backslash()? {
                        self.parse_escape(&mut out)?;
                    }
                    run = self.cursor.pos();
                }
                Some(b'\n') => self.cursor.advance(),
                Some(b'\r') => {
                    if !self.cursor.eat_newline() {
                        return Err(self.cursor.error(ParseErrorKind::ControlCharacter));
                    }
                }
                Some(b) if is_forbidden_control(b) => {
                    return Err(self.cursor.error(ParseErrorKind::ControlCharacter))
                }
                Some(_) => self.cursor.advance(),
            }
        }
    }

    /// A backslash followed by optional whitespace and a newline trims up to the
    /// next non-whitespace character.
    fn line_ending_backslash(&mut self) -> Result<bool> {
        let mut offset = 1;
        while matches!(self.cursor.peek_at(offset), Some(b) if is_whitespace(b)) {
            offset += 1;
        }
        let at_newline = match self.cursor.peek_at(offset) {
            Some(b'\n') => true,
            Some(b'\r') => self.cursor.peek_at(offset + 1) == Some(b'\n'),
            _ => false,
        };
        if !at_newline {
            return Ok(false);
        }
        self.cursor.advance_by(offset);
        loop {
            self.cursor.eat_whitespace();
            if !self.cursor.eat_newline() {
                return Ok(true);
            }
        }
    }

    fn parse_multiline_literal_string(&mut self) -> Result<String> {
        let open = self.cursor.pos();
        self.cursor.advance_by(3);
        self.cursor.eat_newline();
        let mut out = String::new();
        let mut run = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None => return Err(self.cursor.error_at(open, ParseErrorKind::UnterminatedString)),
                Some(b'\'') => {
                    out.push_str(self.cursor.str_slice(run, self.cursor.pos())?);
                    if self.multiline_quotes(b'\'', &mut out) {
                        return Ok(out);
                    }
                    run = self.cursor.pos();
                }
                Some(b'\n') => self.cursor.advance(),
                Some(b'\r') => {
                    if !self.cursor.eat_newline() {
                        return Err(self.cursor.error(ParseErrorKind::ControlCharacter));
                    }
                }
                Some(b) if is_forbidden_control(b) => {
                    return Err(self.cursor.error(ParseErrorKind::ControlCharacter))
                }
                Some(_) => self.cursor.advance(),
            }
        }
    }
}

fn insert_dotted(
    table: &mut TableBuilder,
    path: &KeyPath,
    value: TomlValue,
) -> std::result::Result<(), ParseErrorKind> {
    let (last, parents) = match path.segments.split_last() {
        Some(split) => split,
        None => return Err(ParseErrorKind::ExpectedKey),
    };
    let mut current = table;
    for key in parents {
        current = current.descend_dotted(key)?;
    }
    current.insert_value(last, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<TomlMap> {
        parse_document(input.as_bytes())
    }

    fn kind(input: &str) -> ParseErrorKind {
        match parse(input) {
            Err(Error::Parse { kind, .. }) => kind,
            other => panic!("expected parse error for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn test_key_values() {
        let map = parse("a = 1\n\"b c\" = 'lit'\n# comment\n\nd = true # trailing\n").unwrap();
        assert_eq!(map.get("a"), Some(&TomlValue::Integer(1)));
        assert_eq!(map.get("b c"), Some(&TomlValue::String("lit".to_string())));
        assert_eq!(map.get("d"), Some(&TomlValue::Boolean(true)));
    }

    #[test]
    fn test_integers() {
        let map = parse("a = +99\nb = -17\nc = 1_000\nd = 0xDEAD_beef\ne = 0o755\nf = 0b1101\ng = -9223372036854775808\n").unwrap();
        assert_eq!(map.get("a"), Some(&TomlValue::Integer(99)));
        assert_eq!(map.get("b"), Some(&TomlValue::Integer(-17)));
        assert_eq!(map.get("c"), Some(&TomlValue::Integer(1000)));
        assert_eq!(map.get("d"), Some(&TomlValue::Integer(0xDEAD_BEEF)));
        assert_eq!(map.get("e"), Some(&TomlValue::Integer(0o755)));
        assert_eq!(map.get("f"), Some(&TomlValue::Integer(13)));
        assert_eq!(map.get("g"), Some(&TomlValue::Integer(i64::MIN)));
    }

    #[test]
    fn test_invalid_integers() {
        assert_eq!(kind("a = 012\n"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind("a = 1__0\n"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind("a = 10_\n"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind("a = 9223372036854775808\n"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind("a = 0x\n"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind("a = 0b102\n"), ParseErrorKind::ExpectedNewline);
    }

    #[test]
    fn test_floats() {
        let map = parse("a = 3.14\nb = -0.01\nc = 5e+22\nd = 1e06\ne = 6.626e-34\nf = 224_617.445_991\ng = -inf\nh = nan\ni = +inf\n").unwrap();
        assert_eq!(map.get("a"), Some(&TomlValue::Float(3.14)));
        assert_eq!(map.get("b"), Some(&TomlValue::Float(-0.01)));
        assert_eq!(map.get("c"), Some(&TomlValue::Float(5e22)));
        assert_eq!(map.get("d"), Some(&TomlValue::Float(1e6)));
        assert_eq!(map.get("e"), Some(&TomlValue::Float(6.626e-34)));
        assert_eq!(map.get("f"), Some(&TomlValue::Float(224_617.445_991)));
        assert_eq!(map.get("g"), Some(&TomlValue::Float(f64::NEG_INFINITY)));
        assert!(map.get("h").and_then(TomlValue::as_float).unwrap().is_nan());
        assert_eq!(map.get("i"), Some(&TomlValue::Float(f64::INFINITY)));
        assert_eq!(kind("a = 1.\n"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind("a = 1e\n"), ParseErrorKind::InvalidNumber);
        assert_eq!(kind("a = 1e400\n"), ParseErrorKind::InvalidNumber);
    }

    #[test]
    fn test_strings() {
        let map = parse(concat!(
            "a = \"tab\\there \\u00E9 \\U0001F600\"\n",
            "b = \"\"\"\nline one\nline two\"\"\"\n",
            "c = \"\"\"trim \\\n    me\"\"\"\n",
            "d = '''\n'raw' \\n'''\n",
            "e = \"\"\"two quotes \"\"\"\"\"\n",
        ))
        .unwrap();
        assert_eq!(map.get("a").and_then(TomlValue::as_str), Some("tab\there é 😀"));
        assert_eq!(map.get("b").and_then(TomlValue::as_str), Some("line one\nline two"));
        assert_eq!(map.get("c").and_then(TomlValue::as_str), Some("trim me"));
        assert_eq!(map.get("d").and_then(TomlValue::as_str), Some("'raw' \\n"));
        assert_eq!(map.get("e").and_then(TomlValue::as_str), Some("two quotes \"\""));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(kind("a = \"open\n"), ParseErrorKind::UnterminatedString);
        assert_eq!(kind("a = \"bad \\q\"\n"), ParseErrorKind::InvalidEscape);
        assert_eq!(kind("a = \"\\uD800\"\n"), ParseErrorKind::InvalidEscape);
        assert_eq!(kind("a = \"bell \u{7}\"\n"), ParseErrorKind::ControlCharacter);
        assert_eq!(
            parse_document(b"a = \"\xff\"\n").unwrap_err().parse_kind(),
            Some(&ParseErrorKind::InvalidUtf8)
        );
    }

    #[test]
    fn test_temporals() {
        let map = parse("a = 1979-05-27\nb = 07:32:00\nc = 1979-05-27T07:32:00.5\nd = 1979-05-27 07:32:00Z\n").unwrap();
        assert!(matches!(map.get("a"), Some(TomlValue::LocalDate(_))));
        assert!(matches!(map.get("b"), Some(TomlValue::LocalTime(_))));
        assert!(matches!(map.get("c"), Some(TomlValue::LocalDateTime(_))));
        assert!(matches!(map.get("d"), Some(TomlValue::OffsetDateTime(_))));
        assert_eq!(kind("a = 1979-13-27\n"), ParseErrorKind::InvalidDateTime);
    }

    #[test]
    fn test_arrays_and_inline_tables() {
        let map = parse("a = [\n  1, # one\n  \"two\",\n]\nb = {x = 1, y.z = 2}\nc = {}\n").unwrap();
        assert_eq!(map.get("a").map(TomlValue::node_count), Some(2));
        let b = map.get("b").unwrap();
        assert!(b.is_inline_table());
        assert!(b.get("y").unwrap().is_inline_table());
        assert_eq!(map.get("c"), Some(&TomlValue::InlineTable(TomlMap::new())));
        assert_eq!(kind("a = {x = 1,}\n"), ParseErrorKind::ExpectedKey);
        assert_eq!(kind("a = [1 2]\n"), ParseErrorKind::UnexpectedByte(b'2'));
    }

    #[test]
    fn test_duplicate_and_redefinition() {
        assert_eq!(kind("a = 1\na = 2\n"), ParseErrorKind::DuplicateKey("a".to_string()));
        assert_eq!(
            kind("a.b = 1\n[a]\nb = 2\n"),
            ParseErrorKind::TableRedefinition("b".to_string())
        );
        assert_eq!(kind("[a]\n[a]\n"), ParseErrorKind::TableRedefinition("a".to_string()));
        assert_eq!(
            kind("a = {b = 1}\n[a]\n"),
            ParseErrorKind::TableRedefinition("a".to_string())
        );
        assert_eq!(
            kind("a = {b = 1}\na.c = 2\n"),
            ParseErrorKind::TableRedefinition("a".to_string())
        );
        assert_eq!(
            kind("a = [ 1 ]\n[[a]]\n"),
            ParseErrorKind::TableRedefinition("a".to_string())
        );
        assert_eq!(
            kind("[[a]]\n[a]\n"),
            ParseErrorKind::TableRedefinition("a".to_string())
        );
        assert_eq!(
            kind("[a.b]\nc = 1\n[a]\nb.d = 2\n"),
            ParseErrorKind::TableRedefinition("b".to_string())
        );
    }

    #[test]
    fn test_dotted_tables_extended_by_header() {
        let map = parse("a.b.c = \"x\"\n[a.b]\nd = 1\n").unwrap();
        let b = map.get("a").and_then(|a| a.get("b")).unwrap();
        assert_eq!(b.get("c").and_then(TomlValue::as_str), Some("x"));
        assert_eq!(b.get("d"), Some(&TomlValue::Integer(1)));
        assert_eq!(
            kind("a.b.c = \"x\"\n[a.b]\nc = 1\n"),
            ParseErrorKind::TableRedefinition("c".to_string())
        );
    }

    #[test]
    fn test_implicit_tables_defined_later() {
        let map = parse("[x.y.z]\nw = 1\n[x]\nv = 2\n").unwrap();
        let x = map.get("x").unwrap();
        assert_eq!(x.get("v"), Some(&TomlValue::Integer(2)));
        assert!(x.get("y").and_then(|y| y.get("z")).is_some());
    }

    #[test]
    fn test_array_of_tables() {
        let map = parse("[[p]]\nn = 1\n[p.sub]\nq = true\n[[p]]\nn = 2\n").unwrap();
        let p = map.get("p").and_then(TomlValue::as_array).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0].get("sub").and_then(|s| s.get("q")), Some(&TomlValue::Boolean(true)));
        assert_eq!(p[1].get("n"), Some(&TomlValue::Integer(2)));
        assert!(p[1].get("sub").is_none());
    }

    #[test]
    fn test_statement_termination() {
        assert_eq!(kind("a = 1 b = 2\n"), ParseErrorKind::ExpectedNewline);
        assert_eq!(kind("a = truex\n"), ParseErrorKind::ExpectedNewline);
        assert_eq!(kind("a 1\n"), ParseErrorKind::ExpectedEquals);
        assert_eq!(kind("= 1\n"), ParseErrorKind::ExpectedKey);
        assert_eq!(kind("a = \n"), ParseErrorKind::ExpectedValue);
        assert_eq!(kind("a = 1\r"), ParseErrorKind::UnexpectedByte(b'\r'));
        assert!(parse("a = 1\r\nb = 2\r\n").is_ok());
    }

    #[test]
    fn test_error_positions() {
        match parse("a = 1\nb = @\n") {
            Err(Error::Parse { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_standalone_value() {
        assert_eq!(parse_value(b"  42  ").unwrap(), TomlValue::Integer(42));
        assert!(parse_value(b"42 43").is_err());
        assert!(parse_value(b"").is_err());
    }
}
