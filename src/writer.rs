//! Streaming TOML writer.
//!
//! [`TomlWriter`] has two layers. The primitive layer turns booleans, integers,
//! floats, strings and the four date/time kinds into their exact TOML text. The
//! structural layer tracks where the next value goes (a `key = value` line, an
//! inline array, an inline table, or a run of `[[path]]` blocks) and decides the
//! punctuation around it.
//!
//! ## Layout
//!
//! - Inline arrays are padded: `[ 1, 2 ]`, and empty arrays are `[ ]`.
//! - Inline tables are not: `{a = 1, b = 2}`, and empty tables are `{}`.
//! - With [`TomlStyle::HEADER_TABLES`] a table under a key in a block becomes a
//!   `[path]` block. With [`TomlStyle::HEADER_ARRAY_TABLES`] a non-empty sequence
//!   under a key of the document itself becomes repeated `[[path]]` blocks when
//!   every element is a table; any other sequence stays inline. Such a sequence
//!   is held as values until it ends.
//! - Every block ends with a blank line. Plain keys of a block are always written
//!   before its nested blocks, whatever order the fields come in.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::{TomlOptions, TomlStyle, TomlWriter};
//!
//! let options = TomlOptions::new().with_style(TomlStyle::HEADERS);
//! let mut writer = TomlWriter::new(&options);
//! writer.begin_table().unwrap();
//! writer.write_key("title").unwrap();
//! writer.write_str("demo").unwrap();
//! writer.write_key("owner").unwrap();
//! writer.begin_table().unwrap();
//! writer.write_key("name").unwrap();
//! writer.write_str("Tom").unwrap();
//! writer.end_table().unwrap();
//! writer.write_key("ports").unwrap();
//! writer.begin_array(Some(2)).unwrap();
//! writer.write_i64(80).unwrap();
//! writer.write_i64(443).unwrap();
//! writer.end_array().unwrap();
//! writer.end_table().unwrap();
//!
//! assert_eq!(
//!     writer.into_string().unwrap(),
//!     "title = \"demo\"\nports = [ 80, 443 ]\n[owner]\nname = \"Tom\"\n\n"
//! );
//! ```

use crate::datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::lexer::is_bare_key;
use crate::options::{NullHandling, TomlOptions, TomlStyle};
use crate::pool::PooledBuffer;
use crate::{Error, Result, TomlMap, TomlValue};
use chrono::Datelike;
use std::io::Write;
use tracing::debug;

/// Where the next value will be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueState {
    /// `key = value` lines of the document or of a `[path]` block.
    RootKeyValue,
    /// Between the brackets of an inline array.
    InlineArray,
    /// Between the braces of an inline table.
    InlineTable,
    /// A sequence written as `[[path]]` blocks, one per element.
    ArrayOfTables,
}

struct PendingKey {
    text: String,
    // Keys that came from non-string map keys are quoted inside inline tables.
    quote_inline: bool,
}

enum Frame {
    Section,
    InlineArray { count: usize },
    InlineTable { count: usize },
    ArrayOfTables { key: String },
    Standalone { written: bool },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Header {
    Root,
    Table,
    ArrayTable,
}

struct Section {
    path: Vec<String>,
    header: Header,
    body: PooledBuffer,
    children: PooledBuffer,
}

impl Section {
    fn new(path: Vec<String>, header: Header) -> Self {
        Section {
            path,
            header,
            body: PooledBuffer::acquire(),
            children: PooledBuffer::acquire(),
        }
    }
}

/// A streaming writer producing TOML text.
pub struct TomlWriter {
    style: TomlStyle,
    null_handling: NullHandling,
    frames: Vec<Frame>,
    sections: Vec<Section>,
    pending: Option<PendingKey>,
    capture: Option<Capture>,
    output: PooledBuffer,
    document_done: bool,
}

impl TomlWriter {
    /// A writer for a whole document, laid out according to `options`.
    #[must_use]
    pub fn new(options: &TomlOptions) -> Self {
        TomlWriter {
            style: options.style,
            null_handling: options.null_handling,
            frames: Vec::new(),
            sections: Vec::new(),
            pending: None,
            capture: None,
            output: PooledBuffer::acquire(),
            document_done: false,
        }
    }

    /// A writer for exactly one inline value, the text that would follow `key = `.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::TomlWriter;
    ///
    /// let mut writer = TomlWriter::standalone();
    /// writer.write_f64(123.0).unwrap();
    /// assert_eq!(writer.into_string().unwrap(), "123.0");
    /// ```
    #[must_use]
    pub fn standalone() -> Self {
        let mut writer = TomlWriter::new(&TomlOptions::default());
        writer.frames.push(Frame::Standalone { written: false });
        writer
    }

    #[inline]
    #[must_use]
    pub fn style(&self) -> TomlStyle {
        self.style
    }

    /// The state of the innermost open construct, `None` before the document
    /// starts and for standalone values.
    #[must_use]
    pub fn state(&self) -> Option<ValueState> {
        if let Some(capture) = &self.capture {
            return Some(capture.state());
        }
        match self.frames.last()? {
            Frame::Section => Some(ValueState::RootKeyValue),
            Frame::InlineArray { .. } => Some(ValueState::InlineArray),
            Frame::InlineTable { .. } => Some(ValueState::InlineTable),
            Frame::ArrayOfTables { .. } => Some(ValueState::ArrayOfTables),
            Frame::Standalone { .. } => None,
        }
    }

    /// Sets the key of the next value in the current table.
    pub fn write_key(&mut self, key: &str) -> Result<()> {
        self.set_key(key, false)
    }

    /// Sets a key that is the canonical text of a number, boolean or date.
    ///
    /// Such keys are quoted inside inline tables and follow the bare/quoted
    /// rule elsewhere.
    pub fn write_non_string_key(&mut self, text: &str) -> Result<()> {
        self.set_key(text, true)
    }

    fn set_key(&mut self, text: &str, quote_inline: bool) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.key(text);
        }
        if self.pending.is_some() {
            return Err(Error::custom("key written twice without a value"));
        }
        self.pending = Some(PendingKey {
            text: text.to_string(),
            quote_inline,
        });
        Ok(())
    }

    /// Records an absent value under the writer's [`NullHandling`].
    pub fn write_absent(&mut self) -> Result<()> {
        self.write_absent_with(self.null_handling)
    }

    /// Records an absent value under an explicit policy.
    ///
    /// `Ignore` drops the pending key; `Error` fails naming it. An absent value
    /// that has no key (an array element, a standalone value) always fails.
    pub fn write_absent_with(&mut self, handling: NullHandling) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.absent(handling);
        }
        match (self.pending.take(), handling) {
            (Some(_), NullHandling::Ignore) => Ok(()),
            (Some(key), NullHandling::Error) => Err(Error::NullValue(key.text)),
            (None, _) => Err(Error::unsupported_value(
                "an absent value can only be omitted from a table",
            )),
        }
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.scalar(TomlValue::Boolean(value))
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.scalar(TomlValue::Integer(value))
    }

    /// Writes an unsigned integer; values above `i64::MAX` cannot be represented.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let value = i64::try_from(value).map_err(|_| {
            Error::unsupported_value(format!("integer {} does not fit in i64", value))
        })?;
        self.write_i64(value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.scalar(TomlValue::Float(value))
    }

    /// Writes an `f32` using its own shortest representation.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.scalar(TomlValue::Float(widen_f32(value)))
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.scalar(TomlValue::String(value.to_string()))
    }

    pub fn write_local_date(&mut self, value: LocalDate) -> Result<()> {
        check_year(value.get().year())?;
        self.scalar(TomlValue::LocalDate(value))
    }

    pub fn write_local_time(&mut self, value: LocalTime) -> Result<()> {
        self.scalar(TomlValue::LocalTime(value))
    }

    pub fn write_local_date_time(&mut self, value: LocalDateTime) -> Result<()> {
        check_year(value.get().year())?;
        self.scalar(TomlValue::LocalDateTime(value))
    }

    pub fn write_offset_date_time(&mut self, value: OffsetDateTime) -> Result<()> {
        check_year(value.get().naive_local().year())?;
        self.scalar(TomlValue::OffsetDateTime(value))
    }

    /// Writes any value. Inline tables stay inline; non-empty arrays consisting
    /// only of tables may become `[[path]]` blocks.
    pub fn write_value(&mut self, value: &TomlValue) -> Result<()> {
        match value {
            TomlValue::Boolean(b) => self.write_bool(*b),
            TomlValue::Integer(i) => self.write_i64(*i),
            TomlValue::Float(f) => self.write_f64(*f),
            TomlValue::String(s) => self.write_str(s),
            TomlValue::LocalDate(d) => self.write_local_date(*d),
            TomlValue::LocalTime(t) => self.write_local_time(*t),
            TomlValue::LocalDateTime(dt) => self.write_local_date_time(*dt),
            TomlValue::OffsetDateTime(dt) => self.write_offset_date_time(*dt),
            TomlValue::Array(items) => {
                if self.at_array_table_position() {
                    let key = self.take_key()?;
                    self.write_sequence(key, items)
                } else {
                    self.write_inline_array(items)
                }
            }
            TomlValue::Table(map) => {
                self.begin_table()?;
                for (key, item) in map {
                    self.write_key(key)?;
                    self.write_value(item)?;
                }
                self.end_table()
            }
            TomlValue::InlineTable(map) => {
                self.begin_inline_table()?;
                for (key, item) in map {
                    self.write_key(key)?;
                    self.write_value(item)?;
                }
                self.end_table()
            }
        }
    }

    /// Opens a table: the document root, a `[path]` block, an element of a
    /// `[[path]]` run, or an inline table, depending on position and style.
    pub fn begin_table(&mut self) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.open_table(false);
        }
        match self.frames.last() {
            None => self.begin_document(),
            Some(Frame::Section) if self.style.header_tables() && self.pending.is_some() => {
                let key = self.take_key()?;
                let mut path = self.section_path();
                path.push(key.text);
                self.open_section(path, Header::Table);
                Ok(())
            }
            Some(Frame::ArrayOfTables { key }) => {
                let mut path = self.section_path();
                path.push(key.clone());
                self.open_section(path, Header::ArrayTable);
                Ok(())
            }
            _ => self.open_inline_table(),
        }
    }

    /// Opens an inline table wherever a value may go (or the document root).
    pub fn begin_inline_table(&mut self) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.open_table(true);
        }
        if self.frames.is_empty() {
            return self.begin_document();
        }
        self.open_inline_table()
    }

    pub fn end_table(&mut self) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.close_table();
        }
        match self.frames.pop() {
            Some(Frame::Section) => {
                let section = self
                    .sections
                    .pop()
                    .ok_or_else(|| Error::custom("table closed twice"))?;
                self.close_section(section)
            }
            Some(Frame::InlineTable { .. }) => {
                self.sink().push(b'}');
                self.end_value();
                Ok(())
            }
            Some(other) => {
                self.frames.push(other);
                Err(Error::custom("end_table does not match the open construct"))
            }
            None => Err(Error::custom("end_table without an open table")),
        }
    }

    /// Opens a sequence. Under header array style a non-empty sequence under a
    /// key of the document is held until it ends, then written as `[[path]]`
    /// blocks if every element is a table and as an inline array otherwise.
    pub fn begin_array(&mut self, len: Option<usize>) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.open_array();
        }
        if len != Some(0) && self.at_array_table_position() {
            let key = self.take_key()?;
            self.capture = Some(Capture::new(key));
            return Ok(());
        }
        self.begin_inline_array()
    }

    /// Opens an inline array wherever a value may go.
    pub fn begin_inline_array(&mut self) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.open_array();
        }
        self.value_prefix()?;
        self.sink().push(b'[');
        self.frames.push(Frame::InlineArray { count: 0 });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            let items = match capture.close_array()? {
                Some(items) => items,
                None => return Ok(()),
            };
            let key = match self.capture.take() {
                Some(capture) => capture.key,
                None => return Err(Error::custom("sequence closed twice")),
            };
            return self.write_sequence(key, &items);
        }
        match self.frames.pop() {
            Some(Frame::InlineArray { .. }) => {
                self.sink().extend_from_slice(b" ]");
                self.end_value();
                Ok(())
            }
            Some(other) => {
                self.frames.push(other);
                Err(Error::custom("end_array does not match the open construct"))
            }
            None => Err(Error::custom("end_array without an open array")),
        }
    }

    /// Completes the write and returns the bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        match self.frames.as_slice() {
            [] | [Frame::Standalone { written: true }] => {}
            [Frame::Standalone { written: false }] => {
                return Err(Error::unsupported_value("no value was written"))
            }
            _ => return Err(Error::custom("unclosed table or array")),
        }
        if self.capture.is_some() {
            return Err(Error::custom("unclosed table or array"));
        }
        if self.pending.is_some() {
            return Err(Error::custom("key written without a value"));
        }
        debug!(bytes = self.output.len(), "wrote TOML");
        Ok(self.output.to_vec())
    }

    pub fn into_string(self) -> Result<String> {
        String::from_utf8(self.finish()?).map_err(Error::custom)
    }

    fn begin_document(&mut self) -> Result<()> {
        if self.document_done {
            return Err(Error::unsupported_type(
                "a TOML document has exactly one top-level table",
            ));
        }
        self.open_section(Vec::new(), Header::Root);
        Ok(())
    }

    fn open_section(&mut self, path: Vec<String>, header: Header) {
        self.sections.push(Section::new(path, header));
        self.frames.push(Frame::Section);
    }

    fn open_inline_table(&mut self) -> Result<()> {
        self.value_prefix()?;
        self.sink().push(b'{');
        self.frames.push(Frame::InlineTable { count: 0 });
        Ok(())
    }

    fn close_section(&mut self, section: Section) -> Result<()> {
        if section.header == Header::Root {
            self.output.extend_from_slice(&section.body);
            self.output.extend_from_slice(&section.children);
            self.document_done = true;
            return Ok(());
        }

        let parent = self
            .sections
            .last_mut()
            .ok_or_else(|| Error::custom("block without an enclosing table"))?;
        let out = &mut parent.children;
        // A block with only nested blocks is implied by their headers.
        let needs_header = section.header == Header::ArrayTable
            || !section.body.is_empty()
            || section.children.is_empty();
        if needs_header {
            let array = section.header == Header::ArrayTable;
            out.extend_from_slice(if array { &b"[["[..] } else { &b"["[..] });
            for (i, segment) in section.path.iter().enumerate() {
                if i > 0 {
                    out.push(b'.');
                }
                push_key(out, segment, false);
            }
            out.extend_from_slice(if array { &b"]]\n"[..] } else { &b"]\n"[..] });
            out.extend_from_slice(&section.body);
            out.push(b'\n');
        }
        out.extend_from_slice(&section.children);
        Ok(())
    }

    fn section_path(&self) -> Vec<String> {
        self.sections
            .last()
            .map(|s| s.path.clone())
            .unwrap_or_default()
    }

    fn take_key(&mut self) -> Result<PendingKey> {
        self.pending
            .take()
            .ok_or_else(|| Error::unsupported_type("a value in a table needs a key"))
    }

    fn sink(&mut self) -> &mut Vec<u8> {
        match self.sections.last_mut() {
            Some(section) => &mut section.body,
            None => &mut self.output,
        }
    }

    /// Whether a sequence written now may become `[[path]]` blocks: header
    /// array style, a pending key, and the document's own block.
    fn at_array_table_position(&self) -> bool {
        self.style.header_array_tables()
            && self.capture.is_none()
            && self.pending.is_some()
            && self.sections.len() == 1
            && matches!(self.frames.last(), Some(Frame::Section))
    }

    /// Writes a complete sequence under `key`: `[[key]]` blocks when it is a
    /// non-empty run of tables, an inline array otherwise.
    fn write_sequence(&mut self, key: PendingKey, items: &[TomlValue]) -> Result<()> {
        let tables = !items.is_empty() && items.iter().all(|v| matches!(v, TomlValue::Table(_)));
        if !tables {
            self.pending = Some(key);
            return self.write_inline_array(items);
        }
        self.frames.push(Frame::ArrayOfTables { key: key.text });
        for item in items {
            self.write_value(item)?;
        }
        self.frames.pop();
        Ok(())
    }

    fn write_inline_array(&mut self, items: &[TomlValue]) -> Result<()> {
        self.begin_inline_array()?;
        for item in items {
            self.write_value(item)?;
        }
        self.end_array()
    }

    /// Writes whatever precedes a value in the current position.
    fn value_prefix(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            None => Err(Error::unsupported_type(
                "the top level of a TOML document must be a table",
            )),
            Some(Frame::Standalone { written }) => {
                if *written {
                    return Err(Error::unsupported_type("a standalone value is already written"));
                }
                *written = true;
                Ok(())
            }
            Some(Frame::Section) => {
                let key = self.take_key()?;
                let out = self.sink();
                push_key(out, &key.text, false);
                out.extend_from_slice(b" = ");
                Ok(())
            }
            Some(Frame::InlineTable { count }) => {
                let first = *count == 0;
                *count += 1;
                let key = self.take_key()?;
                let out = self.sink();
                if !first {
                    out.extend_from_slice(b", ");
                }
                push_key(out, &key.text, key.quote_inline);
                out.extend_from_slice(b" = ");
                Ok(())
            }
            Some(Frame::InlineArray { count }) => {
                let first = *count == 0;
                *count += 1;
                self.sink()
                    .extend_from_slice(if first { &b" "[..] } else { &b", "[..] });
                Ok(())
            }
            Some(Frame::ArrayOfTables { key }) => Err(Error::unsupported_type(&format!(
                "`{}` is written as an array of tables and cannot hold other values",
                key
            ))),
        }
    }

    fn end_value(&mut self) {
        if matches!(self.frames.last(), Some(Frame::Section)) {
            self.sink().push(b'\n');
        }
    }

    fn scalar(&mut self, value: TomlValue) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            return capture.push(value);
        }
        self.value_prefix()?;
        push_scalar(self.sink(), &value)?;
        self.end_value();
        Ok(())
    }
}

/// A sequence that may still become `[[path]]` blocks, kept as values until
/// it ends.
struct Capture {
    key: PendingKey,
    stack: Vec<Open>,
    pending: Option<String>,
}

enum Open {
    Array {
        key: Option<String>,
        items: Vec<TomlValue>,
    },
    Table {
        key: Option<String>,
        map: TomlMap,
        inline: bool,
    },
}

impl Capture {
    fn new(key: PendingKey) -> Self {
        Capture {
            key,
            stack: vec![Open::Array {
                key: None,
                items: Vec::new(),
            }],
            pending: None,
        }
    }

    fn state(&self) -> ValueState {
        match self.stack.last() {
            Some(Open::Array { .. }) if self.stack.len() == 1 => ValueState::ArrayOfTables,
            Some(Open::Array { .. }) => ValueState::InlineArray,
            Some(Open::Table { inline: true, .. }) => ValueState::InlineTable,
            _ => ValueState::RootKeyValue,
        }
    }

    fn key(&mut self, text: &str) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::custom("key written twice without a value"));
        }
        self.pending = Some(text.to_string());
        Ok(())
    }

    /// The key the next value is stored under; arrays take none.
    fn slot(&mut self) -> Result<Option<String>> {
        match self.stack.last() {
            Some(Open::Table { .. }) => self
                .pending
                .take()
                .map(Some)
                .ok_or_else(|| Error::unsupported_type("a value in a table needs a key")),
            _ => Ok(None),
        }
    }

    fn insert(&mut self, key: Option<String>, value: TomlValue) -> Result<()> {
        match (self.stack.last_mut(), key) {
            (Some(Open::Array { items, .. }), _) => {
                items.push(value);
                Ok(())
            }
            (Some(Open::Table { map, .. }), Some(key)) => map.try_insert(key, value),
            _ => Err(Error::custom("value written outside the open sequence")),
        }
    }

    fn push(&mut self, value: TomlValue) -> Result<()> {
        let key = self.slot()?;
        self.insert(key, value)
    }

    fn absent(&mut self, handling: NullHandling) -> Result<()> {
        match (self.stack.last(), self.pending.take(), handling) {
            (Some(Open::Table { .. }), Some(_), NullHandling::Ignore) => Ok(()),
            (Some(Open::Table { .. }), Some(key), NullHandling::Error) => {
                Err(Error::NullValue(key))
            }
            _ => Err(Error::unsupported_value(
                "an absent value can only be omitted from a table",
            )),
        }
    }

    fn open_table(&mut self, inline: bool) -> Result<()> {
        let key = self.slot()?;
        self.stack.push(Open::Table {
            key,
            map: TomlMap::new(),
            inline,
        });
        Ok(())
    }

    fn open_array(&mut self) -> Result<()> {
        let key = self.slot()?;
        self.stack.push(Open::Array {
            key,
            items: Vec::new(),
        });
        Ok(())
    }

    fn close_table(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Open::Table { key, map, inline }) => {
                let value = if inline {
                    TomlValue::InlineTable(map)
                } else {
                    TomlValue::Table(map)
                };
                self.insert(key, value)
            }
            Some(other) => {
                self.stack.push(other);
                Err(Error::custom("end_table does not match the open construct"))
            }
            None => Err(Error::custom("end_table without an open table")),
        }
    }

    /// Closes the innermost array, handing back the elements once the
    /// sequence itself is closed.
    fn close_array(&mut self) -> Result<Option<Vec<TomlValue>>> {
        match self.stack.pop() {
            Some(Open::Array { items, .. }) if self.stack.is_empty() => Ok(Some(items)),
            Some(Open::Array { key, items }) => {
                self.insert(key, TomlValue::Array(items))?;
                Ok(None)
            }
            Some(other) => {
                self.stack.push(other);
                Err(Error::custom("end_array does not match the open construct"))
            }
            None => Err(Error::custom("end_array without an open array")),
        }
    }
}

fn io_error(err: std::io::Error) -> Error {
    Error::io(&err.to_string())
}

fn push_scalar(out: &mut Vec<u8>, value: &TomlValue) -> Result<()> {
    match value {
        TomlValue::Boolean(b) => {
            out.extend_from_slice(if *b { &b"true"[..] } else { &b"false"[..] });
            Ok(())
        }
        TomlValue::Integer(i) => write!(out, "{}", i).map_err(io_error),
        TomlValue::Float(f) => {
            push_f64(out, *f);
            Ok(())
        }
        TomlValue::String(s) => {
            push_basic_string(out, s);
            Ok(())
        }
        TomlValue::LocalDate(d) => write!(out, "{}", d).map_err(io_error),
        TomlValue::LocalTime(t) => write!(out, "{}", t).map_err(io_error),
        TomlValue::LocalDateTime(dt) => write!(out, "{}", dt).map_err(io_error),
        TomlValue::OffsetDateTime(dt) => write!(out, "{}", dt).map_err(io_error),
        other => Err(Error::unsupported_type(&format!(
            "{} is not a scalar",
            other.type_name()
        ))),
    }
}

/// The `f64` whose shortest text matches the `f32`'s shortest text.
fn widen_f32(value: f32) -> f64 {
    value.to_string().parse().unwrap_or_else(|_| f64::from(value))
}

fn check_year(year: i32) -> Result<()> {
    if (0..=9999).contains(&year) {
        Ok(())
    } else {
        Err(Error::unsupported_value(format!(
            "year {} is outside 0000..=9999",
            year
        )))
    }
}

/// Writes `key` bare when possible, quoted otherwise (or always, if `force_quote`).
pub(crate) fn push_key(out: &mut Vec<u8>, key: &str, force_quote: bool) {
    if !force_quote && is_bare_key(key) {
        out.extend_from_slice(key.as_bytes());
    } else {
        push_basic_string(out, key);
    }
}

/// Writes `value` as a basic string with the short escapes TOML defines.
pub(crate) fn push_basic_string(out: &mut Vec<u8>, value: &str) {
    out.push(b'"');
    let mut run = 0;
    for (i, b) in value.bytes().enumerate() {
        let escape: &[u8] = match b {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\t' => b"\\t",
            b'\r' => b"\\r",
            0x08 => b"\\b",
            0x0c => b"\\f",
            b if b < 0x20 || b == 0x7f => {
                out.extend_from_slice(&value.as_bytes()[run..i]);
                // Writing into a Vec cannot fail.
                let _ = write!(out, "\\u{:04X}", b);
                run = i + 1;
                continue;
            }
            _ => continue,
        };
        out.extend_from_slice(&value.as_bytes()[run..i]);
        out.extend_from_slice(escape);
        run = i + 1;
    }
    out.extend_from_slice(&value.as_bytes()[run..]);
    out.push(b'"');
}

// Magnitudes written in exponent form.
const EXPONENT_ABOVE: f64 = 1e16;
const EXPONENT_BELOW: f64 = 1e-5;

/// Shortest round-trip text for `value`, always recognizable as a float.
pub(crate) fn push_f64(out: &mut Vec<u8>, value: f64) {
    if value.is_nan() {
        out.extend_from_slice(b"nan");
    } else if value.is_infinite() {
        out.extend_from_slice(if value > 0.0 { &b"inf"[..] } else { &b"-inf"[..] });
    } else {
        let abs = value.abs();
        let text = if abs != 0.0 && (abs >= EXPONENT_ABOVE || abs < EXPONENT_BELOW) {
            format!("{:e}", value)
        } else {
            format!("{}", value)
        };
        push_float_text(out, &text);
    }
}

fn push_float_text(out: &mut Vec<u8>, text: &str) {
    out.extend_from_slice(text.as_bytes());
    if !text.contains(|c| c == '.' || c == 'e') {
        out.extend_from_slice(b".0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float(value: f64) -> String {
        let mut out = Vec::new();
        push_f64(&mut out, value);
        String::from_utf8(out).unwrap()
    }

    fn document(style: TomlStyle, build: impl FnOnce(&mut TomlWriter) -> Result<()>) -> String {
        let options = TomlOptions::new().with_style(style);
        let mut writer = TomlWriter::new(&options);
        writer.begin_table().unwrap();
        build(&mut writer).unwrap();
        writer.end_table().unwrap();
        writer.into_string().unwrap()
    }

    #[test]
    fn test_float_text() {
        assert_eq!(float(123.0), "123.0");
        assert_eq!(float(1.5), "1.5");
        assert_eq!(float(-0.0), "-0.0");
        assert_eq!(float(5e-7), "5e-7");
        assert_eq!(float(1e16), "1e16");
        assert_eq!(float(1e15), "1000000000000000.0");
        assert_eq!(float(0.00001), "0.00001");
        assert_eq!(float(f64::INFINITY), "inf");
        assert_eq!(float(f64::NEG_INFINITY), "-inf");
        assert_eq!(float(-f64::NAN), "nan");
    }

    #[test]
    fn test_f32_shortest() {
        let mut writer = TomlWriter::standalone();
        writer.write_f32(0.1).unwrap();
        assert_eq!(writer.into_string().unwrap(), "0.1");
    }

    #[test]
    fn test_string_escapes() {
        let mut out = Vec::new();
        push_basic_string(&mut out, "a\"b\\c\nd\u{1}é");
        assert_eq!(String::from_utf8(out).unwrap(), "\"a\\\"b\\\\c\\nd\\u0001é\"");
    }

    #[test]
    fn test_keys() {
        let mut out = Vec::new();
        push_key(&mut out, "plain-key_1", false);
        out.push(b' ');
        push_key(&mut out, "with space", false);
        out.push(b' ');
        push_key(&mut out, "", false);
        out.push(b' ');
        push_key(&mut out, "42", true);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "plain-key_1 \"with space\" \"\" \"42\""
        );
    }

    #[test]
    fn test_inline_layout() {
        let out = document(TomlStyle::PLAIN, |w| {
            w.write_key("t")?;
            w.begin_table()?;
            w.write_key("a")?;
            w.write_i64(1)?;
            w.write_key("b")?;
            w.begin_array(Some(0))?;
            w.end_array()?;
            w.end_table()?;
            w.write_key("e")?;
            w.begin_table()?;
            w.end_table()
        });
        assert_eq!(out, "t = {a = 1, b = [ ]}\ne = {}\n");
    }

    #[test]
    fn test_array_of_tables_blocks() {
        let out = document(TomlStyle::HEADER_ARRAY_TABLES, |w| {
            w.write_key("Values")?;
            w.begin_array(None)?;
            for key in ["a", "b"] {
                w.begin_table()?;
                w.write_key("Key")?;
                w.write_str(key)?;
                w.end_table()?;
            }
            w.end_array()
        });
        assert_eq!(out, "[[Values]]\nKey = \"a\"\n\n[[Values]]\nKey = \"b\"\n\n");
    }

    #[test]
    fn test_sequences_without_tables_stay_inline() {
        let out = document(TomlStyle::HEADER_ARRAY_TABLES, |w| {
            w.write_key("empty")?;
            w.begin_array(None)?;
            w.end_array()?;
            w.write_key("nums")?;
            w.begin_array(None)?;
            w.write_i64(1)?;
            w.write_i64(2)?;
            w.end_array()
        });
        assert_eq!(out, "empty = [ ]\nnums = [ 1, 2 ]\n");
    }

    #[test]
    fn test_mixed_sequence_stays_inline() {
        let out = document(TomlStyle::HEADERS, |w| {
            w.write_key("shapes")?;
            w.begin_array(Some(2))?;
            w.begin_table()?;
            w.write_key("w")?;
            w.write_i64(1)?;
            w.end_table()?;
            w.write_str("empty")?;
            w.end_array()?;
            w.write_key("n")?;
            w.write_i64(3)
        });
        assert_eq!(out, "shapes = [ {w = 1}, \"empty\" ]\nn = 3\n");
    }

    #[test]
    fn test_array_tables_only_at_document_level() {
        let out = document(TomlStyle::HEADERS, |w| {
            w.write_key("server")?;
            w.begin_table()?;
            w.write_key("ports")?;
            w.begin_array(Some(1))?;
            w.begin_table()?;
            w.write_key("n")?;
            w.write_i64(80)?;
            w.end_table()?;
            w.end_array()?;
            w.end_table()
        });
        assert_eq!(out, "[server]\nports = [ {n = 80} ]\n\n");
    }

    #[test]
    fn test_unclosed_sequence_is_an_error() {
        let options = TomlOptions::headers();
        let mut writer = TomlWriter::new(&options);
        writer.begin_table().unwrap();
        writer.write_key("list").unwrap();
        writer.begin_array(None).unwrap();
        writer.begin_table().unwrap();
        writer.end_table().unwrap();
        writer.end_table().unwrap_err();
        assert!(writer.into_string().is_err());
    }

    #[test]
    fn test_plain_keys_precede_blocks() {
        let out = document(TomlStyle::HEADER_TABLES, |w| {
            w.write_key("a")?;
            w.begin_table()?;
            w.write_key("b")?;
            w.begin_table()?;
            w.write_key("c")?;
            w.write_bool(true)?;
            w.end_table()?;
            w.end_table()?;
            w.write_key("z")?;
            w.write_i64(0)
        });
        assert_eq!(out, "z = 0\n[a.b]\nc = true\n\n");
    }

    #[test]
    fn test_absent_values() {
        let mut writer = TomlWriter::new(&TomlOptions::new());
        writer.begin_table().unwrap();
        writer.write_key("gone").unwrap();
        writer.write_absent().unwrap();
        writer.write_key("kept").unwrap();
        let err = writer.write_absent_with(NullHandling::Error).unwrap_err();
        assert!(matches!(err, Error::NullValue(ref k) if k == "kept"));
    }

    #[test]
    fn test_top_level_must_be_table() {
        let mut writer = TomlWriter::new(&TomlOptions::new());
        assert!(writer.write_i64(1).is_err());
    }

    #[test]
    fn test_year_range() {
        let date = LocalDate::from_ymd(10000, 1, 1).unwrap();
        let mut writer = TomlWriter::standalone();
        assert!(matches!(
            writer.write_local_date(date),
            Err(Error::UnsupportedValue(_))
        ));
    }

    #[test]
    fn test_unsigned_overflow() {
        let mut writer = TomlWriter::standalone();
        assert!(writer.write_u64(u64::MAX).is_err());
    }

    #[test]
    fn test_state_tracking() {
        let mut writer = TomlWriter::new(&TomlOptions::headers());
        assert_eq!(writer.state(), None);
        writer.begin_table().unwrap();
        assert_eq!(writer.state(), Some(ValueState::RootKeyValue));
        writer.write_key("list").unwrap();
        writer.begin_array(Some(1)).unwrap();
        assert_eq!(writer.state(), Some(ValueState::ArrayOfTables));
        writer.begin_table().unwrap();
        writer.write_key("x").unwrap();
        writer.begin_inline_array().unwrap();
        assert_eq!(writer.state(), Some(ValueState::InlineArray));
        writer.begin_inline_table().unwrap();
        assert_eq!(writer.state(), Some(ValueState::InlineTable));
    }
}
