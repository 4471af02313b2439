//! # serde_tomlet
//!
//! A Serde-compatible TOML document engine: a byte-level parser that builds an
//! ordered value tree, a streaming writer with byte-exact number and date
//! formatting, and a process-wide cache of per-type formatters.
//!
//! ## Key Features
//!
//! - **TOML 1.0 grammar**: every string, number and date/time form, dotted keys,
//!   `[table]` and `[[array-of-tables]]` headers, with the table redefinition rules
//! - **Layout control**: tables and arrays of tables written inline or as header
//!   blocks, chosen per call with [`TomlStyle`]
//! - **Serde Compatible**: works with existing types via `#[derive(Serialize, Deserialize)]`
//! - **Zero-copy reads**: deserialization walks borrowed [`Node`] views of the tree
//! - **Formatter dispatch**: [`Resolver`] maps types to [`TomlFormatter`]s for
//!   code that does not go through serde
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! serde_tomlet = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Basic Serialization and Deserialization
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_tomlet::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User {
//!     id: 123,
//!     name: "Alice".to_string(),
//!     active: true,
//! };
//!
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, "id = 123\nname = \"Alice\"\nactive = true\n");
//!
//! let user_back: User = from_str(&text).unwrap();
//! assert_eq!(user, user_back);
//! ```
//!
//! ### Header Layout
//!
//! ```rust
//! use serde::Serialize;
//! use serde_tomlet::{to_string_with_options, TomlOptions};
//!
//! #[derive(Serialize)]
//! struct Item { key: String }
//!
//! #[derive(Serialize)]
//! struct Doc { values: Vec<Item> }
//!
//! let doc = Doc {
//!     values: vec![Item { key: "a".into() }, Item { key: "b".into() }],
//! };
//!
//! let inline = to_string_with_options(&doc, TomlOptions::new()).unwrap();
//! assert_eq!(inline, "values = [ {key = \"a\"}, {key = \"b\"} ]\n");
//!
//! let headers = to_string_with_options(&doc, TomlOptions::headers()).unwrap();
//! assert_eq!(headers, "[[values]]\nkey = \"a\"\n\n[[values]]\nkey = \"b\"\n\n");
//! ```
//!
//! ### Dynamic Values with the toml! Macro
//!
//! ```rust
//! use serde_tomlet::{toml, TomlValue};
//!
//! let data = toml!({
//!     "name": "Alice",
//!     "tags": ["rust", "serde"]
//! });
//!
//! if let TomlValue::Table(table) = data {
//!     assert_eq!(table.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! }
//! ```
//!
//! ## Dates and Times
//!
//! [`LocalDate`], [`LocalTime`], [`LocalDateTime`] and [`OffsetDateTime`] keep
//! their TOML kind through serde. Plain `chrono` types also work; they travel
//! as strings in canonical TOML form.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Integer narrowing is range-checked; nothing is silently truncated
//! - The first grammar violation aborts the parse with its line and column

pub mod datetime;
pub mod de;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod macros;
pub mod map;
pub mod node;
pub mod options;
mod parser;
mod pool;
pub mod resolver;
pub mod ser;
pub mod value;
pub mod writer;

pub use datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
pub use de::Deserializer;
pub use error::{Error, ParseErrorKind, Result};
pub use formatter::{MapKey, TomlFormatter};
pub use map::TomlMap;
pub use node::{narrow_float, narrow_integer, Document, Node};
pub use options::{NullHandling, TomlOptions, TomlStyle};
pub use resolver::Resolver;
pub use ser::{Serializer, TomlValueSerializer};
pub use value::TomlValue;
pub use writer::{TomlWriter, ValueState};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tracing::debug;

fn write_document<T>(value: &T, options: &TomlOptions) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut writer = TomlWriter::new(options);
    value.serialize(&mut Serializer::new(&mut writer))?;
    writer.finish()
}

/// Serialize any `T: Serialize` to a TOML document.
///
/// The value must serialize as a struct or map. Nested tables and arrays are
/// written inline; see [`to_string_with_options`] for header blocks.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = Point { x: 1, y: 2 };
/// assert_eq!(to_string(&point).unwrap(), "x = 1\ny = 2\n");
/// ```
///
/// # Errors
///
/// Returns an error if the value is not a table at the top level, or holds
/// something TOML cannot represent (e.g. `u64` above `i64::MAX`).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, TomlOptions::default())
}

/// Serialize any `T: Serialize` to a TOML document with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{to_string_with_options, TomlOptions, TomlStyle};
/// use serde::Serialize;
/// use std::collections::BTreeMap;
///
/// #[derive(Serialize)]
/// struct Service { name: String, env: BTreeMap<String, String> }
///
/// let mut env = BTreeMap::new();
/// env.insert("MODE".to_string(), "prod".to_string());
/// let service = Service { name: "api".into(), env };
///
/// let options = TomlOptions::new().with_style(TomlStyle::HEADER_TABLES);
/// let text = to_string_with_options(&service, options).unwrap();
/// assert_eq!(text, "name = \"api\"\n[env]\nMODE = \"prod\"\n\n");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized, or if an absent value
/// is met under [`NullHandling::Error`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: TomlOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    String::from_utf8(write_document(value, &options)?).map_err(Error::custom)
}

/// Serialize any `T: Serialize` to TOML bytes.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    write_document(value, &TomlOptions::default())
}

/// Convert any `T: Serialize` to a `TomlValue`.
///
/// Absent fields are left out. Dates and times keep their TOML kind.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{to_value, TomlValue};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: Option<i32> }
///
/// let value = to_value(&Point { x: 1, y: None }).unwrap();
/// assert!(value.is_table());
/// assert_eq!(value.get("x"), Some(&TomlValue::Integer(1)));
/// assert_eq!(value.get("y"), None);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented, or is itself absent.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<TomlValue>
where
    T: ?Sized + Serialize,
{
    ser::to_toml_value(value, NullHandling::Ignore)
}

/// Serialize one value as the inline TOML text that would follow `key = `.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::to_inline_string;
///
/// assert_eq!(to_inline_string(&vec![1, 2]).unwrap(), "[ 1, 2 ]");
/// assert_eq!(to_inline_string(&1.0).unwrap(), "1.0");
/// assert_eq!(to_inline_string("a\"b").unwrap(), "\"a\\\"b\"");
/// ```
///
/// # Errors
///
/// Returns an error if the value is absent or cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_inline_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let mut writer = TomlWriter::standalone();
    value.serialize(&mut Serializer::new(&mut writer))?;
    writer.into_string()
}

/// Serialize any `T: Serialize` to a writer in TOML format.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::to_writer;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(buffer, b"x = 1\ny = 2\n");
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
/// Nothing is written to `writer` unless serialization succeeds.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, TomlOptions::default())
}

/// Serialize any `T: Serialize` to a writer in TOML format with custom options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: TomlOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let bytes = write_document(value, &options)?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Parse a TOML document into its root table.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::parse;
///
/// let table = parse("a.b.c = \"x\"\n").unwrap();
/// let c = table.get("a").and_then(|a| a.get("b")).and_then(|b| b.get("c"));
/// assert_eq!(c.and_then(|v| v.as_str()), Some("x"));
/// ```
///
/// # Errors
///
/// Returns the first grammar or redefinition error, with its position.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(input: &str) -> Result<TomlMap> {
    parser::parse_document(input.as_bytes())
}

/// Parse TOML bytes into a navigable [`Document`].
///
/// # Errors
///
/// Returns the first grammar or redefinition error, with its position.
/// Invalid UTF-8 in strings or comments is an error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_document(input: &[u8]) -> Result<Document> {
    parser::parse_document(input).map(Document::new)
}

/// Deserialize an instance of type `T` from a string of TOML text.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("x = 1\ny = 2\n").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid TOML or cannot be deserialized
/// to type `T`. Parse errors carry line and column information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice(s.as_bytes())
}

/// Deserialize an instance of type `T` from bytes of TOML text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid TOML or cannot be deserialized
/// to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let document = parse_document(v)?;
    let value = T::deserialize(Deserializer::new(document.root()));
    debug!(ok = value.is_ok(), "deserialized TOML document");
    value
}

/// Deserialize an instance of type `T` from an I/O stream of TOML.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::from_reader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_reader(Cursor::new(b"x = 1\ny = 2\n")).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, the input is not valid TOML, or the
/// data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(&bytes)
}

/// Deserialize an instance of type `T` from a `TomlValue`.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{from_value, toml};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_value(toml!({ "x": 1, "y": 2 })).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the value's shape does not match type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: TomlValue) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(Deserializer::new(Node::new(&value)))
}

/// Deserialize an instance of type `T` from one standalone TOML value.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::from_inline_str;
///
/// let list: Vec<u8> = from_inline_str("[ 1, 2, 3 ]").unwrap();
/// assert_eq!(list, vec![1, 2, 3]);
/// ```
///
/// # Errors
///
/// Returns an error if the text is not exactly one TOML value or does not
/// match type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_inline_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = parser::parse_value(s.as_bytes())?;
    from_value(value)
}
