//! Error types for TOML parsing, serialization and deserialization.
//!
//! This module provides error reporting with enough context to locate and fix
//! problems in TOML documents and in the values being written.
//!
//! ## Error Categories
//!
//! - **Parse Errors**: Grammar violations, duplicate keys and table redefinitions,
//!   always with the line and column of the offending byte
//! - **Deserialization Errors**: A node exists but has the wrong shape for the
//!   requested type, or a number does not fit the target width
//! - **Serialization Errors**: Absent values under [`NullHandling::Error`],
//!   unsupported key kinds and values TOML cannot represent
//! - **I/O Errors**: Reader/writer failures
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::{from_str, Error, ParseErrorKind, TomlValue};
//!
//! let result: Result<TomlValue, Error> = from_str("a = 1\na = 2\n");
//! match result {
//!     Err(Error::Parse { kind, line, .. }) => {
//!         assert!(matches!(kind, ParseErrorKind::DuplicateKey(_)));
//!         assert_eq!(line, 2);
//!     }
//!     other => panic!("expected duplicate key error, got {:?}", other),
//! }
//! ```
//!
//! [`NullHandling::Error`]: crate::NullHandling::Error

use std::fmt;
use thiserror::Error;

/// The kind of grammar or structure violation found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A byte that cannot start or continue the current construct.
    UnexpectedByte(u8),
    /// Input ended in the middle of a construct.
    UnexpectedEof,
    /// A string was opened but never closed on the same line (or at all).
    UnterminatedString,
    /// An unknown escape, or a `\u`/`\U` escape that is not a Unicode scalar value.
    InvalidEscape,
    /// A malformed or out-of-range integer or float literal.
    InvalidNumber,
    /// A malformed or out-of-range date, time or offset.
    InvalidDateTime,
    /// A string, key or comment that is not valid UTF-8.
    InvalidUtf8,
    /// A control character that TOML does not allow in strings or comments.
    ControlCharacter,
    /// A key assigned twice within the same table.
    DuplicateKey(String),
    /// A table (or array of tables) defined again or extended after being closed.
    TableRedefinition(String),
    /// Something other than a comment or newline after a statement.
    ExpectedNewline,
    /// A key was expected but none was found.
    ExpectedKey,
    /// A `=` was expected after a key.
    ExpectedEquals,
    /// A value was expected but none was found.
    ExpectedValue,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedByte(b) if b.is_ascii_graphic() => {
                write!(f, "unexpected character '{}'", *b as char)
            }
            ParseErrorKind::UnexpectedByte(b) => write!(f, "unexpected byte 0x{:02x}", b),
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of input"),
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ParseErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
            ParseErrorKind::InvalidNumber => write!(f, "invalid number"),
            ParseErrorKind::InvalidDateTime => write!(f, "invalid date or time"),
            ParseErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8"),
            ParseErrorKind::ControlCharacter => write!(f, "control character not allowed"),
            ParseErrorKind::DuplicateKey(key) => write!(f, "duplicate key `{}`", key),
            ParseErrorKind::TableRedefinition(name) => {
                write!(f, "redefinition of table `{}`", name)
            }
            ParseErrorKind::ExpectedNewline => write!(f, "expected newline or comment"),
            ParseErrorKind::ExpectedKey => write!(f, "expected a key"),
            ParseErrorKind::ExpectedEquals => write!(f, "expected `=` after key"),
            ParseErrorKind::ExpectedValue => write!(f, "expected a value"),
        }
    }
}

/// Represents all possible errors that can occur while reading or writing TOML.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Grammar violation at a known position (1-based line and column)
    #[error("Parse error at line {line}, column {column}: {kind}")]
    Parse {
        kind: ParseErrorKind,
        line: usize,
        column: usize,
    },

    /// A node has the wrong shape for the requested type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A stored number does not fit into the requested width
    #[error("Number {value} is out of range for {target}")]
    NumberOutOfRange { target: &'static str, value: String },

    /// A fixed-arity target (tuple, array) received the wrong number of elements
    #[error("Invalid length: expected {expected} elements, found {found}")]
    InvalidLength { expected: usize, found: usize },

    /// A required key is absent from a table
    #[error("Missing field `{0}`")]
    MissingField(String),

    /// An absent value was written under `NullHandling::Error`
    #[error("Value for `{0}` is absent and null handling is set to error")]
    NullValue(String),

    /// A map key kind that has no TOML key representation
    #[error("Unsupported key kind: {0}")]
    UnsupportedKey(&'static str),

    /// A value TOML cannot represent
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    /// A type shape the writer cannot place at the current position
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// No formatter is registered for a type
    #[error("No formatter registered for `{0}`")]
    FormatterNotFound(&'static str),

    /// A key inserted twice into a table built outside the parser
    #[error("Duplicate key `{0}`")]
    DuplicateKey(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a parse error at a 1-based line and column.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::{Error, ParseErrorKind};
    ///
    /// let err = Error::parse(ParseErrorKind::InvalidNumber, 3, 7);
    /// assert!(err.to_string().contains("line 3"));
    /// assert_eq!(err.parse_kind(), Some(&ParseErrorKind::InvalidNumber));
    /// ```
    pub fn parse(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Error::Parse { kind, line, column }
    }

    /// Creates a type mismatch error naming the expected and actual shapes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::Error;
    ///
    /// let err = Error::type_mismatch("table", "string");
    /// assert!(err.to_string().contains("expected table"));
    /// ```
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Error::TypeMismatch { expected, found }
    }

    /// Creates a range error for a narrowing numeric conversion.
    pub fn out_of_range<V: fmt::Display>(target: &'static str, value: V) -> Self {
        Error::NumberOutOfRange {
            target,
            value: value.to_string(),
        }
    }

    /// Creates an unsupported value error.
    pub fn unsupported_value<T: fmt::Display>(msg: T) -> Self {
        Error::UnsupportedValue(msg.to_string())
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the grammar error kind if this is a parse error.
    #[must_use]
    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        match self {
            Error::Parse { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        Error::MissingField(field.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
