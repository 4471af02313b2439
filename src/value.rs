//! Dynamic value representation for TOML data.
//!
//! This module provides the [`TomlValue`] enum which represents any valid TOML value.
//! It's useful for working with TOML data when the structure isn't known at compile time.
//!
//! ## Core Types
//!
//! - [`TomlValue`]: booleans, integers, floats, strings, the four date/time kinds,
//!   arrays, tables and inline tables
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use serde_tomlet::TomlValue;
//!
//! let boolean = TomlValue::from(true);
//! let number = TomlValue::from(42);
//! let text = TomlValue::from("hello");
//!
//! use serde_tomlet::toml;
//! let table = toml!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(table.is_table());
//! ```
//!
//! ### Parsing a Standalone Value
//!
//! ```rust
//! use serde_tomlet::TomlValue;
//!
//! let value: TomlValue = "[ 1, 2.5, \"three\" ]".parse().unwrap();
//! assert_eq!(value.node_count(), 3);
//! assert_eq!(value.to_string(), "[ 1, 2.5, \"three\" ]");
//! ```
//!
//! ### Extracting Values
//!
//! ```rust
//! use serde_tomlet::TomlValue;
//! use std::convert::TryFrom;
//!
//! let value = TomlValue::from(42);
//! let num: i64 = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```

use crate::datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::{Error, TomlMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A dynamically-typed representation of any valid TOML value.
///
/// `Table` and `InlineTable` hold the same data. The distinction records how a
/// table was written: an inline table is closed once built, and the writer keeps
/// it inline whatever style is requested.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{TomlMap, TomlValue};
///
/// let num = TomlValue::Integer(42);
/// let text = TomlValue::String("hello".to_string());
/// let table = TomlValue::Table(TomlMap::new());
///
/// assert!(num.is_integer());
/// assert!(text.is_string());
/// assert!(table.is_table());
/// assert!(!num.is_table());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum TomlValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    LocalDate(LocalDate),
    LocalTime(LocalTime),
    LocalDateTime(LocalDateTime),
    OffsetDateTime(OffsetDateTime),
    Array(Vec<TomlValue>),
    Table(TomlMap),
    InlineTable(TomlMap),
}

impl Default for TomlValue {
    /// An empty table, the value of an empty document.
    fn default() -> Self {
        TomlValue::Table(TomlMap::new())
    }
}

impl TomlValue {
    /// The name of this value's kind, as used in error messages.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::TomlValue;
    ///
    /// assert_eq!(TomlValue::from(1.5).type_name(), "float");
    /// assert_eq!(TomlValue::Array(vec![]).type_name(), "array");
    /// ```
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            TomlValue::Boolean(_) => "boolean",
            TomlValue::Integer(_) => "integer",
            TomlValue::Float(_) => "float",
            TomlValue::String(_) => "string",
            TomlValue::LocalDate(_) => "local date",
            TomlValue::LocalTime(_) => "local time",
            TomlValue::LocalDateTime(_) => "local date-time",
            TomlValue::OffsetDateTime(_) => "offset date-time",
            TomlValue::Array(_) => "array",
            TomlValue::Table(_) => "table",
            TomlValue::InlineTable(_) => "inline table",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, TomlValue::Boolean(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, TomlValue::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, TomlValue::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, TomlValue::String(_))
    }

    /// Returns `true` for any of the four date/time kinds.
    #[inline]
    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(
            self,
            TomlValue::LocalDate(_)
                | TomlValue::LocalTime(_)
                | TomlValue::LocalDateTime(_)
                | TomlValue::OffsetDateTime(_)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, TomlValue::Array(_))
    }

    /// Returns `true` for both tables and inline tables.
    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, TomlValue::Table(_) | TomlValue::InlineTable(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_inline_table(&self) -> bool {
        matches!(self, TomlValue::InlineTable(_))
    }

    /// `true` for scalar-bearing values, `false` for arrays and tables.
    #[inline]
    #[must_use]
    pub const fn has_value(&self) -> bool {
        !matches!(
            self,
            TomlValue::Array(_) | TomlValue::Table(_) | TomlValue::InlineTable(_)
        )
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TomlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TomlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::TomlValue;
    ///
    /// assert_eq!(TomlValue::from(2).as_float(), Some(2.0));
    /// assert_eq!(TomlValue::from(2.5).as_float(), Some(2.5));
    /// assert_eq!(TomlValue::from("2").as_float(), None);
    /// ```
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            TomlValue::Float(f) => Some(*f),
            TomlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TomlValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<TomlValue>> {
        match self {
            TomlValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns the entries of a table or inline table.
    #[must_use]
    pub fn as_table(&self) -> Option<&TomlMap> {
        match self {
            TomlValue::Table(map) | TomlValue::InlineTable(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` in a table; `None` for other kinds.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TomlValue> {
        self.as_table().and_then(|map| map.get(key))
    }

    /// Number of children: entries of a table, elements of an array, zero for scalars.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            TomlValue::Array(arr) => arr.len(),
            TomlValue::Table(map) | TomlValue::InlineTable(map) => map.len(),
            _ => 0,
        }
    }
}

impl fmt::Display for TomlValue {
    /// Writes the value as inline TOML, the form it takes after `key = `.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::to_inline_string(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for TomlValue {
    type Err = Error;

    /// Parses one standalone TOML value such as `42`, `"text"` or `{a = 1}`.
    fn from_str(s: &str) -> crate::Result<Self> {
        crate::parser::parse_value(s.as_bytes())
    }
}

impl Serialize for TomlValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TomlValue::Boolean(b) => serializer.serialize_bool(*b),
            TomlValue::Integer(i) => serializer.serialize_i64(*i),
            TomlValue::Float(f) => serializer.serialize_f64(*f),
            TomlValue::String(s) => serializer.serialize_str(s),
            TomlValue::LocalDate(d) => d.serialize(serializer),
            TomlValue::LocalTime(t) => t.serialize(serializer),
            TomlValue::LocalDateTime(dt) => dt.serialize(serializer),
            TomlValue::OffsetDateTime(dt) => dt.serialize(serializer),
            TomlValue::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            TomlValue::Table(map) | TomlValue::InlineTable(map) => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for TomlValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct TomlValueVisitor;

        impl<'de> Visitor<'de> for TomlValueVisitor {
            type Value = TomlValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid TOML value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(TomlValue::Boolean(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(TomlValue::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(TomlValue::Integer)
                    .map_err(|_| E::custom(format!("integer {} does not fit in i64", value)))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(TomlValue::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(TomlValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(TomlValue::String(value))
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(TomlValue::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = TomlMap::new();
                while let Some((key, value)) = map.next_entry::<String, TomlValue>()? {
                    values.try_insert(key, value).map_err(de::Error::custom)?;
                }
                Ok(TomlValue::Table(values))
            }
        }

        deserializer.deserialize_any(TomlValueVisitor)
    }
}

impl TryFrom<TomlValue> for i64 {
    type Error = Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        match value {
            TomlValue::Integer(i) => Ok(i),
            other => Err(Error::type_mismatch("integer", other.type_name())),
        }
    }
}

impl TryFrom<TomlValue> for f64 {
    type Error = Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        value
            .as_float()
            .ok_or_else(|| Error::type_mismatch("float", value.type_name()))
    }
}

impl TryFrom<TomlValue> for bool {
    type Error = Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        match value {
            TomlValue::Boolean(b) => Ok(b),
            other => Err(Error::type_mismatch("boolean", other.type_name())),
        }
    }
}

impl TryFrom<TomlValue> for String {
    type Error = Error;

    fn try_from(value: TomlValue) -> crate::Result<Self> {
        match value {
            TomlValue::String(s) => Ok(s),
            other => Err(Error::type_mismatch("string", other.type_name())),
        }
    }
}

impl From<bool> for TomlValue {
    fn from(value: bool) -> Self {
        TomlValue::Boolean(value)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for TomlValue {
                fn from(value: $ty) -> Self {
                    TomlValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for TomlValue {
    fn from(value: f32) -> Self {
        TomlValue::Float(f64::from(value))
    }
}

impl From<f64> for TomlValue {
    fn from(value: f64) -> Self {
        TomlValue::Float(value)
    }
}

impl From<&str> for TomlValue {
    fn from(value: &str) -> Self {
        TomlValue::String(value.to_string())
    }
}

impl From<String> for TomlValue {
    fn from(value: String) -> Self {
        TomlValue::String(value)
    }
}

impl From<Vec<TomlValue>> for TomlValue {
    fn from(value: Vec<TomlValue>) -> Self {
        TomlValue::Array(value)
    }
}

impl From<TomlMap> for TomlValue {
    fn from(value: TomlMap) -> Self {
        TomlValue::Table(value)
    }
}
