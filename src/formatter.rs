//! Per-type formatters.
//!
//! A [`TomlFormatter<T>`] knows how to read a `T` from a [`Node`] and how to
//! write one through a [`TomlWriter`]. The crate ships formatters for the
//! primitive types, two generic adapters that cover every standard container
//! (sequence-of-T and map-of-K-V), and a bridge for serde-enabled types.
//! Formatters are looked up through a [`Resolver`](crate::Resolver).
//!
//! ## Custom formatters
//!
//! ```rust
//! use serde_tomlet::formatter::{deserialize_field, serialize_field, TomlFormatter};
//! use serde_tomlet::{Node, Resolver, Result, TomlOptions, TomlWriter};
//!
//! struct Endpoint { host: String, port: u16 }
//!
//! struct EndpointFormatter;
//!
//! impl TomlFormatter<Endpoint> for EndpointFormatter {
//!     fn deserialize(&self, node: Node<'_>, options: &TomlOptions) -> Result<Endpoint> {
//!         let resolver = options.resolver();
//!         Ok(Endpoint {
//!             host: deserialize_field(node, "host", &*resolver.resolve::<String>()?, options)?,
//!             port: deserialize_field(node, "port", &*resolver.resolve::<u16>()?, options)?,
//!         })
//!     }
//!
//!     fn serialize(&self, writer: &mut TomlWriter, value: &Endpoint, options: &TomlOptions) -> Result<()> {
//!         let resolver = options.resolver();
//!         writer.begin_table()?;
//!         serialize_field(writer, "host", Some(&value.host), &*resolver.resolve::<String>()?, options, None)?;
//!         serialize_field(writer, "port", Some(&value.port), &*resolver.resolve::<u16>()?, options, None)?;
//!         writer.end_table()
//!     }
//! }
//!
//! let resolver = Resolver::global();
//! resolver.register::<Endpoint, _>(EndpointFormatter);
//!
//! let options = TomlOptions::new();
//! let text = resolver.to_string(&Endpoint { host: "db".into(), port: 5432 }, &options).unwrap();
//! assert_eq!(text, "host = \"db\"\nport = 5432\n");
//!
//! let back: Endpoint = resolver.from_str(&text, &options).unwrap();
//! assert_eq!(back.port, 5432);
//! ```

use crate::datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::de::Deserializer;
use crate::node::{narrow_float, narrow_integer};
use crate::options::NullHandling;
use crate::ser::Serializer;
use crate::{Error, Node, Result, TomlOptions, TomlWriter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Reads and writes values of one type.
pub trait TomlFormatter<T>: Send + Sync {
    fn deserialize(&self, node: Node<'_>, options: &TomlOptions) -> Result<T>;

    fn serialize(&self, writer: &mut TomlWriter, value: &T, options: &TomlOptions) -> Result<()>;
}

pub struct BoolFormatter;

impl TomlFormatter<bool> for BoolFormatter {
    fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<bool> {
        node.try_get_bool().ok_or_else(|| node.mismatch("boolean"))
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &bool, _options: &TomlOptions) -> Result<()> {
        writer.write_bool(*value)
    }
}

/// Every integer width, read as `i64` and narrowed with a range check.
pub struct IntegerFormatter;

macro_rules! integer_formatter {
    ($($ty:ty),*) => {
        $(
            impl TomlFormatter<$ty> for IntegerFormatter {
                fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<$ty> {
                    let value = node.try_get_int64().ok_or_else(|| node.mismatch("integer"))?;
                    narrow_integer(value, stringify!($ty))
                }

                fn serialize(
                    &self,
                    writer: &mut TomlWriter,
                    value: &$ty,
                    _options: &TomlOptions,
                ) -> Result<()> {
                    let value = i64::try_from(*value).map_err(|_| {
                        Error::unsupported_value(format!("integer {} does not fit in i64", value))
                    })?;
                    writer.write_i64(value)
                }
            }
        )*
    };
}

integer_formatter!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// `f64` and `f32`. Integers are accepted and widened.
pub struct FloatFormatter;

impl TomlFormatter<f64> for FloatFormatter {
    fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<f64> {
        node.try_get_double().ok_or_else(|| node.mismatch("float"))
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &f64, _options: &TomlOptions) -> Result<()> {
        writer.write_f64(*value)
    }
}

impl TomlFormatter<f32> for FloatFormatter {
    fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<f32> {
        narrow_float(node.try_get_double().ok_or_else(|| node.mismatch("float"))?)
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &f32, _options: &TomlOptions) -> Result<()> {
        writer.write_f32(*value)
    }
}

pub struct CharFormatter;

impl TomlFormatter<char> for CharFormatter {
    fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<char> {
        let s = node.try_get_string().ok_or_else(|| node.mismatch("char"))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::unsupported_value(format!(
                "expected a single character, found {:?}",
                s
            ))),
        }
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &char, _options: &TomlOptions) -> Result<()> {
        writer.write_str(value.encode_utf8(&mut [0; 4]))
    }
}

pub struct StringFormatter;

impl TomlFormatter<String> for StringFormatter {
    fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<String> {
        node.try_get_string()
            .map(str::to_string)
            .ok_or_else(|| node.mismatch("string"))
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &String, _options: &TomlOptions) -> Result<()> {
        writer.write_str(value)
    }
}

/// The four date/time kinds. Each reads only its own kind.
pub struct TemporalFormatter;

macro_rules! temporal_formatter {
    ($($ty:ty => $get:ident, $write:ident, $name:literal;)*) => {
        $(
            impl TomlFormatter<$ty> for TemporalFormatter {
                fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<$ty> {
                    node.$get().ok_or_else(|| node.mismatch($name))
                }

                fn serialize(
                    &self,
                    writer: &mut TomlWriter,
                    value: &$ty,
                    _options: &TomlOptions,
                ) -> Result<()> {
                    writer.$write(*value)
                }
            }
        )*
    };
}

temporal_formatter! {
    LocalDate => try_get_date_only, write_local_date, "local date";
    LocalTime => try_get_time_only, write_local_time, "local time";
    LocalDateTime => try_get_date_time, write_local_date_time, "local date-time";
    OffsetDateTime => try_get_date_time_offset, write_offset_date_time, "offset date-time";
}

/// Any collection built from and iterated as a sequence of `T`.
///
/// Covers `Vec`, `VecDeque`, `LinkedList`, `HashSet`, `BTreeSet`,
/// `BinaryHeap` and any user collection with the same two impls.
pub struct SequenceFormatter<C, T> {
    element: Arc<dyn TomlFormatter<T>>,
    marker: PhantomData<fn() -> C>,
}

impl<C, T> SequenceFormatter<C, T> {
    pub fn new(element: Arc<dyn TomlFormatter<T>>) -> Self {
        SequenceFormatter {
            element,
            marker: PhantomData,
        }
    }
}

impl<C, T> TomlFormatter<C> for SequenceFormatter<C, T>
where
    C: FromIterator<T>,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    fn deserialize(&self, node: Node<'_>, options: &TomlOptions) -> Result<C> {
        if node.try_get_array().is_none() {
            return Err(node.mismatch("array"));
        }
        node.children()
            .map(|element| self.element.deserialize(element, options))
            .collect()
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &C, options: &TomlOptions) -> Result<()> {
        let items = value.into_iter();
        let len = match items.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower),
            _ => None,
        };
        writer.begin_array(len)?;
        for item in items {
            self.element.serialize(writer, item, options)?;
        }
        writer.end_array()
    }
}

/// Map keys and their canonical key text.
pub trait MapKey: Sized {
    fn to_key_text(&self) -> String;

    fn from_key_text(text: &str) -> Result<Self>;

    /// Whether the key started out as text; non-string keys are quoted
    /// inside inline tables.
    fn is_string() -> bool {
        false
    }
}

impl MapKey for String {
    fn to_key_text(&self) -> String {
        self.clone()
    }

    fn from_key_text(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }

    fn is_string() -> bool {
        true
    }
}

impl MapKey for char {
    fn to_key_text(&self) -> String {
        self.to_string()
    }

    fn from_key_text(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::type_mismatch("char", "string key")),
        }
    }

    fn is_string() -> bool {
        true
    }
}

macro_rules! parsed_map_key {
    ($($ty:ty),*) => {
        $(
            impl MapKey for $ty {
                fn to_key_text(&self) -> String {
                    self.to_string()
                }

                fn from_key_text(text: &str) -> Result<Self> {
                    text.parse()
                        .map_err(|_| Error::type_mismatch(stringify!($ty), "string key"))
                }
            }
        )*
    };
}

parsed_map_key!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
parsed_map_key!(LocalDate, LocalTime, LocalDateTime, OffsetDateTime);

/// Any map built from and iterated as `(K, V)` pairs.
///
/// Covers `HashMap`, `BTreeMap`, `IndexMap` and any user map with the same
/// two impls.
pub struct MapFormatter<M, K, V> {
    value: Arc<dyn TomlFormatter<V>>,
    marker: PhantomData<fn() -> (M, K)>,
}

impl<M, K, V> MapFormatter<M, K, V> {
    pub fn new(value: Arc<dyn TomlFormatter<V>>) -> Self {
        MapFormatter {
            value,
            marker: PhantomData,
        }
    }
}

impl<M, K, V> TomlFormatter<M> for MapFormatter<M, K, V>
where
    M: FromIterator<(K, V)>,
    for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
    K: MapKey,
{
    fn deserialize(&self, node: Node<'_>, options: &TomlOptions) -> Result<M> {
        if node.try_get_dictionary().is_none() {
            return Err(node.mismatch("table"));
        }
        node.children()
            .map(|entry| {
                let key = entry
                    .key()
                    .ok_or_else(|| Error::custom("table entry without a key"))?;
                Ok((K::from_key_text(key)?, self.value.deserialize(entry, options)?))
            })
            .collect()
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &M, options: &TomlOptions) -> Result<()> {
        writer.begin_table()?;
        for (key, item) in value {
            let text = key.to_key_text();
            if K::is_string() {
                writer.write_key(&text)?;
            } else {
                writer.write_non_string_key(&text)?;
            }
            self.value.serialize(writer, item, options)?;
        }
        writer.end_table()
    }
}

/// Formats any serde-enabled type through the crate's serde front-end.
pub struct SerdeFormatter<T>(PhantomData<fn() -> T>);

impl<T> SerdeFormatter<T> {
    pub fn new() -> Self {
        SerdeFormatter(PhantomData)
    }
}

impl<T> Default for SerdeFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TomlFormatter<T> for SerdeFormatter<T>
where
    T: Serialize + DeserializeOwned,
{
    fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<T> {
        T::deserialize(Deserializer::new(node))
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &T, _options: &TomlOptions) -> Result<()> {
        value.serialize(&mut Serializer::new(writer))
    }
}

/// Writes one field of a record.
///
/// `None` is an absent value, dropped or rejected according to
/// `null_handling`, or the options' policy when that is `None`.
pub fn serialize_field<T>(
    writer: &mut TomlWriter,
    key: &str,
    value: Option<&T>,
    formatter: &dyn TomlFormatter<T>,
    options: &TomlOptions,
    null_handling: Option<NullHandling>,
) -> Result<()> {
    writer.write_key(key)?;
    match value {
        Some(value) => formatter.serialize(writer, value, options),
        None => writer.write_absent_with(null_handling.unwrap_or(options.null_handling)),
    }
}

/// Reads a required field of a record.
pub fn deserialize_field<T>(
    node: Node<'_>,
    key: &str,
    formatter: &dyn TomlFormatter<T>,
    options: &TomlOptions,
) -> Result<T> {
    match node.get_child(key) {
        Some(child) => formatter.deserialize(child, options),
        None => Err(Error::MissingField(key.to_string())),
    }
}

/// Reads a field that may be absent.
pub fn deserialize_optional_field<T>(
    node: Node<'_>,
    key: &str,
    formatter: &dyn TomlFormatter<T>,
    options: &TomlOptions,
) -> Result<Option<T>> {
    node.get_child(key)
        .map(|child| formatter.deserialize(child, options))
        .transpose()
}
