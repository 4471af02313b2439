//! TOML deserialization.
//!
//! This module provides the [`Deserializer`] that reads Rust values out of a
//! parsed tree. It works on borrowed [`Node`] views, so strings can be handed
//! to the visitor without copying.
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use serde_tomlet::from_str;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Data { x: i32, y: i32 }
//!
//! let data: Data = from_str("x = 1\ny = 2\n").unwrap();
//! assert_eq!(data, Data { x: 1, y: 2 });
//! ```
//!
//! ## Conversions
//!
//! Integers narrow to the requested width and fail out of range. Floats accept
//! integers; integers never accept floats. Dates and times read as their
//! canonical text when a string is requested, which is how `chrono` types
//! deserialize.

use crate::datetime::TemporalKind;
use crate::node::{narrow_float, narrow_integer, Node};
use crate::{Error, Result, TomlValue};
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

/// The TOML deserializer.
///
/// Wraps a view of one value; nested values get their own deserializer.
#[derive(Clone, Copy)]
pub struct Deserializer<'de> {
    node: Node<'de>,
}

impl<'de> Deserializer<'de> {
    pub fn new(node: Node<'de>) -> Self {
        Deserializer { node }
    }

    fn value(&self) -> &'de TomlValue {
        self.node.value()
    }

    fn temporal_text(&self) -> Option<String> {
        match self.value() {
            TomlValue::LocalDate(d) => Some(d.to_string()),
            TomlValue::LocalTime(t) => Some(t.to_string()),
            TomlValue::LocalDateTime(dt) => Some(dt.to_string()),
            TomlValue::OffsetDateTime(dt) => Some(dt.to_string()),
            _ => None,
        }
    }

    fn integer(&self) -> Result<i64> {
        self.node
            .try_get_int64()
            .ok_or_else(|| self.node.mismatch("integer"))
    }

    fn float(&self) -> Result<f64> {
        self.node
            .try_get_double()
            .ok_or_else(|| self.node.mismatch("float"))
    }
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                let value = self.integer()?;
                visitor.$visit(narrow_integer::<$ty>(value, stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value() {
            TomlValue::Boolean(b) => visitor.visit_bool(*b),
            TomlValue::Integer(i) => visitor.visit_i64(*i),
            TomlValue::Float(f) => visitor.visit_f64(*f),
            TomlValue::String(s) => visitor.visit_borrowed_str(s),
            TomlValue::LocalDate(_)
            | TomlValue::LocalTime(_)
            | TomlValue::LocalDateTime(_)
            | TomlValue::OffsetDateTime(_) => match self.temporal_text() {
                Some(text) => visitor.visit_string(text),
                None => Err(self.node.mismatch("date or time")),
            },
            TomlValue::Array(_) => visitor.visit_seq(SeqDeserializer::new(self.node)),
            TomlValue::Table(_) | TomlValue::InlineTable(_) => {
                visitor.visit_map(MapDeserializer::new(self.node))
            }
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.node.try_get_bool() {
            Some(b) => visitor.visit_bool(b),
            None => Err(self.node.mismatch("boolean")),
        }
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f32(narrow_float(self.float()?)?)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.float()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let s = self
            .node
            .try_get_string()
            .ok_or_else(|| self.node.mismatch("char"))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::unsupported_value(format!(
                "expected a single character, found {:?}",
                s
            ))),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if let Some(s) = self.node.try_get_string() {
            return visitor.visit_borrowed_str(s);
        }
        match self.temporal_text() {
            Some(text) => visitor.visit_string(text),
            None => Err(self.node.mismatch("string")),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    /// A present value is always `Some`; absent keys never reach here.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value().as_table() {
            Some(map) if map.is_empty() => visitor.visit_unit(),
            _ => Err(self.node.mismatch("empty table")),
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let Some(kind) = TemporalKind::from_newtype_name(name) else {
            return visitor.visit_newtype_struct(self);
        };
        if TemporalKind::of(self.value()) != Some(kind) {
            return Err(self.node.mismatch(kind.type_name()));
        }
        match self.temporal_text() {
            Some(text) => visitor.visit_string(text),
            None => Err(self.node.mismatch(kind.type_name())),
        }
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.node.try_get_array().is_none() {
            return Err(self.node.mismatch("array"));
        }
        visitor.visit_seq(SeqDeserializer::new(self.node))
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let found = self
            .node
            .try_get_array()
            .ok_or_else(|| self.node.mismatch("array"))?
            .len();
        if found != len {
            return Err(Error::InvalidLength {
                expected: len,
                found,
            });
        }
        visitor.visit_seq(SeqDeserializer::new(self.node))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.node.try_get_dictionary().is_none() {
            return Err(self.node.mismatch("table"));
        }
        visitor.visit_map(MapDeserializer::new(self.node))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if let Some(variant) = self.node.try_get_string() {
            return visitor.visit_enum(variant.into_deserializer());
        }
        let entry = self
            .node
            .try_get_dictionary()
            .filter(|map| map.len() == 1)
            .and_then(|_| self.node.children().next());
        match entry {
            Some(value) => visitor.visit_enum(EnumDeserializer { value }),
            None => Err(self.node.mismatch("string or single-key table")),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct SeqDeserializer<'de> {
    node: Node<'de>,
    index: usize,
}

impl<'de> SeqDeserializer<'de> {
    fn new(node: Node<'de>) -> Self {
        SeqDeserializer { node, index: 0 }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.node.get_index(self.index) {
            Some(element) => {
                self.index += 1;
                seed.deserialize(Deserializer::new(element)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.node.node_count().saturating_sub(self.index))
    }
}

struct MapDeserializer<'de> {
    node: Node<'de>,
    index: usize,
    value: Option<Node<'de>>,
}

impl<'de> MapDeserializer<'de> {
    fn new(node: Node<'de>) -> Self {
        MapDeserializer {
            node,
            index: 0,
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        let Some(map) = self.node.try_get_dictionary() else {
            return Ok(None);
        };
        let Some((key, _)) = map.get_index(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        self.value = self.node.get_child(key);
        seed.deserialize(KeyDeserializer { key }).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let value = self
            .value
            .take()
            .ok_or_else(|| Error::custom("next_value called before next_key"))?;
        seed.deserialize(Deserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.node.node_count().saturating_sub(self.index))
    }
}

/// Deserializes a table key, parsing it when a number or boolean is asked for.
struct KeyDeserializer<'de> {
    key: &'de str,
}

impl KeyDeserializer<'_> {
    fn parse<T: std::str::FromStr>(&self, expected: &'static str) -> Result<T> {
        self.key
            .parse()
            .map_err(|_| Error::type_mismatch(expected, "string key"))
    }
}

macro_rules! deserialize_parsed_key {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    deserialize_parsed_key! {
        deserialize_bool => visit_bool(bool),
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_enum(BorrowedStrDeserializer::new(self.key))
    }

    forward_to_deserialize_any! {
        str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct EnumDeserializer<'de> {
    value: Node<'de>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = VariantDeserializer<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let key = self
            .value
            .key()
            .ok_or_else(|| Error::custom("enum variant without a key"))?;
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(key))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer<'de> {
    value: Node<'de>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        de::Deserialize::deserialize(Deserializer::new(self.value))
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(Deserializer::new(self.value))
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(Deserializer::new(self.value), len, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_map(Deserializer::new(self.value), visitor)
    }
}
