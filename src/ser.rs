//! TOML serialization.
//!
//! This module provides the [`Serializer`] that drives a [`TomlWriter`] from
//! any `Serialize` value, and the value serializer behind [`crate::to_value`].
//!
//! ## Mapping
//!
//! - Structs and maps become tables; the top-level value must be one of them.
//! - Sequences, tuples and byte slices become arrays.
//! - `None` is an absent value, handled by [`NullHandling`]; `()` and unit
//!   structs are empty inline tables.
//! - Unit variants are strings; other variants become a one-entry table keyed
//!   by the variant name.
//! - Map keys may be strings, chars, integers, booleans, floats or dates.
//!
//! ## Direct Serializer Usage
//!
//! ```rust
//! use serde_tomlet::{Serializer, TomlOptions, TomlWriter};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let options = TomlOptions::new();
//! let mut writer = TomlWriter::new(&options);
//! Point { x: 1, y: 2 }.serialize(&mut Serializer::new(&mut writer)).unwrap();
//!
//! assert_eq!(writer.into_string().unwrap(), "x = 1\ny = 2\n");
//! ```

use crate::datetime::TemporalKind;
use crate::options::NullHandling;
use crate::writer::push_f64;
use crate::{Error, Result, TomlMap, TomlValue, TomlWriter};
use serde::ser::{Impossible, SerializeSeq};
use serde::{ser, Serialize};

/// The TOML serializer.
///
/// Borrows a [`TomlWriter`] for the duration of one `serialize` call; the
/// writer carries the style and null handling.
pub struct Serializer<'w> {
    writer: &'w mut TomlWriter,
}

impl<'w> Serializer<'w> {
    pub fn new(writer: &'w mut TomlWriter) -> Self {
        Serializer { writer }
    }

    fn write_temporal<T>(&mut self, kind: TemporalKind, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let text = temporal_text(kind, value)?;
        self.writer.write_value(&kind.parse(&text)?)
    }
}

/// Recovers the canonical text a date/time newtype serializes through.
fn temporal_text<T>(kind: TemporalKind, value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    match value.serialize(TomlValueSerializer::default())? {
        Some(TomlValue::String(text)) => Ok(text),
        _ => Err(Error::type_mismatch(kind.type_name(), "non-string")),
    }
}

impl<'a, 'w> ser::Serializer for &'a mut Serializer<'w> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = SeqSerializer<'a, 'w>;
    type SerializeTuple = SeqSerializer<'a, 'w>;
    type SerializeTupleStruct = SeqSerializer<'a, 'w>;
    type SerializeTupleVariant = SeqSerializer<'a, 'w>;
    type SerializeMap = MapSerializer<'a, 'w>;
    type SerializeStruct = MapSerializer<'a, 'w>;
    type SerializeStructVariant = MapSerializer<'a, 'w>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.writer.write_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.writer.write_i64(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.writer.write_i64(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.writer.write_i64(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.writer.write_i64(v)
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        let v = i64::try_from(v).map_err(|_| {
            Error::unsupported_value(format!("integer {} does not fit in i64", v))
        })?;
        self.writer.write_i64(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.writer.write_i64(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.writer.write_i64(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.writer.write_i64(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.writer.write_u64(v)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        let v = u64::try_from(v).map_err(|_| {
            Error::unsupported_value(format!("integer {} does not fit in i64", v))
        })?;
        self.writer.write_u64(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.writer.write_f32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.writer.write_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.writer.write_str(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.writer.write_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        let mut seq = self.serialize_seq(Some(v.len()))?;
        for byte in v {
            seq.serialize_element(byte)?;
        }
        seq.end()
    }

    fn serialize_none(self) -> Result<()> {
        self.writer.write_absent()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.writer.begin_inline_table()?;
        self.writer.end_table()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.writer.write_str(variant)
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match TemporalKind::from_newtype_name(name) {
            Some(kind) => self.write_temporal(kind, value),
            None => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.writer.begin_table()?;
        self.writer.write_key(variant)?;
        value.serialize(&mut *self)?;
        self.writer.end_table()
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer<'a, 'w>> {
        self.writer.begin_array(len)?;
        Ok(SeqSerializer {
            ser: self,
            variant: false,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer<'a, 'w>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqSerializer<'a, 'w>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqSerializer<'a, 'w>> {
        self.writer.begin_table()?;
        self.writer.write_key(variant)?;
        self.writer.begin_array(Some(len))?;
        Ok(SeqSerializer {
            ser: self,
            variant: true,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer<'a, 'w>> {
        self.writer.begin_table()?;
        Ok(MapSerializer {
            ser: self,
            variant: false,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapSerializer<'a, 'w>> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<MapSerializer<'a, 'w>> {
        self.writer.begin_table()?;
        self.writer.write_key(variant)?;
        self.writer.begin_table()?;
        Ok(MapSerializer {
            ser: self,
            variant: true,
        })
    }
}

/// Writes the elements of a sequence, tuple or tuple variant.
pub struct SeqSerializer<'a, 'w> {
    ser: &'a mut Serializer<'w>,
    variant: bool,
}

impl SeqSerializer<'_, '_> {
    fn element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn close(self) -> Result<()> {
        self.ser.writer.end_array()?;
        if self.variant {
            self.ser.writer.end_table()?;
        }
        Ok(())
    }
}

impl ser::SerializeSeq for SeqSerializer<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeTuple for SeqSerializer<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeTupleStruct for SeqSerializer<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeTupleVariant for SeqSerializer<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

/// Writes the entries of a map, struct or struct variant.
pub struct MapSerializer<'a, 'w> {
    ser: &'a mut Serializer<'w>,
    variant: bool,
}

impl MapSerializer<'_, '_> {
    fn field<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.ser.writer.write_key(key)?;
        value.serialize(&mut *self.ser)
    }

    fn close(self) -> Result<()> {
        self.ser.writer.end_table()?;
        if self.variant {
            self.ser.writer.end_table()?;
        }
        Ok(())
    }
}

impl ser::SerializeMap for MapSerializer<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match key.serialize(MapKeySerializer)? {
            KeyText::String(text) => self.ser.writer.write_key(&text),
            KeyText::NonString(text) => self.ser.writer.write_non_string_key(&text),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeStruct for MapSerializer<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

impl ser::SerializeStructVariant for MapSerializer<'_, '_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.close()
    }
}

/// A serialized map key and whether it started out as a string.
#[derive(Debug, PartialEq)]
pub(crate) enum KeyText {
    String(String),
    NonString(String),
}

impl KeyText {
    pub(crate) fn into_string(self) -> String {
        match self {
            KeyText::String(text) | KeyText::NonString(text) => text,
        }
    }
}

/// Turns a map key into its TOML key text.
pub(crate) struct MapKeySerializer;

fn non_string<T: ToString>(value: T) -> Result<KeyText> {
    Ok(KeyText::NonString(value.to_string()))
}

impl ser::Serializer for MapKeySerializer {
    type Ok = KeyText;
    type Error = Error;

    type SerializeSeq = Impossible<KeyText, Error>;
    type SerializeTuple = Impossible<KeyText, Error>;
    type SerializeTupleStruct = Impossible<KeyText, Error>;
    type SerializeTupleVariant = Impossible<KeyText, Error>;
    type SerializeMap = Impossible<KeyText, Error>;
    type SerializeStruct = Impossible<KeyText, Error>;
    type SerializeStructVariant = Impossible<KeyText, Error>;

    fn serialize_bool(self, v: bool) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_i8(self, v: i8) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_i16(self, v: i16) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_i32(self, v: i32) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_i64(self, v: i64) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_i128(self, v: i128) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_u8(self, v: u8) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_u16(self, v: u16) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_u32(self, v: u32) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_u64(self, v: u64) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_u128(self, v: u128) -> Result<KeyText> {
        non_string(v)
    }

    fn serialize_f32(self, v: f32) -> Result<KeyText> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<KeyText> {
        let mut out = Vec::new();
        push_f64(&mut out, v);
        String::from_utf8(out)
            .map(KeyText::NonString)
            .map_err(Error::custom)
    }

    fn serialize_char(self, v: char) -> Result<KeyText> {
        Ok(KeyText::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<KeyText> {
        Ok(KeyText::String(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<KeyText> {
        Err(Error::UnsupportedKey("bytes"))
    }

    fn serialize_none(self) -> Result<KeyText> {
        Err(Error::UnsupportedKey("none"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<KeyText>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<KeyText> {
        Err(Error::UnsupportedKey("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<KeyText> {
        Err(Error::UnsupportedKey("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<KeyText> {
        Ok(KeyText::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<KeyText>
    where
        T: ?Sized + Serialize,
    {
        match TemporalKind::from_newtype_name(name) {
            Some(kind) => {
                let text = temporal_text(kind, value)?;
                // Normalize through the parser so the key uses canonical form.
                Ok(KeyText::NonString(kind.parse(&text)?.to_string()))
            }
            None => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<KeyText>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::UnsupportedKey("enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::UnsupportedKey("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::UnsupportedKey("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::UnsupportedKey("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::UnsupportedKey("enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::UnsupportedKey("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::UnsupportedKey("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::UnsupportedKey("enum variant"))
    }
}

/// Builds a [`TomlValue`] tree instead of text.
///
/// `Ok(None)` stands for an absent value; containers drop or reject it
/// according to the configured [`NullHandling`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TomlValueSerializer {
    null_handling: NullHandling,
}

impl TomlValueSerializer {
    pub fn new(null_handling: NullHandling) -> Self {
        TomlValueSerializer { null_handling }
    }
}

pub struct SerializeVec {
    vec: Vec<TomlValue>,
    null_handling: NullHandling,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: TomlMap,
    current_key: Option<String>,
    null_handling: NullHandling,
    variant: Option<&'static str>,
}

fn wrap_variant(variant: Option<&'static str>, value: TomlValue) -> TomlValue {
    match variant {
        Some(name) => {
            let mut outer = TomlMap::with_capacity(1);
            outer.insert(name.to_string(), value);
            TomlValue::Table(outer)
        }
        None => value,
    }
}

impl ser::Serializer for TomlValueSerializer {
    type Ok = Option<TomlValue>;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Boolean(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Integer(v.into())))
    }

    fn serialize_i16(self, v: i16) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Integer(v.into())))
    }

    fn serialize_i32(self, v: i32) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Integer(v.into())))
    }

    fn serialize_i64(self, v: i64) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Integer(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Option<TomlValue>> {
        i64::try_from(v)
            .map(|v| Some(TomlValue::Integer(v)))
            .map_err(|_| Error::unsupported_value(format!("integer {} does not fit in i64", v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Integer(v.into())))
    }

    fn serialize_u16(self, v: u16) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Integer(v.into())))
    }

    fn serialize_u32(self, v: u32) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Integer(v.into())))
    }

    fn serialize_u64(self, v: u64) -> Result<Option<TomlValue>> {
        i64::try_from(v)
            .map(|v| Some(TomlValue::Integer(v)))
            .map_err(|_| Error::unsupported_value(format!("integer {} does not fit in i64", v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Option<TomlValue>> {
        i64::try_from(v)
            .map(|v| Some(TomlValue::Integer(v)))
            .map_err(|_| Error::unsupported_value(format!("integer {} does not fit in i64", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Float(v.into())))
    }

    fn serialize_f64(self, v: f64) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::String(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::String(v.to_string())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Option<TomlValue>> {
        let vec = v.iter().map(|&b| TomlValue::Integer(b.into())).collect();
        Ok(Some(TomlValue::Array(vec)))
    }

    fn serialize_none(self) -> Result<Option<TomlValue>> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Option<TomlValue>>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::InlineTable(TomlMap::new())))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Option<TomlValue>> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Option<TomlValue>> {
        Ok(Some(TomlValue::String(variant.to_string())))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Option<TomlValue>>
    where
        T: ?Sized + Serialize,
    {
        match TemporalKind::from_newtype_name(name) {
            Some(kind) => {
                let text = temporal_text(kind, value)?;
                kind.parse(&text).map(Some)
            }
            None => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Option<TomlValue>>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(self)?.ok_or(Error::NullValue(variant.to_string()))?;
        Ok(Some(wrap_variant(Some(variant), inner)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
            null_handling: self.null_handling,
            variant: None,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        let mut seq = self.serialize_seq(Some(len))?;
        seq.variant = Some(variant);
        Ok(seq)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            map: TomlMap::new(),
            current_key: None,
            null_handling: self.null_handling,
            variant: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeMap> {
        let mut map = self.serialize_map(Some(len))?;
        map.variant = Some(variant);
        Ok(map)
    }
}

impl SerializeVec {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match value.serialize(TomlValueSerializer::new(self.null_handling))? {
            Some(value) => {
                self.vec.push(value);
                Ok(())
            }
            None => Err(Error::unsupported_value(
                "an absent value can only be omitted from a table",
            )),
        }
    }

    fn finish(self) -> Result<Option<TomlValue>> {
        Ok(Some(wrap_variant(self.variant, TomlValue::Array(self.vec))))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Option<TomlValue>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<TomlValue>> {
        self.finish()
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Option<TomlValue>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<TomlValue>> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Option<TomlValue>;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<TomlValue>> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Option<TomlValue>;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<TomlValue>> {
        self.finish()
    }
}

impl SerializeMap {
    fn entry<T>(&mut self, key: String, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match value.serialize(TomlValueSerializer::new(self.null_handling))? {
            Some(value) => self.map.try_insert(key, value),
            None if self.null_handling == NullHandling::Ignore => Ok(()),
            None => Err(Error::NullValue(key)),
        }
    }

    fn finish(self) -> Result<Option<TomlValue>> {
        Ok(Some(wrap_variant(self.variant, TomlValue::Table(self.map))))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Option<TomlValue>;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(key.serialize(MapKeySerializer)?.into_string());
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.entry(key, value)
    }

    fn end(self) -> Result<Option<TomlValue>> {
        self.finish()
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Option<TomlValue>;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.entry(key.to_string(), value)
    }

    fn end(self) -> Result<Option<TomlValue>> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Option<TomlValue>;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.entry(key.to_string(), value)
    }

    fn end(self) -> Result<Option<TomlValue>> {
        self.finish()
    }
}

/// Converts `value` into a tree, failing if the value itself is absent.
pub(crate) fn to_toml_value<T>(value: &T, null_handling: NullHandling) -> Result<TomlValue>
where
    T: ?Sized + Serialize,
{
    value
        .serialize(TomlValueSerializer::new(null_handling))?
        .ok_or_else(|| Error::unsupported_value("an absent value has no TOML representation"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TomlOptions;
    use std::collections::BTreeMap;

    fn write<T: Serialize>(value: &T, options: &TomlOptions) -> Result<String> {
        let mut writer = TomlWriter::new(options);
        value.serialize(&mut Serializer::new(&mut writer))?;
        writer.into_string()
    }

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Rect { w: i32, h: i32 },
        Pair(i32, i32),
    }

    #[test]
    fn test_enum_variants() {
        #[derive(Serialize)]
        struct Doc {
            a: Shape,
            b: Shape,
            c: Shape,
            d: Shape,
        }
        let doc = Doc {
            a: Shape::Empty,
            b: Shape::Circle(1.5),
            c: Shape::Rect { w: 2, h: 3 },
            d: Shape::Pair(4, 5),
        };
        assert_eq!(
            write(&doc, &TomlOptions::new()).unwrap(),
            "a = \"Empty\"\nb = {Circle = 1.5}\nc = {Rect = {w = 2, h = 3}}\nd = {Pair = [ 4, 5 ]}\n"
        );
    }

    #[test]
    fn test_non_string_keys() {
        let mut map = BTreeMap::new();
        map.insert(1, "one");
        map.insert(2, "two");
        #[derive(Serialize)]
        struct Doc {
            m: BTreeMap<i32, &'static str>,
        }
        assert_eq!(
            write(&Doc { m: map.clone() }, &TomlOptions::new()).unwrap(),
            "m = {\"1\" = \"one\", \"2\" = \"two\"}\n"
        );
        assert_eq!(write(&map, &TomlOptions::new()).unwrap(), "1 = \"one\"\n2 = \"two\"\n");
    }

    #[test]
    fn test_rejected_keys() {
        let mut map = BTreeMap::new();
        map.insert(vec![1], 1);
        assert!(matches!(
            write(&map, &TomlOptions::new()),
            Err(Error::UnsupportedKey("sequence"))
        ));
    }

    #[test]
    fn test_top_level_must_be_table() {
        assert!(write(&vec![1, 2], &TomlOptions::new()).is_err());
        assert!(write(&5, &TomlOptions::new()).is_err());
    }

    #[test]
    fn test_u64_overflow() {
        let mut map = BTreeMap::new();
        map.insert("big", u64::MAX);
        assert!(matches!(
            write(&map, &TomlOptions::new()),
            Err(Error::UnsupportedValue(_))
        ));
    }

    #[test]
    fn test_value_serializer_nulls() {
        #[derive(Serialize)]
        struct Doc {
            a: Option<i32>,
            b: i32,
        }
        let value = to_toml_value(&Doc { a: None, b: 2 }, NullHandling::Ignore).unwrap();
        assert_eq!(value.get("a"), None);
        assert_eq!(value.get("b"), Some(&TomlValue::Integer(2)));

        let err = to_toml_value(&Doc { a: None, b: 2 }, NullHandling::Error).unwrap_err();
        assert!(matches!(err, Error::NullValue(ref key) if key == "a"));

        assert!(to_toml_value(&vec![Some(1), None], NullHandling::Ignore).is_err());
    }

    #[test]
    fn test_value_serializer_variants() {
        let value = to_toml_value(&Shape::Rect { w: 1, h: 2 }, NullHandling::Ignore).unwrap();
        let rect = value.get("Rect").unwrap();
        assert_eq!(rect.get("w"), Some(&TomlValue::Integer(1)));
    }

    #[test]
    fn test_unit_is_an_empty_table() {
        #[derive(Serialize)]
        struct Marker;
        #[derive(Serialize)]
        struct Doc {
            a: (),
            m: Marker,
            list: Vec<()>,
        }
        let doc = Doc {
            a: (),
            m: Marker,
            list: vec![(), ()],
        };
        let options = TomlOptions::new().with_null_handling(NullHandling::Error);
        assert_eq!(
            write(&doc, &options).unwrap(),
            "a = {}\nm = {}\nlist = [ {}, {} ]\n"
        );
        let value = to_toml_value(&doc, NullHandling::Error).unwrap();
        assert_eq!(value.get("a"), Some(&TomlValue::InlineTable(TomlMap::new())));
    }
}
