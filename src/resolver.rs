//! The type-to-formatter resolution cache.
//!
//! A [`Resolver`] maps a type's `TypeId` to the [`TomlFormatter`] for that
//! type. Lookups take a shard read lock and clone an `Arc`, so any number of
//! threads can resolve at once. Container adapters and serde bridges are built
//! on first request and memoized, so later lookups for the same type hit the
//! map directly.
//!
//! Registration is meant for start-up. It is memory safe at any time, but a
//! formatter registered while other threads are already resolving the same
//! type may or may not be observed by them.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::Resolver;
//!
//! let resolver = Resolver::new();
//! let ports = resolver.resolve_sequence::<Vec<u16>, u16>().unwrap();
//!
//! let doc = serde_tomlet::parse_document(b"ports = [ 80, 443 ]\n").unwrap();
//! let node = doc.root().get_child("ports").unwrap();
//! let options = serde_tomlet::TomlOptions::new();
//! assert_eq!(ports.deserialize(node, &options).unwrap(), vec![80, 443]);
//! ```

use crate::datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::formatter::{
    BoolFormatter, CharFormatter, FloatFormatter, IntegerFormatter, MapFormatter, MapKey,
    SequenceFormatter, SerdeFormatter, StringFormatter, TemporalFormatter, TomlFormatter,
};
use crate::{parse_document, Error, Result, TomlOptions, TomlWriter};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;
use tracing::{debug, trace};

static GLOBAL: Lazy<Resolver> = Lazy::new(Resolver::new);

type Entry = Arc<dyn Any + Send + Sync>;

/// A concurrent registry of formatters keyed by type.
pub struct Resolver {
    formatters: DashMap<TypeId, Entry>,
}

impl Resolver {
    /// A resolver with the primitive formatters registered.
    #[must_use]
    pub fn new() -> Self {
        let resolver = Self::empty();
        resolver.register_primitives();
        resolver
    }

    /// A resolver with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Resolver {
            formatters: DashMap::new(),
        }
    }

    /// The process-wide resolver used when options carry none.
    pub fn global() -> &'static Resolver {
        &GLOBAL
    }

    fn register_primitives(&self) {
        self.register::<bool, _>(BoolFormatter);
        self.register::<i8, _>(IntegerFormatter);
        self.register::<i16, _>(IntegerFormatter);
        self.register::<i32, _>(IntegerFormatter);
        self.register::<i64, _>(IntegerFormatter);
        self.register::<isize, _>(IntegerFormatter);
        self.register::<u8, _>(IntegerFormatter);
        self.register::<u16, _>(IntegerFormatter);
        self.register::<u32, _>(IntegerFormatter);
        self.register::<u64, _>(IntegerFormatter);
        self.register::<usize, _>(IntegerFormatter);
        self.register::<f32, _>(FloatFormatter);
        self.register::<f64, _>(FloatFormatter);
        self.register::<char, _>(CharFormatter);
        self.register::<String, _>(StringFormatter);
        self.register::<LocalDate, _>(TemporalFormatter);
        self.register::<LocalTime, _>(TemporalFormatter);
        self.register::<LocalDateTime, _>(TemporalFormatter);
        self.register::<OffsetDateTime, _>(TemporalFormatter);
    }

    /// Registers `formatter` for `T`, replacing any previous one.
    pub fn register<T, F>(&self, formatter: F)
    where
        T: 'static,
        F: TomlFormatter<T> + 'static,
    {
        self.register_arc::<T>(Arc::new(formatter));
    }

    pub fn register_arc<T: 'static>(&self, formatter: Arc<dyn TomlFormatter<T>>) {
        debug!(type_name = type_name::<T>(), "registered formatter");
        self.formatters.insert(TypeId::of::<T>(), Arc::new(formatter));
    }

    #[must_use]
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.formatters.contains_key(&TypeId::of::<T>())
    }

    /// Number of cached formatters, including memoized adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }

    fn lookup<T: 'static>(&self) -> Option<Arc<dyn TomlFormatter<T>>> {
        let entry = self.formatters.get(&TypeId::of::<T>())?;
        entry
            .value()
            .downcast_ref::<Arc<dyn TomlFormatter<T>>>()
            .cloned()
    }

    /// Caches the formatter `build` produces unless another thread got there
    /// first, in which case that one wins.
    fn memoize<T: 'static>(
        &self,
        build: impl FnOnce() -> Arc<dyn TomlFormatter<T>>,
    ) -> Arc<dyn TomlFormatter<T>> {
        if let Some(found) = self.lookup::<T>() {
            return found;
        }
        let built = build();
        let stored = self
            .formatters
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(built.clone()))
            .value()
            .clone();
        trace!(type_name = type_name::<T>(), "memoized formatter");
        stored
            .downcast_ref::<Arc<dyn TomlFormatter<T>>>()
            .cloned()
            .unwrap_or(built)
    }

    /// The registered formatter for `T`.
    pub fn resolve<T: 'static>(&self) -> Result<Arc<dyn TomlFormatter<T>>> {
        trace!(type_name = type_name::<T>(), "resolving formatter");
        self.lookup::<T>()
            .ok_or_else(|| Error::FormatterNotFound(type_name::<T>()))
    }

    /// The registered formatter for `T`, or a serde bridge built on first use.
    pub fn resolve_or_serde<T>(&self) -> Arc<dyn TomlFormatter<T>>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.memoize(|| Arc::new(SerdeFormatter::<T>::new()))
    }

    /// A formatter for the collection `C` of `T`, built from the formatter
    /// for `T`.
    pub fn resolve_sequence<C, T>(&self) -> Result<Arc<dyn TomlFormatter<C>>>
    where
        C: FromIterator<T> + 'static,
        for<'a> &'a C: IntoIterator<Item = &'a T>,
        T: 'static,
    {
        if let Some(found) = self.lookup::<C>() {
            return Ok(found);
        }
        let element = self.resolve::<T>()?;
        Ok(self.memoize(|| Arc::new(SequenceFormatter::<C, T>::new(element))))
    }

    /// A formatter for the map `M` from `K` to `V`, built from the formatter
    /// for `V`.
    pub fn resolve_map<M, K, V>(&self) -> Result<Arc<dyn TomlFormatter<M>>>
    where
        M: FromIterator<(K, V)> + 'static,
        for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
        K: MapKey + 'static,
        V: 'static,
    {
        if let Some(found) = self.lookup::<M>() {
            return Ok(found);
        }
        let value = self.resolve::<V>()?;
        Ok(self.memoize(|| Arc::new(MapFormatter::<M, K, V>::new(value))))
    }

    /// Writes `value` as a document with the registered formatter for `T`.
    pub fn to_string<T: 'static>(&self, value: &T, options: &TomlOptions) -> Result<String> {
        let formatter = self.resolve::<T>()?;
        let mut writer = TomlWriter::new(options);
        formatter.serialize(&mut writer, value, options)?;
        writer.into_string()
    }

    /// Parses a document and reads it with the registered formatter for `T`.
    pub fn from_str<T: 'static>(&self, input: &str, options: &TomlOptions) -> Result<T> {
        let formatter = self.resolve::<T>()?;
        let document = parse_document(input.as_bytes())?;
        formatter.deserialize(document.root(), options)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
