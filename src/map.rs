//! Ordered map type for TOML tables.
//!
//! This module provides [`TomlMap`], a wrapper around [`IndexMap`] that keeps
//! keys in insertion order. Parsed tables keep the order of the source
//! document and written tables keep the order of the fields that produced them.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::{TomlMap, TomlValue};
//!
//! let mut map = TomlMap::new();
//! map.insert("name".to_string(), TomlValue::from("Alice"));
//! map.insert("age".to_string(), TomlValue::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::{Error, Result, TomlValue};
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of keys to TOML values.
///
/// Equality ignores order, like [`IndexMap`]; iteration follows insertion order.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{TomlMap, TomlValue};
///
/// let mut map = TomlMap::new();
/// map.insert("first".to_string(), TomlValue::from(1));
/// map.insert("second".to_string(), TomlValue::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TomlMap(IndexMap<String, TomlValue>);

impl TomlMap {
    /// Creates an empty `TomlMap`.
    #[must_use]
    pub fn new() -> Self {
        TomlMap(IndexMap::new())
    }

    /// Creates an empty `TomlMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TomlMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and the
    /// key keeps its original position.
    pub fn insert(&mut self, key: String, value: TomlValue) -> Option<TomlValue> {
        self.0.insert(key, value)
    }

    /// Inserts a key-value pair, failing if the key is already present.
    ///
    /// Table keys are unique in TOML; this is the insertion builders should use.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::{Error, TomlMap, TomlValue};
    ///
    /// let mut map = TomlMap::new();
    /// map.try_insert("key".to_string(), TomlValue::from(1)).unwrap();
    /// let err = map.try_insert("key".to_string(), TomlValue::from(2)).unwrap_err();
    /// assert!(matches!(err, Error::DuplicateKey(ref k) if k == "key"));
    /// assert_eq!(map.get("key").and_then(|v| v.as_integer()), Some(1));
    /// ```
    pub fn try_insert(&mut self, key: String, value: TomlValue) -> Result<()> {
        if self.0.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TomlValue> {
        self.0.get(key)
    }

    /// Returns the stored key and value for `key`.
    #[must_use]
    pub fn get_key_value(&self, key: &str) -> Option<(&String, &TomlValue)> {
        self.0.get_key_value(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut TomlValue> {
        self.0.get_mut(key)
    }

    /// Returns the entry at `index` in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&String, &TomlValue)> {
        self.0.get_index(index)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, shifting later entries to keep the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<TomlValue> {
        self.0.shift_remove(key)
    }

    /// Returns the number of elements in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, TomlValue> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, TomlValue> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, TomlValue> {
        self.0.iter()
    }
}

impl From<HashMap<String, TomlValue>> for TomlMap {
    fn from(map: HashMap<String, TomlValue>) -> Self {
        TomlMap(map.into_iter().collect())
    }
}

impl From<TomlMap> for HashMap<String, TomlValue> {
    fn from(map: TomlMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl From<IndexMap<String, TomlValue>> for TomlMap {
    fn from(map: IndexMap<String, TomlValue>) -> Self {
        TomlMap(map)
    }
}

impl IntoIterator for TomlMap {
    type Item = (String, TomlValue);
    type IntoIter = indexmap::map::IntoIter<String, TomlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TomlMap {
    type Item = (&'a String, &'a TomlValue);
    type IntoIter = indexmap::map::Iter<'a, String, TomlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, TomlValue)> for TomlMap {
    fn from_iter<T: IntoIterator<Item = (String, TomlValue)>>(iter: T) -> Self {
        TomlMap(IndexMap::from_iter(iter))
    }
}
