//! Borrowed views over a parsed TOML tree.
//!
//! A [`Node`] is a key, a reference to its owning parent and a reference to the
//! value itself. Navigating to a child hands out another view into the same
//! tree; no subtree is ever cloned. Formatters receive nodes and read them
//! through the `try_get_*` accessors, which return `None` for the wrong kind
//! instead of converting.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::parse_document;
//!
//! let doc = parse_document(b"[server]\nhost = \"localhost\"\nports = [ 80, 443 ]\n").unwrap();
//! let server = doc.root().get_child("server").unwrap();
//! assert_eq!(server.node_count(), 2);
//! assert_eq!(server.get_child("host").and_then(|n| n.try_get_string()), Some("localhost"));
//!
//! let ports = server.get_child("ports").unwrap();
//! assert_eq!(ports.get_index(1).and_then(|n| n.try_get_int64()), Some(443));
//! ```

use crate::datetime::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::{Error, Result, TomlMap, TomlValue};

/// A view of one value in a TOML tree.
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    key: Option<&'a str>,
    parent: Option<&'a TomlValue>,
    value: &'a TomlValue,
}

impl<'a> Node<'a> {
    /// A root view with no key and no parent.
    #[must_use]
    pub fn new(value: &'a TomlValue) -> Self {
        Node {
            key: None,
            parent: None,
            value,
        }
    }

    /// The key this node is stored under; `None` for array elements and roots.
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&'a str> {
        self.key
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&'a TomlValue> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &'a TomlValue {
        self.value
    }

    /// The kind of the viewed value, for error messages.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.value.type_name()
    }

    /// Looks up a child of a table or inline table.
    #[must_use]
    pub fn get_child(&self, key: &str) -> Option<Node<'a>> {
        let (key, value) = self.value.as_table()?.get_key_value(key)?;
        Some(Node {
            key: Some(key),
            parent: Some(self.value),
            value,
        })
    }

    /// Looks up an element of an array.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<Node<'a>> {
        let value = self.value.as_array()?.get(index)?;
        Some(Node {
            key: None,
            parent: Some(self.value),
            value,
        })
    }

    /// Number of entries (tables) or elements (arrays); zero for scalars.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.value.node_count()
    }

    /// `true` for scalar-bearing nodes, `false` for arrays and tables.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.has_value()
    }

    /// Iterates the elements of an array, or the entries of a table in order.
    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let parent = self.value;
        let elements = parent.as_array().into_iter().flatten().map(move |value| Node {
            key: None,
            parent: Some(parent),
            value,
        });
        let entries = parent
            .as_table()
            .into_iter()
            .flat_map(TomlMap::iter)
            .map(move |(key, value)| Node {
                key: Some(key.as_str()),
                parent: Some(parent),
                value,
            });
        elements.chain(entries)
    }

    #[must_use]
    pub fn try_get_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    #[must_use]
    pub fn try_get_int64(&self) -> Option<i64> {
        self.value.as_integer()
    }

    /// Floats as stored; integers widened to `f64`.
    #[must_use]
    pub fn try_get_double(&self) -> Option<f64> {
        self.value.as_float()
    }

    #[must_use]
    pub fn try_get_string(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    #[must_use]
    pub fn try_get_date_only(&self) -> Option<LocalDate> {
        match self.value {
            TomlValue::LocalDate(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn try_get_time_only(&self) -> Option<LocalTime> {
        match self.value {
            TomlValue::LocalTime(t) => Some(*t),
            _ => None,
        }
    }

    #[must_use]
    pub fn try_get_date_time(&self) -> Option<LocalDateTime> {
        match self.value {
            TomlValue::LocalDateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn try_get_date_time_offset(&self) -> Option<OffsetDateTime> {
        match self.value {
            TomlValue::OffsetDateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn try_get_array(&self) -> Option<&'a [TomlValue]> {
        self.value.as_array().map(Vec::as_slice)
    }

    /// A table that came from a `[header]`, a dotted key or an array of tables.
    #[must_use]
    pub fn try_get_table(&self) -> Option<&'a TomlMap> {
        match self.value {
            TomlValue::Table(map) => Some(map),
            _ => None,
        }
    }

    /// Either table kind, read as a key/value dictionary.
    #[must_use]
    pub fn try_get_dictionary(&self) -> Option<&'a TomlMap> {
        self.value.as_table()
    }

    /// The error for reading this node as `expected`.
    #[must_use]
    pub fn mismatch(&self, expected: &'static str) -> Error {
        Error::type_mismatch(expected, self.kind())
    }
}

/// The owned result of parsing a whole document.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::Document;
///
/// let doc: Document = "title = \"TOML\"".parse().unwrap();
/// assert_eq!(doc.root().get_child("title").and_then(|n| n.try_get_string()), Some("TOML"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    root: TomlValue,
}

impl Document {
    #[must_use]
    pub fn new(root: TomlMap) -> Self {
        Document {
            root: TomlValue::Table(root),
        }
    }

    /// A view of the root table.
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        Node::new(&self.root)
    }

    /// Gives up the view and returns the root entries.
    #[must_use]
    pub fn into_table(self) -> TomlMap {
        match self.root {
            TomlValue::Table(map) | TomlValue::InlineTable(map) => map,
            _ => TomlMap::new(),
        }
    }
}

impl std::str::FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parse_document(s.as_bytes())
    }
}

/// Narrows an `i64` to a smaller integer type, naming `target` on overflow.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{narrow_integer, Error};
///
/// let small: u8 = narrow_integer(200, "u8").unwrap();
/// assert_eq!(small, 200);
///
/// let err = narrow_integer::<u8>(300, "u8").unwrap_err();
/// assert!(matches!(err, Error::NumberOutOfRange { target: "u8", .. }));
/// ```
pub fn narrow_integer<T: TryFrom<i64>>(value: i64, target: &'static str) -> Result<T> {
    T::try_from(value).map_err(|_| Error::out_of_range(target, value))
}

/// Narrows an `f64` to `f32`.
///
/// Non-finite values pass through; finite values beyond `f32::MAX` are out of range.
pub fn narrow_float(value: f64) -> Result<f32> {
    if value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(Error::out_of_range("f32", value));
    }
    Ok(value as f32)
}
