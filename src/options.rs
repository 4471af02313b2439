//! Configuration options for TOML serialization.
//!
//! This module provides types to customize TOML output layout:
//!
//! - [`TomlOptions`]: Main configuration struct
//! - [`TomlStyle`]: Whether tables and arrays of tables are written inline or as headers
//! - [`NullHandling`]: What to do with absent (`None`) values
//!
//! Style flags only change the layout decision of the writer. A document written
//! with any style parses back to the same values.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::{to_string_with_options, TomlOptions, TomlStyle};
//! use serde::Serialize;
//! use std::collections::BTreeMap;
//!
//! #[derive(Serialize)]
//! struct Config { name: String, limits: BTreeMap<String, i64> }
//!
//! let mut limits = BTreeMap::new();
//! limits.insert("cpu".to_string(), 4);
//! let config = Config { name: "svc".to_string(), limits };
//!
//! // Inline by default
//! let inline = to_string_with_options(&config, TomlOptions::new()).unwrap();
//! assert_eq!(inline, "name = \"svc\"\nlimits = {cpu = 4}\n");
//!
//! // Header tables on request
//! let options = TomlOptions::new().with_style(TomlStyle::HEADER_TABLES);
//! let headers = to_string_with_options(&config, options).unwrap();
//! assert_eq!(headers, "name = \"svc\"\n[limits]\ncpu = 4\n\n");
//! ```

use crate::Resolver;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

/// Layout flags for tables and arrays of tables.
///
/// The four meaningful combinations are [`TomlStyle::PLAIN`],
/// [`TomlStyle::HEADER_TABLES`], [`TomlStyle::HEADER_ARRAY_TABLES`] and
/// [`TomlStyle::HEADERS`] (both).
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::TomlStyle;
///
/// let both = TomlStyle::HEADER_TABLES | TomlStyle::HEADER_ARRAY_TABLES;
/// assert_eq!(both, TomlStyle::HEADERS);
/// assert!(both.header_tables());
/// assert!(!TomlStyle::PLAIN.header_array_tables());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TomlStyle(u8);

impl TomlStyle {
    /// Everything inline: `key = {…}` and `key = [ … ]`.
    pub const PLAIN: TomlStyle = TomlStyle(0);
    /// Tables at document level are written as `[path]` blocks.
    pub const HEADER_TABLES: TomlStyle = TomlStyle(1);
    /// Non-empty sequences of tables at document level are written as `[[path]]` blocks.
    pub const HEADER_ARRAY_TABLES: TomlStyle = TomlStyle(2);
    /// Both header forms.
    pub const HEADERS: TomlStyle = TomlStyle(3);

    #[inline]
    #[must_use]
    pub const fn header_tables(self) -> bool {
        self.0 & Self::HEADER_TABLES.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn header_array_tables(self) -> bool {
        self.0 & Self::HEADER_ARRAY_TABLES.0 != 0
    }
}

impl BitOr for TomlStyle {
    type Output = TomlStyle;

    fn bitor(self, rhs: Self) -> Self::Output {
        TomlStyle(self.0 | rhs.0)
    }
}

/// Policy for absent values (`None`, unit) during serialization.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{to_string_with_options, NullHandling, TomlOptions};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Entry { name: String, alias: Option<String> }
///
/// let entry = Entry { name: "a".to_string(), alias: None };
///
/// let out = to_string_with_options(&entry, TomlOptions::new()).unwrap();
/// assert_eq!(out, "name = \"a\"\n");
///
/// let strict = TomlOptions::new().with_null_handling(NullHandling::Error);
/// assert!(to_string_with_options(&entry, strict).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NullHandling {
    /// Omit the key of an absent value.
    #[default]
    Ignore,
    /// Fail the write.
    Error,
}

/// Configuration options for TOML serialization.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{NullHandling, TomlOptions, TomlStyle};
///
/// let options = TomlOptions::new()
///     .with_style(TomlStyle::HEADERS)
///     .with_null_handling(NullHandling::Error);
/// assert!(options.style.header_tables());
/// ```
#[derive(Clone, Default)]
pub struct TomlOptions {
    pub style: TomlStyle,
    pub null_handling: NullHandling,
    pub resolver: Option<Arc<Resolver>>,
}

impl fmt::Debug for TomlOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TomlOptions")
            .field("style", &self.style)
            .field("null_handling", &self.null_handling)
            .field("resolver", &self.resolver.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl TomlOptions {
    /// Creates default options (plain style, absent values ignored, global resolver).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::{NullHandling, TomlOptions, TomlStyle};
    ///
    /// let options = TomlOptions::new();
    /// assert_eq!(options.style, TomlStyle::PLAIN);
    /// assert_eq!(options.null_handling, NullHandling::Ignore);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with both header styles enabled.
    #[must_use]
    pub fn headers() -> Self {
        TomlOptions {
            style: TomlStyle::HEADERS,
            ..Default::default()
        }
    }

    /// Sets the table / array-of-tables layout flags.
    #[must_use]
    pub fn with_style(mut self, style: TomlStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the policy for absent values.
    #[must_use]
    pub fn with_null_handling(mut self, null_handling: NullHandling) -> Self {
        self.null_handling = null_handling;
        self
    }

    /// Routes formatter lookups through `resolver` instead of the global one.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The resolver formatter lookups go through.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        match &self.resolver {
            Some(resolver) => resolver,
            None => Resolver::global(),
        }
    }
}
