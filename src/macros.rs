/// Builds a [`TomlValue`](crate::TomlValue) from a JSON-like literal.
///
/// Objects become tables, arrays become arrays, and any other expression is
/// converted with `TomlValue::from`. Negative numbers inside arrays and
/// objects need parentheses, as in `[(-1), 2]`.
///
/// ```rust
/// use serde_tomlet::{toml, TomlValue};
///
/// let value = toml!({
///     "name": "svc",
///     "ports": [80, 443],
///     "tls": { "enabled": true }
/// });
/// assert_eq!(value.get("ports").map(TomlValue::node_count), Some(2));
/// ```
#[macro_export]
macro_rules! toml {
    (true) => {
        $crate::TomlValue::Boolean(true)
    };

    (false) => {
        $crate::TomlValue::Boolean(false)
    };

    ([]) => {
        $crate::TomlValue::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::TomlValue::Array(vec![$($crate::toml!($elem)),*])
    };

    ({}) => {
        $crate::TomlValue::Table($crate::TomlMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut table = $crate::TomlMap::new();
        $(
            table.insert($key.to_string(), $crate::toml!($value));
        )*
        $crate::TomlValue::Table(table)
    }};

    ($other:expr) => {
        $crate::TomlValue::from($other)
    };
}
