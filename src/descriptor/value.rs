//! Literal values carried by class descriptors.
//!
//! Property defaults, parameter defaults and the generated static metadata of
//! a proxy are all plain literals. [`Value`] models them and renders them the
//! way the target language's `var_export` does, so generated units are
//! byte-stable for identical input.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// Key of an ordered array literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered map; insertion order is preserved in rendered output.
    Array(Vec<(ArrayKey, Value)>),
}

impl ArrayKey {
    /// Canonical decimal strings become integer keys, as array literals do.
    pub fn from_string(key: String) -> Self {
        match key.parse::<i64>() {
            Ok(int) if int.to_string() == key => Self::Int(int),
            _ => Self::String(key),
        }
    }

    fn export_into(&self, out: &mut String) {
        match self {
            Self::Int(int) => out.push_str(&int.to_string()),
            Self::String(s) => export_string(s, out),
        }
    }
}

impl Value {
    /// A list literal keyed `0..n`.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ArrayKey::Int(i as i64), v.into()))
                .collect(),
        )
    }

    /// A map literal with string keys, in the given order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Array(
            entries
                .into_iter()
                .map(|(k, v)| (ArrayKey::from_string(k.into()), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer cast with the target language's `(int)` semantics: numeric
    /// string prefixes are honoured, floats truncate, anything else falls back
    /// to `0`/`1`.
    pub fn to_int(&self) -> i64 {
        match self {
            Self::Null => 0,
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Float(f) if f.is_finite() => *f as i64,
            Self::Float(_) => 0,
            Self::String(s) => leading_int(s),
            Self::Array(items) => i64::from(!items.is_empty()),
        }
    }

    /// Renders the value in `var_export` form.
    pub fn export(&self) -> String {
        let mut out = String::new();
        self.export_into(&mut out, 0);
        out
    }

    fn export_into(&self, out: &mut String, indent: usize) {
        match self {
            Self::Null => out.push_str("NULL"),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
            Self::Int(i) => out.push_str(&i.to_string()),
            Self::Float(f) => out.push_str(&export_float(*f)),
            Self::String(s) => export_string(s, out),
            Self::Array(items) => {
                out.push_str("array (\n");
                for (key, value) in items {
                    pad(out, indent + 2);
                    key.export_into(out);
                    out.push_str(" => ");
                    if matches!(value, Self::Array(_)) {
                        out.push('\n');
                        pad(out, indent + 2);
                    }
                    value.export_into(out, indent + 2);
                    out.push_str(",\n");
                }
                pad(out, indent);
                out.push(')');
            }
        }
    }
}

fn pad(out: &mut String, width: usize) {
    out.extend(std::iter::repeat_n(' ', width));
}

fn export_float(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}INF")
    } else if f != 0.0 && (f.abs() >= 1e15 || f.abs() < 1e-4) {
        export_exponent(f)
    } else if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

// `1.0E+15`: the mantissa keeps a fraction so the literal reads back as a
// float.
fn export_exponent(f: f64) -> String {
    let formatted = format!("{f:e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let fraction = if mantissa.contains('.') { "" } else { ".0" };
    let sign = if exponent.starts_with('-') { "" } else { "+" };
    format!("{mantissa}{fraction}E{sign}{exponent}")
}

// NUL bytes cannot live inside a single-quoted literal, so they are spliced
// in as double-quoted "\0" segments.
fn export_string(s: &str, out: &mut String) {
    let mut segments = s.split('\0');
    if let Some(first) = segments.next() {
        quote_into(first, out);
    }
    for segment in segments {
        out.push_str(" . \"\\0\" . ");
        quote_into(segment, out);
    }
}

fn quote_into(segment: &str, out: &mut String) {
    out.push('\'');
    for c in segment.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out.push('\'');
}

fn leading_int(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse().unwrap_or(0)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.export())
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a literal value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        Value::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        i64::try_from(u)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {u} is out of range")))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push((ArrayKey::Int(items.len() as i64), item));
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            items.push((ArrayKey::from_string(key), value));
        }
        Ok(Value::Array(items))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Deserializes a present key as `Some`, keeping an explicit `null` as
/// `Some(Value::Null)` instead of collapsing it into "no default".
pub(crate) fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_scalars() {
        assert_eq!(Value::Null.export(), "NULL");
        assert_eq!(Value::Bool(false).export(), "false");
        assert_eq!(Value::Int(-3).export(), "-3");
        assert_eq!(Value::Float(1.0).export(), "1.0");
        assert_eq!(Value::Float(0.25).export(), "0.25");
        assert_eq!(Value::from("it's a \\path").export(), "'it\\'s a \\\\path'");
    }

    #[test]
    fn test_export_large_and_tiny_floats_use_exponent_form() {
        assert_eq!(Value::Float(1e15).export(), "1.0E+15");
        assert_eq!(Value::Float(-2.5e20).export(), "-2.5E+20");
        assert_eq!(Value::Float(1e-7).export(), "1.0E-7");
        assert_eq!(Value::Float(999_999_999_999_999.0).export(), "999999999999999.0");
        assert_eq!(Value::Float(0.0).export(), "0.0");
    }

    #[test]
    fn test_export_nul_bytes_are_spliced() {
        let mangled = Value::from("\0App\\User\0secret");
        assert_eq!(mangled.export(), "'' . \"\\0\" . 'App\\\\User' . \"\\0\" . 'secret'");
    }

    #[test]
    fn test_export_nested_array() {
        let value = Value::map([("a", Value::list([1, 2])), ("b", Value::Null)]);
        assert_eq!(
            value.export(),
            "array (\n  'a' => \n  array (\n    0 => 1,\n    1 => 2,\n  ),\n  'b' => NULL,\n)"
        );
        assert_eq!(Value::Array(vec![]).export(), "array (\n)");
    }

    #[test]
    fn test_numeric_string_keys_become_ints() {
        assert_eq!(ArrayKey::from_string("12".into()), ArrayKey::Int(12));
        assert_eq!(ArrayKey::from_string("012".into()), ArrayKey::String("012".into()));
    }

    #[test]
    fn test_int_cast() {
        assert_eq!(Value::from("42").to_int(), 42);
        assert_eq!(Value::from(" 7abc").to_int(), 7);
        assert_eq!(Value::from("abc").to_int(), 0);
        assert_eq!(Value::Float(3.9).to_int(), 3);
        assert_eq!(Value::Bool(true).to_int(), 1);
    }

    #[test]
    fn test_deserialize_json_null_and_arrays() {
        let value: Value = serde_json::from_str(r#"{"tags": ["a"], "note": null}"#).unwrap();
        assert_eq!(
            value,
            Value::map([("tags", Value::list(["a"])), ("note", Value::Null)])
        );
    }
}
