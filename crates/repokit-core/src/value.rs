//! # Values and Field Maps
//!
//! The scalar values a scope binds into SQL, and the column → value maps used
//! for inserts, updates and equality conditions.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Value Types                                     │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌──────────────────────────────────┐        │
//! │  │     Value       │        │            Fields                │        │
//! │  │  ─────────────  │        │  ──────────────────────────────  │        │
//! │  │  Null           │        │  "name"       → Text("foo")      │        │
//! │  │  Bool           │◄───────│  "updated_at" → Timestamp(..)    │        │
//! │  │  Integer (i64)  │        │  (ordered by column name)        │        │
//! │  │  Real (f64)     │        └──────────────────────────────────┘        │
//! │  │  Text / Blob    │                                                    │
//! │  │  Timestamp      │        Conditions = Fields, read as AND of =       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timestamps are always bound as RFC 3339 text in UTC with microsecond
//! precision, see [`format_timestamp`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Value
// =============================================================================

/// A single bindable SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL.
    Null,

    /// Stored by SQLite as INTEGER 0/1.
    Bool(bool),

    /// 64-bit signed integer.
    Integer(i64),

    /// Double precision float.
    Real(f64),

    /// UTF-8 text.
    Text(String),

    /// Raw bytes.
    Blob(Vec<u8>),

    /// Point in time, bound as RFC 3339 text.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text payload, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// Formats a timestamp the way it is stored: `2024-01-31T09:15:00.000000Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions
// -----------------------------------------------------------------------------

macro_rules! integer_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Integer(i64::from(n))
                }
            }
        )*
    };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Real(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Blob(bytes)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Text(id.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// JSON → Value.
///
/// Numbers become integers when they fit in an `i64`, reals otherwise.
/// Arrays and objects are bound as their JSON text.
impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Real),
            },
            JsonValue::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

// =============================================================================
// Fields
// =============================================================================

/// Ordered column → value mapping.
///
/// Used as the payload of inserts and updates and, under the [`Conditions`]
/// alias, as an AND of equality predicates.
///
/// ## Example
/// ```rust
/// use repokit_core::{Fields, Value};
///
/// let fields = Fields::new().with("name", "foo").with("rank", 3);
/// assert_eq!(fields.get("rank"), Some(&Value::Integer(3)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

/// Equality conditions, ANDed together. An empty mapping matches every row.
pub type Conditions = Fields;

impl Fields {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Fields(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Sets a column, returning the previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(column.into(), value.into())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    /// True when the column is present, even if it holds `Null`.
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// True when the column is present with a non-null value.
    pub fn is_set(&self, column: &str) -> bool {
        self.0.get(column).is_some_and(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Fields {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<serde_json::Map<String, JsonValue>> for Fields {
    fn from(map: serde_json::Map<String, JsonValue>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.0.insert(k.into(), v.into());
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(7_i32), Value::Integer(7));
        assert_eq!(Value::from("x"), Value::Text("x".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(2.5)), Value::Real(2.5));

        let id = Uuid::nil();
        assert_eq!(
            Value::from(id),
            Value::Text("00000000-0000-0000-0000-000000000000".to_string())
        );
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(Value::from(json!(42)), Value::Integer(42));
        assert_eq!(Value::from(json!(1.5)), Value::Real(1.5));
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(
            Value::from(json!([1, 2])),
            Value::Text("[1,2]".to_string())
        );
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 31, 9, 15, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-31T09:15:00.000000Z");
        assert_eq!(Value::from(ts).to_string(), "2024-01-31T09:15:00.000000Z");
    }

    #[test]
    fn test_fields_presence() {
        let fields = Fields::from([("name", Value::from("foo")), ("note", Value::Null)]);

        assert!(fields.contains("note"));
        assert!(!fields.is_set("note"));
        assert!(fields.is_set("name"));
        assert!(!fields.contains("missing"));
        assert_eq!(fields.columns().collect::<Vec<_>>(), vec!["name", "note"]);
    }

    #[test]
    fn test_fields_from_json_map() {
        let map = match json!({"name": "foo", "rank": 2}) {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };
        let fields = Fields::from(map);

        assert_eq!(fields.get("rank"), Some(&Value::Integer(2)));
        assert_eq!(fields.len(), 2);
    }
}
