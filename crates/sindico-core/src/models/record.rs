//! Synchronizable record abstraction
//!
//! Conflict detection, resolution and merging are generic over [`SyncRecord`].
//! Dynamic records coming straight from the sync layer are plain
//! `serde_json::Value` trees and use the implementation below; typed entity
//! structs can implement the trait themselves.

use serde_json::Value;

/// Keys that carry a record's last-update instant.
const UPDATED_AT_KEYS: [&str; 2] = ["updatedAt", "updated_at"];
/// Keys that carry a record's creation instant.
const CREATED_AT_KEYS: [&str; 2] = ["createdAt", "created_at"];

/// A record that can be compared against its server counterpart.
pub trait SyncRecord: Clone {
    /// Identifier of the underlying record, if present
    fn record_id(&self) -> Option<String>;

    /// Last update instant (Unix ms), if present
    fn updated_at(&self) -> Option<i64>;

    /// Creation instant (Unix ms), if present
    fn created_at(&self) -> Option<i64>;

    /// Structured snapshot used for canonical comparison
    fn to_json(&self) -> Value;

    /// Whether this snapshot stands for a missing record
    fn is_absent(&self) -> bool {
        false
    }

    /// Last modification instant: update time, else creation time, else 0.
    fn modified_at(&self) -> i64 {
        self.updated_at().or_else(|| self.created_at()).unwrap_or(0)
    }

    /// Deterministic serialized form of this record.
    fn canonical(&self) -> String {
        canonical_json(&self.to_json())
    }
}

impl SyncRecord for Value {
    fn record_id(&self) -> Option<String> {
        value_id(self)
    }

    fn updated_at(&self) -> Option<i64> {
        first_timestamp(self, &UPDATED_AT_KEYS)
    }

    fn created_at(&self) -> Option<i64> {
        first_timestamp(self, &CREATED_AT_KEYS)
    }

    fn to_json(&self) -> Value {
        self.clone()
    }

    fn is_absent(&self) -> bool {
        self.is_null()
    }
}

/// Deterministic string form of a structured value.
///
/// `serde_json` keeps object keys in a sorted map, so two structurally equal
/// values always serialize to the same string. Integral floats are written as
/// integers, so `1.0` and `1` share a form.
pub fn canonical_json(value: &Value) -> String {
    normalize_numbers(value).to_string()
}

#[allow(clippy::cast_possible_truncation)]
fn normalize_numbers(value: &Value) -> Value {
    match value {
        Value::Number(number) if !number.is_i64() && !number.is_u64() => number
            .as_f64()
            .filter(|float| float.fract() == 0.0 && float.abs() < 9_007_199_254_740_992.0)
            .map_or_else(|| value.clone(), |float| Value::from(float as i64)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_numbers).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), normalize_numbers(field)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Read the `id` of a JSON record; numeric ids are rendered as strings.
pub fn value_id(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Interpret a JSON value as a Unix millisecond timestamp.
///
/// Numbers are taken as milliseconds, strings are parsed as RFC 3339.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            number.as_f64().map(|millis| millis as i64)
        }),
        Value::String(text) => chrono::DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|date_time| date_time.timestamp_millis()),
        _ => None,
    }
}

fn first_timestamp(value: &Value, keys: &[&str]) -> Option<i64> {
    let object = value.as_object()?;
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(parse_timestamp)
}
