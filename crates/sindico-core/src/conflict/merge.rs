//! Recursive structural merge of a local and server record
//!
//! Rules, applied at every level:
//! - primitives (and mismatched shapes) keep the local value
//! - arrays are unioned: local elements first, then server elements that are
//!   neither canonically equal to nor share an `id` with an element already kept
//! - objects start from the server copy; identity fields stay with the server
//!   (even when it has none), update timestamps take the later value (missing
//!   ones count as 0), and conflicting scalars keep local

use serde_json::{Map, Value};

use crate::models::{canonical_json, parse_timestamp};

/// Fields whose server value always wins.
const IDENTITY_FIELDS: [&str; 3] = ["id", "createdAt", "created_at"];
/// Fields merged as the later of both timestamps.
const UPDATED_AT_FIELDS: [&str; 2] = ["updatedAt", "updated_at"];

/// Merge `local` into `server`.
pub fn merge(local: &Value, server: &Value) -> Value {
    match (local, server) {
        (Value::Array(local_items), Value::Array(server_items)) => {
            Value::Array(merge_arrays(local_items, server_items))
        }
        (Value::Object(local_fields), Value::Object(server_fields)) => {
            Value::Object(merge_objects(local_fields, server_fields))
        }
        _ => local.clone(),
    }
}

fn merge_arrays(local: &[Value], server: &[Value]) -> Vec<Value> {
    let mut merged = local.to_vec();
    let mut seen = merged.iter().map(canonical_json).collect::<Vec<_>>();

    for item in server {
        let canonical = canonical_json(item);
        let item_id = element_id(item);
        let duplicate = seen.contains(&canonical)
            || item_id.is_some_and(|id| merged.iter().any(|kept| element_id(kept) == Some(id)));

        if !duplicate {
            merged.push(item.clone());
            seen.push(canonical);
        }
    }

    merged
}

fn merge_objects(local: &Map<String, Value>, server: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = server.clone();

    for (key, local_value) in local {
        let server_value = server.get(key).filter(|value| !value.is_null());

        if IDENTITY_FIELDS.contains(&key.as_str()) {
            continue;
        }

        if UPDATED_AT_FIELDS.contains(&key.as_str()) {
            let local_millis = parse_timestamp(local_value).unwrap_or(0);
            let server_millis = server_value.and_then(parse_timestamp);
            if local_millis > server_millis.unwrap_or(0) {
                merged.insert(key.clone(), local_value.clone());
            } else if server_millis.is_none() {
                merged.insert(key.clone(), Value::from(0));
            }
            continue;
        }

        match server_value {
            None => {
                merged.insert(key.clone(), local_value.clone());
            }
            Some(server_value) if is_structured(local_value) && is_structured(server_value) => {
                merged.insert(key.clone(), merge(local_value, server_value));
            }
            Some(server_value) if canonical_json(server_value) != canonical_json(local_value) => {
                merged.insert(key.clone(), local_value.clone());
            }
            Some(_) => {}
        }
    }

    merged
}

const fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

fn element_id(value: &Value) -> Option<&Value> {
    value.get("id").filter(|id| !id.is_null())
}
