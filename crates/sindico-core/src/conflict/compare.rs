//! Field-by-field comparison for conflict review screens

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::canonical_json;

/// Numbers at or above this are displayed as Unix millisecond timestamps.
const TIMESTAMP_DISPLAY_THRESHOLD: i64 = 1_000_000_000_000;

/// One field of a local/server comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldComparison {
    pub field: String,
    pub local_value: Option<Value>,
    pub server_value: Option<Value>,
    pub is_different: bool,
}

/// Labels and date settings used when rendering values for people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayOptions {
    /// Shown for missing and null values
    pub empty_marker: String,
    pub yes_label: String,
    pub no_label: String,
    /// Suffix for array sizes, e.g. "3 itens"
    pub items_label: String,
    /// `chrono` format string for timestamps
    pub date_format: String,
    /// Offset from UTC applied to timestamps, in minutes
    pub utc_offset_minutes: i32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            empty_marker: "(vazio)".to_string(),
            yes_label: "Sim".to_string(),
            no_label: "Não".to_string(),
            items_label: "itens".to_string(),
            date_format: "%d/%m/%Y %H:%M:%S".to_string(),
            utc_offset_minutes: -180,
        }
    }
}

/// Compare two records field by field.
///
/// The field set is the union of both objects' keys (non-objects count as
/// empty). Differing fields come first, each group sorted by field name.
pub fn compare(local: &Value, server: &Value) -> Vec<FieldComparison> {
    let empty = Map::new();
    let local_fields = local.as_object().unwrap_or(&empty);
    let server_fields = server.as_object().unwrap_or(&empty);

    let fields = local_fields
        .keys()
        .chain(server_fields.keys())
        .collect::<BTreeSet<_>>();

    let mut comparisons = fields
        .into_iter()
        .map(|field| {
            let local_value = local_fields.get(field).cloned();
            let server_value = server_fields.get(field).cloned();
            let is_different =
                local_value.as_ref().map(canonical_json) != server_value.as_ref().map(canonical_json);

            FieldComparison {
                field: field.clone(),
                local_value,
                server_value,
                is_different,
            }
        })
        .collect::<Vec<_>>();

    comparisons.sort_by(|left, right| {
        right
            .is_different
            .cmp(&left.is_different)
            .then_with(|| left.field.cmp(&right.field))
    });
    comparisons
}

/// Render a field value for display.
pub fn format_field_value(value: Option<&Value>, options: &DisplayOptions) -> String {
    match value {
        None | Some(Value::Null) => options.empty_marker.clone(),
        Some(Value::Bool(true)) => options.yes_label.clone(),
        Some(Value::Bool(false)) => options.no_label.clone(),
        Some(Value::Number(number)) => number
            .as_i64()
            .filter(|millis| *millis >= TIMESTAMP_DISPLAY_THRESHOLD)
            .and_then(|millis| format_timestamp(millis, options))
            .unwrap_or_else(|| number.to_string()),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => format!("{} {}", items.len(), options.items_label),
        Some(object @ Value::Object(_)) => {
            serde_json::to_string_pretty(object).unwrap_or_else(|_| object.to_string())
        }
    }
}

/// Turn a record key into a readable label: `updatedAt` -> `Updated at`.
pub fn format_field_label(field: &str) -> String {
    let mut words = Vec::new();
    let mut current = String::new();

    for ch in field.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.extend(ch.to_lowercase());
        } else {
            current.extend(ch.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let label = words.join(" ");
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_timestamp(millis: i64, options: &DisplayOptions) -> Option<String> {
    let offset = FixedOffset::east_opt(options.utc_offset_minutes.checked_mul(60)?)?;
    let date_time = DateTime::from_timestamp_millis(millis)?.with_timezone(&offset);
    Some(date_time.format(&options.date_format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn differing_fields_sort_first() {
        let result = compare(&json!({"a": 1, "b": 2}), &json!({"a": 1, "b": 3}));

        assert_eq!(
            result,
            vec![
                FieldComparison {
                    field: "b".to_string(),
                    local_value: Some(json!(2)),
                    server_value: Some(json!(3)),
                    is_different: true,
                },
                FieldComparison {
                    field: "a".to_string(),
                    local_value: Some(json!(1)),
                    server_value: Some(json!(1)),
                    is_different: false,
                },
            ]
        );
    }

    #[test]
    fn field_set_is_union_of_keys() {
        let result = compare(&json!({"z": 1, "shared": true}), &json!({"a": 1, "shared": true}));
        let fields = result.iter().map(|row| row.field.as_str()).collect::<Vec<_>>();
        assert_eq!(fields, vec!["a", "z", "shared"]);
        assert_eq!(result[0].local_value, None);
        assert_eq!(result[1].server_value, None);
    }

    #[test]
    fn difference_is_structural() {
        let result = compare(
            &json!({"unit": {"block": "A", "n": 1}}),
            &json!({"unit": {"n": 1, "block": "A"}}),
        );
        assert!(!result[0].is_different);
    }

    #[test]
    fn integral_float_equals_integer() {
        let result = compare(&json!({"amount": 150}), &json!({"amount": 150.0}));
        assert!(!result[0].is_different);
    }

    #[test]
    fn non_objects_compare_as_empty() {
        assert!(compare(&json!(1), &json!("x")).is_empty());
    }

    #[test]
    fn format_value_uses_labels() {
        let options = DisplayOptions::default();
        assert_eq!(format_field_value(None, &options), "(vazio)");
        assert_eq!(format_field_value(Some(&Value::Null), &options), "(vazio)");
        assert_eq!(format_field_value(Some(&json!(true)), &options), "Sim");
        assert_eq!(format_field_value(Some(&json!(false)), &options), "Não");
        assert_eq!(format_field_value(Some(&json!("texto")), &options), "texto");
        assert_eq!(format_field_value(Some(&json!(42)), &options), "42");
        assert_eq!(format_field_value(Some(&json!([1, 2, 3])), &options), "3 itens");
    }

    #[test]
    fn format_value_renders_large_numbers_as_dates() {
        let options = DisplayOptions::default();
        assert_eq!(
            format_field_value(Some(&json!(1_700_000_000_000_i64)), &options),
            "14/11/2023 19:13:20"
        );

        let utc = DisplayOptions {
            utc_offset_minutes: 0,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            ..DisplayOptions::default()
        };
        assert_eq!(
            format_field_value(Some(&json!(1_700_000_000_000_i64)), &utc),
            "2023-11-14 22:13"
        );
    }

    #[test]
    fn format_value_pretty_prints_objects() {
        let rendered = format_field_value(Some(&json!({"a": 1})), &DisplayOptions::default());
        assert_eq!(rendered, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn format_label_splits_words() {
        assert_eq!(format_field_label("updatedAt"), "Updated at");
        assert_eq!(format_field_label("maintenance_order_id"), "Maintenance order id");
        assert_eq!(format_field_label("id"), "Id");
        assert_eq!(format_field_label(""), "");
    }
}
