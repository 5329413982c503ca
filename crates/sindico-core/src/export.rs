//! Conflict history export shared by the CLI and app clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::ConflictItem;
use crate::util::format_timestamp_rfc3339;

/// Downloadable audit document listing every tracked conflict.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictHistory<T = Value> {
    pub exported_at: String,
    pub total_conflicts: usize,
    pub conflicts: Vec<ConflictItem<T>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConflictHistoryRef<'a, T: Serialize> {
    exported_at: String,
    total_conflicts: usize,
    conflicts: &'a [ConflictItem<T>],
}

/// Render conflicts as a pretty-printed JSON history document.
pub fn export_conflict_history<T: Serialize>(
    conflicts: &[ConflictItem<T>],
    exported_at_ms: i64,
) -> Result<String> {
    let document = ConflictHistoryRef {
        exported_at: format_timestamp_rfc3339(exported_at_ms),
        total_conflicts: conflicts.len(),
        conflicts,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Read a history document produced by [`export_conflict_history`].
pub fn parse_conflict_history(payload: &str) -> Result<ConflictHistory> {
    Ok(serde_json::from_str(payload)?)
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(timestamp_ms: i64) -> String {
    format!("sindico-conflicts-{timestamp_ms}.json")
}
