use std::path::Path;

use serde::Serialize;
use sindico_core::conflict::{
    compare, format_field_label, format_field_value, DisplayOptions, FieldComparison,
};
use sindico_core::db::{ConflictRepository, LedgerEntry, SqliteConflictRepository};

use crate::commands::common::{conflict_status, format_sync_timestamp, load_settings, open_database};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ConflictDiffItem {
    pub ledger_id: i64,
    pub store: String,
    pub record_id: String,
    pub status: String,
    pub fields: Vec<FieldComparison>,
}

pub fn run_diff(
    ledger_id: i64,
    as_json: bool,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());
    let entry = repo
        .get(ledger_id)?
        .ok_or(CliError::ConflictNotFound(ledger_id))?;

    let fields = compare(entry.conflict.local_data(), entry.conflict.server_data());

    if as_json {
        let item = ConflictDiffItem {
            ledger_id,
            store: entry.conflict.store().to_string(),
            record_id: entry.conflict.id().to_string(),
            status: conflict_status(&entry.conflict).to_string(),
            fields,
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    for line in format_diff_lines(&entry, &fields, &settings.display) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_diff_lines(
    entry: &LedgerEntry,
    fields: &[FieldComparison],
    options: &DisplayOptions,
) -> Vec<String> {
    let conflict = &entry.conflict;
    let mut lines = vec![
        format!(
            "Conflict {} - {}/{} ({}, {})",
            entry.ledger_id,
            conflict.store(),
            conflict.id(),
            conflict.conflict_type(),
            conflict_status(conflict)
        ),
        format!(
            "Local:  {}    Server: {}",
            format_sync_timestamp(conflict.local_timestamp()),
            format_sync_timestamp(conflict.server_timestamp())
        ),
    ];
    if let (Some(resolution), Some(resolved_at)) = (conflict.resolution(), conflict.resolved_at()) {
        lines.push(format!(
            "Resolved as {} at {}",
            resolution.as_str(),
            format_sync_timestamp(resolved_at)
        ));
    }
    lines.push(String::new());

    let label_width = fields
        .iter()
        .map(|field| format_field_label(&field.field).chars().count())
        .max()
        .unwrap_or(0);

    for field in fields {
        let marker = if field.is_different { '*' } else { ' ' };
        let label = format_field_label(&field.field);
        let local = format_field_value(field.local_value.as_ref(), options);
        if field.is_different {
            let server = format_field_value(field.server_value.as_ref(), options);
            lines.push(format!("{marker} {label:<label_width$}  {local}  ->  {server}"));
        } else {
            lines.push(format!("{marker} {label:<label_width$}  {local}"));
        }
    }
    lines
}
