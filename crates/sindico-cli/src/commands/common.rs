use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sindico_core::config::SyncSettings;
use sindico_core::db::{ConflictRepository, Database, LedgerEntry, SqliteConflictRepository};
use sindico_core::util::format_timestamp_rfc3339;
use sindico_core::{ConflictItem, ResolutionStrategy, Store};

use crate::cli::StrategyArg;
use crate::error::CliError;

const APP_DIR_NAME: &str = "sindico";
const DB_FILE_NAME: &str = "sync-ledger.db";
const CONFIG_FILE_NAME: &str = "sync-config.json";

#[derive(Debug, Serialize)]
pub struct ConflictListItem {
    pub ledger_id: i64,
    pub store: String,
    pub record_id: String,
    pub conflict_type: String,
    pub local_timestamp: i64,
    pub server_timestamp: i64,
    pub detected_at: i64,
    pub detected_at_iso: String,
    pub status: String,
    pub resolution: Option<String>,
    pub resolved_at_iso: Option<String>,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("SINDICO_DB_PATH").map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(DB_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) =
        cli_config_path.or_else(|| env::var_os("SINDICO_CONFIG").map(PathBuf::from))
    {
        return Ok(path);
    }
    default_config_path()
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".to_string()))
}

pub fn open_database(path: &Path) -> Result<Database, CliError> {
    tracing::debug!("Opening conflict ledger at {}", path.display());
    Ok(Database::open(path)?)
}

pub fn load_settings(path: &Path) -> Result<SyncSettings, CliError> {
    Ok(SyncSettings::load_from_path(path)?)
}

pub fn parse_store(name: &str) -> Result<Store, CliError> {
    Ok(Store::from_str(name)?)
}

pub fn parse_store_option(name: Option<&str>) -> Result<Option<Store>, CliError> {
    name.map(parse_store).transpose()
}

pub const fn strategy_from_arg(arg: StrategyArg) -> ResolutionStrategy {
    match arg {
        StrategyArg::Newest => ResolutionStrategy::Newest,
        StrategyArg::Oldest => ResolutionStrategy::Oldest,
        StrategyArg::Local => ResolutionStrategy::Local,
        StrategyArg::Server => ResolutionStrategy::Server,
    }
}

/// Fetch a ledger entry that must still be pending.
pub fn pending_entry(
    repo: &SqliteConflictRepository<'_>,
    ledger_id: i64,
) -> Result<LedgerEntry, CliError> {
    let entry = repo
        .get(ledger_id)?
        .ok_or(CliError::ConflictNotFound(ledger_id))?;
    if entry.conflict.is_resolved() {
        return Err(CliError::ConflictAlreadyResolved(ledger_id));
    }
    Ok(entry)
}

pub fn ledger_conflicts(entries: &[LedgerEntry]) -> Vec<ConflictItem> {
    entries.iter().map(|entry| entry.conflict.clone()).collect()
}

/// Read a JSON array of records from a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Vec<Value>, CliError> {
    match read_json(path)? {
        Value::Array(records) => Ok(records),
        _ => Err(CliError::InvalidSnapshot {
            path: path.display().to_string(),
            message: "expected a JSON array of records".to_string(),
        }),
    }
}

/// Read a single JSON record, as kept by a manual resolution.
pub fn read_record(path: &Path) -> Result<Value, CliError> {
    match read_json(path)? {
        record @ Value::Object(_) => Ok(record),
        _ => Err(CliError::InvalidSnapshot {
            path: path.display().to_string(),
            message: "expected a JSON object".to_string(),
        }),
    }
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|error| CliError::InvalidSnapshot {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|error| CliError::InvalidSnapshot {
        path: path.display().to_string(),
        message: error.to_string(),
    })
}

pub fn entry_to_list_item(entry: &LedgerEntry) -> ConflictListItem {
    let conflict = &entry.conflict;
    ConflictListItem {
        ledger_id: entry.ledger_id,
        store: conflict.store().to_string(),
        record_id: conflict.id().to_string(),
        conflict_type: conflict.conflict_type().to_string(),
        local_timestamp: conflict.local_timestamp(),
        server_timestamp: conflict.server_timestamp(),
        detected_at: entry.detected_at,
        detected_at_iso: format_timestamp_rfc3339(entry.detected_at),
        status: conflict_status(conflict).to_string(),
        resolution: conflict
            .resolution()
            .map(|resolution| resolution.as_str().to_string()),
        resolved_at_iso: conflict.resolved_at().map(format_timestamp_rfc3339),
    }
}

pub fn format_conflict_lines(entries: &[LedgerEntry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| {
            let conflict = &entry.conflict;
            let status = conflict.resolution().map_or_else(
                || conflict_status(conflict).to_string(),
                |resolution| format!("{} ({})", conflict_status(conflict), resolution.as_str()),
            );
            format!(
                "{:<5}  {:<20}  {:<24}  {:<18}  {}",
                entry.ledger_id,
                conflict.store().as_str(),
                record_label(conflict.id(), 24),
                status,
                format_relative_time(entry.detected_at, now_ms)
            )
        })
        .collect()
}

pub const fn conflict_status(conflict: &ConflictItem) -> &'static str {
    if conflict.is_resolved() {
        "resolved"
    } else {
        "pending"
    }
}

pub fn record_label(id: &str, max_chars: usize) -> String {
    if id.is_empty() {
        return "(no id)".to_string();
    }
    if id.chars().count() <= max_chars {
        id.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = id.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
