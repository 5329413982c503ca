use std::path::Path;

use chrono::Utc;
use sindico_core::config::SyncSettings;
use sindico_core::db::{ConflictRepository, SqliteConflictRepository};

use crate::commands::common::{load_settings, open_database};
use crate::error::CliError;

pub fn run_clear(
    older_than_days: Option<u32>,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    let mut settings = load_settings(config_path)?;
    if let Some(days) = older_than_days {
        settings.retention_days = days;
    }

    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());
    let cleared = clear_resolved(&repo, &settings, Utc::now().timestamp_millis())?;

    println!(
        "Cleared {cleared} resolved conflicts older than {} days",
        settings.retention_days
    );
    Ok(())
}

pub fn clear_resolved(
    repo: &SqliteConflictRepository<'_>,
    settings: &SyncSettings,
    now_ms: i64,
) -> Result<usize, CliError> {
    Ok(repo.clear_resolved(settings.retention_cutoff(now_ms))?)
}
