use std::path::{Path, PathBuf};

use chrono::Utc;
use sindico_core::db::{ConflictRepository, SqliteConflictRepository};
use sindico_core::export::{export_conflict_history, suggested_export_file_name};

use crate::commands::common::{ledger_conflicts, open_database};
use crate::error::CliError;

pub fn run_export(output_path: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());
    let conflicts = ledger_conflicts(&repo.list_all()?);

    let now_ms = Utc::now().timestamp_millis();
    let rendered = export_conflict_history(&conflicts, now_ms)?;

    if let Some(path) = output_path {
        let path = export_target(path, now_ms);
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// Exporting into a directory uses the suggested file name.
pub fn export_target(path: &Path, now_ms: i64) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(now_ms))
    } else {
        path.to_path_buf()
    }
}
