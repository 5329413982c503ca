use std::path::Path;

use sindico_core::conflict::calculate_conflict_stats;
use sindico_core::db::{ConflictRepository, SqliteConflictRepository};
use sindico_core::ConflictStats;

use crate::commands::common::{ledger_conflicts, open_database};
use crate::error::CliError;

pub fn run_stats(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());
    let entries = repo.list_all()?;
    let stats = calculate_conflict_stats(&ledger_conflicts(&entries));

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats_lines(&stats) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_stats_lines(stats: &ConflictStats) -> Vec<String> {
    let mut lines = vec![
        format!("Total:    {}", stats.total),
        format!("Pending:  {}", stats.pending),
        format!("Resolved: {}", stats.resolved),
    ];

    if !stats.by_store.is_empty() {
        lines.push(String::new());
        lines.push("By store:".to_string());
        lines.extend(
            stats
                .by_store
                .iter()
                .map(|(store, count)| format!("  {store:<20}  {count}")),
        );
    }
    if !stats.by_type.is_empty() {
        lines.push(String::new());
        lines.push("By type:".to_string());
        lines.extend(
            stats
                .by_type
                .iter()
                .map(|(conflict_type, count)| format!("  {conflict_type:<20}  {count}")),
        );
    }
    lines
}
