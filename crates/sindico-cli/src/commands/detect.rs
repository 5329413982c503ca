use std::path::Path;

use serde::Serialize;
use sindico_core::config::SyncSettings;
use sindico_core::db::{ConflictRepository, LedgerEntry, SqliteConflictRepository};
use sindico_core::sync::{reconcile, AutoResolution, ReconcilePolicy, ReconcileReport};

use crate::cli::StrategyArg;
use crate::commands::common::{
    entry_to_list_item, format_conflict_lines, load_settings, open_database, parse_store,
    read_snapshot, strategy_from_arg, ConflictListItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct DetectSummary {
    pub store: String,
    pub conflicts: Vec<ConflictListItem>,
    pub pending: usize,
    pub resolved: usize,
    pub pulled: Vec<String>,
    pub pushed: Vec<String>,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Policy for a detect run: explicit flags win over the settings file.
pub fn detect_policy(
    settings: &SyncSettings,
    auto_resolve: bool,
    strategy: Option<StrategyArg>,
) -> ReconcilePolicy {
    if !auto_resolve {
        return settings.reconcile_policy();
    }

    let auto_resolve = match strategy {
        Some(strategy) => AutoResolution::Strategy(strategy_from_arg(strategy)),
        None if settings.prefer_merge => AutoResolution::Merge,
        None => AutoResolution::Strategy(settings.default_strategy),
    };
    ReconcilePolicy {
        auto_resolve: Some(auto_resolve),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_detect(
    store: &str,
    local_path: &Path,
    server_path: &Path,
    auto_resolve: bool,
    strategy: Option<StrategyArg>,
    as_json: bool,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    let store = parse_store(store)?;
    let settings = load_settings(config_path)?;
    let local = read_snapshot(local_path)?;
    let server = read_snapshot(server_path)?;

    let report = reconcile(
        store,
        &local,
        &server,
        &detect_policy(&settings, auto_resolve, strategy),
    );

    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());
    let entries = report
        .conflicts
        .iter()
        .map(|conflict| repo.record(conflict))
        .collect::<Result<Vec<_>, _>>()?;

    if as_json {
        let summary = detect_summary(&report, &entries);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{store}: {} conflicts ({} pending, {} resolved), {} pulled, {} pushed, {} unchanged",
        report.conflicts.len(),
        report.pending(),
        report.resolved(),
        report.pulled.len(),
        report.pushed.len(),
        report.unchanged
    );
    if report.skipped > 0 {
        println!("Skipped {} records without an id", report.skipped);
    }
    for line in format_conflict_lines(&entries) {
        println!("{line}");
    }
    Ok(())
}

pub fn detect_summary(report: &ReconcileReport, entries: &[LedgerEntry]) -> DetectSummary {
    DetectSummary {
        store: report.store.to_string(),
        conflicts: entries.iter().map(entry_to_list_item).collect(),
        pending: report.pending(),
        resolved: report.resolved(),
        pulled: report.pulled.clone(),
        pushed: report.pushed.clone(),
        unchanged: report.unchanged,
        skipped: report.skipped,
    }
}
