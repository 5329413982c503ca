use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::CommandFactory;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sindico_core::config::SyncSettings;
use sindico_core::conflict::{compare, DisplayOptions};
use sindico_core::db::{ConflictRepository, Database, LedgerEntry, SqliteConflictRepository};
use sindico_core::export::parse_conflict_history;
use sindico_core::sync::AutoResolution;
use sindico_core::{ConflictStats, Resolution, ResolutionStrategy, Store};
use tempfile::{tempdir, TempDir};

use crate::cli::{Cli, CompletionShell, StateArgs, StrategyArg};
use crate::commands::clear::clear_resolved;
use crate::commands::common::{
    entry_to_list_item, format_conflict_lines, format_relative_time, format_sync_timestamp,
    read_record, read_snapshot, record_label, resolve_config_path, resolve_db_path,
    strategy_from_arg,
};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::{apply_overrides, run_config_init};
use crate::commands::detect::{detect_policy, run_detect};
use crate::commands::diff::format_diff_lines;
use crate::commands::export::{export_target, run_export};
use crate::commands::list::ledger_state;
use crate::commands::resolve::{run_resolve, run_resolve_all, ResolveChoice};
use crate::commands::stats::format_stats_lines;
use crate::error::CliError;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("data").join("sync-ledger.db")
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config").join("sync-config.json")
    }

    fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn detect(&self, store: &str, local: &Value, server: &Value, auto_resolve: bool) {
        let local_path = self.write_json(&format!("{store}-local.json"), local);
        let server_path = self.write_json(&format!("{store}-server.json"), server);
        run_detect(
            store,
            &local_path,
            &server_path,
            auto_resolve,
            None,
            false,
            &self.db_path(),
            &self.config_path(),
        )
        .unwrap();
    }

    fn entries(&self) -> Vec<LedgerEntry> {
        let db = Database::open(self.db_path()).unwrap();
        let repo = SqliteConflictRepository::new(db.connection());
        repo.list_all().unwrap()
    }

    fn entry_for(&self, record_id: &str) -> LedgerEntry {
        self.entries()
            .into_iter()
            .find(|entry| entry.conflict.id() == record_id)
            .unwrap()
    }
}

fn announcements_local() -> Value {
    json!([
        {"id": "a1", "updatedAt": 300, "title": "Obra na garagem", "pinned": true},
        {"id": "a2", "updatedAt": 100, "title": "Assembleia"},
        {"id": "a3", "updatedAt": 100, "title": "Só local"}
    ])
}

fn announcements_server() -> Value {
    json!([
        {"id": "a1", "updatedAt": 200, "title": "Obra na garagem (adiada)", "pinned": true},
        {"id": "a2", "updatedAt": 100, "title": "Assembleia"},
        {"id": "a4", "updatedAt": 100, "title": "Só servidor"}
    ])
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn record_label_truncates_with_ellipsis() {
    assert_eq!(record_label("short", 10), "short");
    assert_eq!(record_label("a-very-long-record-id", 10), "a-very-...");
    assert_eq!(record_label("", 10), "(no id)");
}

#[test]
fn strategy_args_map_to_strategies() {
    assert_eq!(strategy_from_arg(StrategyArg::Newest), ResolutionStrategy::Newest);
    assert_eq!(strategy_from_arg(StrategyArg::Oldest), ResolutionStrategy::Oldest);
    assert_eq!(strategy_from_arg(StrategyArg::Local), ResolutionStrategy::Local);
    assert_eq!(strategy_from_arg(StrategyArg::Server), ResolutionStrategy::Server);
}

#[test]
fn explicit_paths_take_precedence() {
    let db_path = PathBuf::from("/tmp/explicit.db");
    let config_path = PathBuf::from("/tmp/explicit.json");
    assert_eq!(resolve_db_path(Some(db_path.clone())).unwrap(), db_path);
    assert_eq!(
        resolve_config_path(Some(config_path.clone())).unwrap(),
        config_path
    );
}

#[test]
fn ledger_state_follows_flags() {
    use sindico_core::db::LedgerState;

    assert_eq!(ledger_state(StateArgs::default()), LedgerState::All);
    assert_eq!(
        ledger_state(StateArgs {
            pending: true,
            resolved: false
        }),
        LedgerState::Pending
    );
    assert_eq!(
        ledger_state(StateArgs {
            pending: false,
            resolved: true
        }),
        LedgerState::Resolved
    );
}

#[test]
fn detect_policy_prefers_explicit_strategy() {
    let settings = SyncSettings {
        prefer_merge: true,
        ..SyncSettings::default()
    };

    assert_eq!(detect_policy(&settings, false, None).auto_resolve, None);
    assert_eq!(
        detect_policy(&settings, true, None).auto_resolve,
        Some(AutoResolution::Merge)
    );
    assert_eq!(
        detect_policy(&settings, true, Some(StrategyArg::Server)).auto_resolve,
        Some(AutoResolution::Strategy(ResolutionStrategy::Server))
    );
}

#[test]
fn read_snapshot_rejects_non_arrays() {
    let workspace = Workspace::new();
    let path = workspace.write_json("record.json", &json!({"id": "a"}));

    let error = read_snapshot(&path).unwrap_err();
    assert!(matches!(error, CliError::InvalidSnapshot { .. }));
    assert!(read_record(&path).is_ok());
}

#[test]
fn read_snapshot_reports_missing_file() {
    let error = read_snapshot(Path::new("/definitely/missing.json")).unwrap_err();
    assert!(error.to_string().contains("/definitely/missing.json"));
}

#[test]
fn run_detect_records_pending_conflicts() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );

    let entries = workspace.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].conflict.id(), "a1");
    assert_eq!(entries[0].conflict.store(), Store::Announcements);
    assert!(!entries[0].conflict.is_resolved());
}

#[test]
fn run_detect_twice_keeps_one_pending_entry() {
    let workspace = Workspace::new();
    let local = announcements_local();
    let server = announcements_server();
    workspace.detect("announcements", &local, &server, false);
    workspace.detect("announcements", &local, &server, false);

    assert_eq!(workspace.entries().len(), 1);
}

#[test]
fn run_detect_rejects_unknown_store() {
    let workspace = Workspace::new();
    let local = workspace.write_json("local.json", &json!([]));
    let server = workspace.write_json("server.json", &json!([]));

    let error = run_detect(
        "elevators",
        &local,
        &server,
        false,
        None,
        false,
        &workspace.db_path(),
        &workspace.config_path(),
    )
    .unwrap_err();
    assert!(matches!(error, CliError::Core(_)));
}

#[test]
fn run_detect_auto_resolves_with_configured_strategy() {
    let workspace = Workspace::new();
    run_config_init(
        &workspace.config_path(),
        Some(StrategyArg::Server),
        None,
        None,
        None,
    )
    .unwrap();

    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        true,
    );

    let entry = workspace.entry_for("a1");
    assert_eq!(entry.conflict.resolution(), Some(Resolution::Server));
    assert_eq!(
        entry.conflict.resolved_data().and_then(|data| data.get("title")),
        Some(&json!("Obra na garagem (adiada)"))
    );
}

#[test]
fn run_resolve_uses_default_strategy() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );
    let ledger_id = workspace.entry_for("a1").ledger_id;

    run_resolve(
        ledger_id,
        &ResolveChoice::Strategy(None),
        &workspace.db_path(),
        &workspace.config_path(),
    )
    .unwrap();

    let entry = workspace.entry_for("a1");
    assert_eq!(entry.conflict.resolution(), Some(Resolution::Local));
    assert!(entry.conflict.resolved_at().is_some());
}

#[test]
fn run_resolve_rejects_already_resolved_conflict() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );
    let ledger_id = workspace.entry_for("a1").ledger_id;
    let choice = ResolveChoice::Strategy(Some(ResolutionStrategy::Server));

    run_resolve(ledger_id, &choice, &workspace.db_path(), &workspace.config_path()).unwrap();
    let error = run_resolve(ledger_id, &choice, &workspace.db_path(), &workspace.config_path())
        .unwrap_err();

    assert!(matches!(error, CliError::ConflictAlreadyResolved(id) if id == ledger_id));
}

#[test]
fn run_resolve_reports_missing_conflict() {
    let workspace = Workspace::new();
    let error = run_resolve(
        42,
        &ResolveChoice::Merge,
        &workspace.db_path(),
        &workspace.config_path(),
    )
    .unwrap_err();

    assert!(matches!(error, CliError::ConflictNotFound(42)));
}

#[test]
fn run_resolve_merge_keeps_both_sides() {
    let workspace = Workspace::new();
    workspace.detect(
        "maintenance_orders",
        &json!([{"id": 7, "updatedAt": 20, "photos": ["a.jpg"], "status": "open"}]),
        &json!([{"id": 7, "updatedAt": 10, "photos": ["b.jpg"], "priority": "high"}]),
        false,
    );
    let ledger_id = workspace.entry_for("7").ledger_id;

    run_resolve(
        ledger_id,
        &ResolveChoice::Merge,
        &workspace.db_path(),
        &workspace.config_path(),
    )
    .unwrap();

    let entry = workspace.entry_for("7");
    assert_eq!(entry.conflict.resolution(), Some(Resolution::Merge));
    assert_eq!(
        entry.conflict.resolved_data(),
        Some(&json!({
            "id": 7,
            "updatedAt": 20,
            "photos": ["a.jpg", "b.jpg"],
            "status": "open",
            "priority": "high"
        }))
    );
}

#[test]
fn run_resolve_manual_keeps_edited_record() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );
    let ledger_id = workspace.entry_for("a1").ledger_id;
    let edited = json!({"id": "a1", "updatedAt": 400, "title": "Obra remarcada"});
    let edited_path = workspace.write_json("edited.json", &edited);

    run_resolve(
        ledger_id,
        &ResolveChoice::Manual(edited_path),
        &workspace.db_path(),
        &workspace.config_path(),
    )
    .unwrap();

    let entry = workspace.entry_for("a1");
    assert_eq!(entry.conflict.resolution(), Some(Resolution::Manual));
    assert_eq!(entry.conflict.resolved_data(), Some(&edited));
}

#[test]
fn run_resolve_all_filters_by_store() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );
    workspace.detect(
        "polls",
        &json!([{"id": "p1", "updatedAt": 5, "question": "Pintar a fachada?"}]),
        &json!([{"id": "p1", "updatedAt": 9, "question": "Pintar a fachada de azul?"}]),
        false,
    );

    run_resolve_all(
        Some("polls"),
        &ResolveChoice::Strategy(Some(ResolutionStrategy::Newest)),
        &workspace.db_path(),
        &workspace.config_path(),
    )
    .unwrap();

    assert_eq!(
        workspace.entry_for("p1").conflict.resolution(),
        Some(Resolution::Server)
    );
    assert!(!workspace.entry_for("a1").conflict.is_resolved());
}

#[test]
fn run_resolve_all_rejects_manual_choice() {
    let workspace = Workspace::new();
    let error = run_resolve_all(
        None,
        &ResolveChoice::Manual(PathBuf::from("edited.json")),
        &workspace.db_path(),
        &workspace.config_path(),
    )
    .unwrap_err();

    assert!(matches!(error, CliError::Config(_)));
}

#[test]
fn resolve_choice_from_flags() {
    assert_eq!(
        ResolveChoice::from_flags(None, false, None),
        ResolveChoice::Strategy(None)
    );
    assert_eq!(
        ResolveChoice::from_flags(Some(StrategyArg::Oldest), false, None),
        ResolveChoice::Strategy(Some(ResolutionStrategy::Oldest))
    );
    assert_eq!(ResolveChoice::from_flags(None, true, None), ResolveChoice::Merge);
    assert_eq!(
        ResolveChoice::from_flags(None, false, Some(PathBuf::from("x.json"))),
        ResolveChoice::Manual(PathBuf::from("x.json"))
    );
}

#[test]
fn run_export_writes_history_file() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );
    let output = workspace.dir.path().join("history.json");

    run_export(Some(&output), &workspace.db_path()).unwrap();

    let history = parse_conflict_history(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(history.total_conflicts, 1);
    assert_eq!(history.conflicts[0].id(), "a1");
}

#[test]
fn export_target_uses_suggested_name_for_directories() {
    let workspace = Workspace::new();
    assert_eq!(
        export_target(workspace.dir.path(), 1_700_000_000_000),
        workspace
            .dir
            .path()
            .join("sindico-conflicts-1700000000000.json")
    );

    let file = workspace.dir.path().join("out.json");
    assert_eq!(export_target(&file, 1), file);
}

#[test]
fn clear_resolved_respects_retention() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        true,
    );
    workspace.detect(
        "polls",
        &json!([{"id": "p1", "updatedAt": 5, "question": "Pintar a fachada?"}]),
        &json!([{"id": "p1", "updatedAt": 9, "question": "Pintar a fachada de azul?"}]),
        false,
    );

    let db = Database::open(workspace.db_path()).unwrap();
    let repo = SqliteConflictRepository::new(db.connection());
    let settings = SyncSettings {
        retention_days: 1,
        ..SyncSettings::default()
    };

    let now_ms = Utc::now().timestamp_millis();
    assert_eq!(clear_resolved(&repo, &settings, now_ms).unwrap(), 0);

    let two_days_later = now_ms + 2 * 24 * 60 * 60 * 1000;
    assert_eq!(clear_resolved(&repo, &settings, two_days_later).unwrap(), 1);

    let remaining = repo.list_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].conflict.id(), "p1");
}

#[test]
fn config_init_persists_overrides() {
    let workspace = Workspace::new();
    run_config_init(
        &workspace.config_path(),
        Some(StrategyArg::Oldest),
        Some(true),
        None,
        Some(30),
    )
    .unwrap();

    let settings = SyncSettings::load_from_path(&workspace.config_path()).unwrap();
    assert_eq!(settings.default_strategy, ResolutionStrategy::Oldest);
    assert!(settings.auto_resolve);
    assert!(!settings.prefer_merge);
    assert_eq!(settings.retention_days, 30);
}

#[test]
fn apply_overrides_rejects_zero_retention() {
    let mut settings = SyncSettings::default();
    let error = apply_overrides(&mut settings, None, None, None, Some(0)).unwrap_err();
    assert!(matches!(error, CliError::Config(_)));
    assert_eq!(settings.retention_days, 90);
}

#[test]
fn list_lines_include_key_fields() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );
    let entries = workspace.entries();

    let lines = format_conflict_lines(&entries);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("announcements"));
    assert!(lines[0].contains("a1"));
    assert!(lines[0].contains("pending"));

    let item = entry_to_list_item(&entries[0]);
    assert_eq!(item.status, "pending");
    assert_eq!(item.conflict_type, "update");
    assert_eq!(item.resolution, None);
}

#[test]
fn diff_lines_mark_differing_fields() {
    let workspace = Workspace::new();
    workspace.detect(
        "announcements",
        &announcements_local(),
        &announcements_server(),
        false,
    );
    let entry = workspace.entry_for("a1");
    let fields = compare(entry.conflict.local_data(), entry.conflict.server_data());

    let lines = format_diff_lines(&entry, &fields, &DisplayOptions::default());

    assert!(lines[0].contains("announcements/a1"));
    assert!(lines
        .iter()
        .any(|line| line.starts_with("* Title") && line.contains("->")));
    assert!(lines
        .iter()
        .any(|line| line.starts_with("  Pinned") && line.contains("Sim")));
}

#[test]
fn stats_lines_group_by_store_and_type() {
    let mut stats = ConflictStats {
        total: 3,
        pending: 2,
        resolved: 1,
        ..ConflictStats::default()
    };
    stats.by_store.insert("polls".to_string(), 3);
    stats.by_type.insert("update".to_string(), 3);

    let lines = format_stats_lines(&stats);
    assert_eq!(lines[0], "Total:    3");
    assert!(lines.contains(&"By store:".to_string()));
    assert!(lines.iter().any(|line| line.contains("polls") && line.ends_with('3')));
}

#[test]
fn completions_target_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("sindico-sync"));
}

#[test]
fn run_completions_writes_script_file() {
    let workspace = Workspace::new();
    let output = workspace.dir.path().join("sindico-sync.fish");

    run_completions(CompletionShell::Fish, Some(&output)).unwrap();

    let script = std::fs::read_to_string(output).unwrap();
    assert!(script.contains("sindico-sync"));
}
