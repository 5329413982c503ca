use std::path::{Path, PathBuf};

use sindico_core::conflict::{Resolver, SystemClock};
use sindico_core::db::{ConflictRepository, LedgerEntry, SqliteConflictRepository};
use sindico_core::{ConflictItem, ResolutionStrategy};

use crate::cli::StrategyArg;
use crate::commands::common::{
    load_settings, open_database, parse_store_option, pending_entry, read_record,
    strategy_from_arg,
};
use crate::error::CliError;

/// How the kept version of a conflict is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveChoice {
    /// Pick a side; `None` uses the configured default strategy
    Strategy(Option<ResolutionStrategy>),
    Merge,
    Manual(PathBuf),
}

impl ResolveChoice {
    pub fn from_flags(strategy: Option<StrategyArg>, merge: bool, manual: Option<PathBuf>) -> Self {
        if let Some(path) = manual {
            Self::Manual(path)
        } else if merge {
            Self::Merge
        } else {
            Self::Strategy(strategy.map(strategy_from_arg))
        }
    }
}

/// Build the resolved version of a pending conflict.
pub fn resolve_conflict(
    resolver: &Resolver,
    conflict: &ConflictItem,
    choice: &ResolveChoice,
    default_strategy: ResolutionStrategy,
) -> Result<ConflictItem, CliError> {
    let resolved = match choice {
        ResolveChoice::Strategy(strategy) => {
            resolver.resolve(conflict, strategy.unwrap_or(default_strategy))
        }
        ResolveChoice::Merge => resolver.resolve_with_merge(conflict),
        ResolveChoice::Manual(path) => resolver.resolve_manually(conflict, read_record(path)?),
    };
    Ok(resolved)
}

pub fn run_resolve(
    ledger_id: i64,
    choice: &ResolveChoice,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());
    let entry = pending_entry(&repo, ledger_id)?;

    let resolver = Resolver::new(SystemClock);
    let resolved = resolve_conflict(&resolver, &entry.conflict, choice, settings.default_strategy)?;
    let entry = repo.apply_resolution(ledger_id, &resolved)?;

    println!("{}", format_resolved_line(&entry));
    Ok(())
}

pub fn run_resolve_all(
    store: Option<&str>,
    choice: &ResolveChoice,
    db_path: &Path,
    config_path: &Path,
) -> Result<(), CliError> {
    if matches!(choice, ResolveChoice::Manual(_)) {
        return Err(CliError::Config(
            "--manual resolves a single conflict and cannot be combined with --all".to_string(),
        ));
    }

    let store = parse_store_option(store)?;
    let settings = load_settings(config_path)?;
    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());

    let pending = repo
        .list_all()?
        .into_iter()
        .filter(|entry| !entry.conflict.is_resolved())
        .filter(|entry| store.is_none_or(|store| entry.conflict.store() == store))
        .collect::<Vec<_>>();

    if pending.is_empty() {
        println!("No pending conflicts.");
        return Ok(());
    }

    let resolver = Resolver::new(SystemClock);
    for entry in &pending {
        let resolved =
            resolve_conflict(&resolver, &entry.conflict, choice, settings.default_strategy)?;
        let entry = repo.apply_resolution(entry.ledger_id, &resolved)?;
        println!("{}", format_resolved_line(&entry));
    }
    println!("Resolved {} conflicts", pending.len());
    Ok(())
}

pub fn format_resolved_line(entry: &LedgerEntry) -> String {
    let conflict = &entry.conflict;
    format!(
        "Resolved conflict {} ({}/{}) keeping {}",
        entry.ledger_id,
        conflict.store(),
        conflict.id(),
        conflict
            .resolution()
            .map_or("unknown", |resolution| resolution.as_str())
    )
}
