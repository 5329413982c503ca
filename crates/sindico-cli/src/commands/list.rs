use std::path::Path;

use sindico_core::db::{ConflictRepository, LedgerFilter, LedgerState, SqliteConflictRepository};

use crate::cli::StateArgs;
use crate::commands::common::{
    entry_to_list_item, format_conflict_lines, open_database, parse_store_option,
    ConflictListItem,
};
use crate::error::CliError;

pub const fn ledger_state(state: StateArgs) -> LedgerState {
    if state.pending {
        LedgerState::Pending
    } else if state.resolved {
        LedgerState::Resolved
    } else {
        LedgerState::All
    }
}

pub fn run_list(
    state: StateArgs,
    store: Option<&str>,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let filter = LedgerFilter {
        state: ledger_state(state),
        store: parse_store_option(store)?,
    };
    let db = open_database(db_path)?;
    let repo = SqliteConflictRepository::new(db.connection());
    let entries = repo.list(filter, limit)?;

    if as_json {
        let json_items = entries
            .iter()
            .map(entry_to_list_item)
            .collect::<Vec<ConflictListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_conflict_lines(&entries) {
        println!("{line}");
    }
    Ok(())
}
