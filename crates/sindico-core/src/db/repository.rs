//! Conflict ledger repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::{Error, Result};
use crate::models::{ConflictItem, Store};
use crate::util::unix_timestamp_ms_now;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

const SELECT_COLUMNS: &str = "SELECT ledger_id, detected_at, payload FROM sync_conflicts";

/// A conflict as stored in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Ledger row identifier
    pub ledger_id: i64,
    /// When the conflict was (last) recorded, Unix ms
    pub detected_at: i64,
    pub conflict: ConflictItem,
}

/// Which conflicts a listing includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerState {
    #[default]
    All,
    Pending,
    Resolved,
}

/// Listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerFilter {
    pub state: LedgerState,
    pub store: Option<Store>,
}

impl LedgerFilter {
    pub const fn pending() -> Self {
        Self {
            state: LedgerState::Pending,
            store: None,
        }
    }

    #[must_use]
    pub const fn with_store(mut self, store: Option<Store>) -> Self {
        self.store = store;
        self
    }
}

/// Trait for conflict ledger storage operations
pub trait ConflictRepository {
    /// Record a detected conflict.
    ///
    /// A record has at most one pending conflict: recording a newer detection
    /// for the same store and id replaces the pending snapshot.
    fn record(&self, conflict: &ConflictItem) -> Result<LedgerEntry>;

    /// Get an entry by ledger id
    fn get(&self, ledger_id: i64) -> Result<Option<LedgerEntry>>;

    /// Get the pending entry of a record, if any
    fn find_pending(&self, store: Store, record_id: &str) -> Result<Option<LedgerEntry>>;

    /// List entries, most recently detected first
    fn list(&self, filter: LedgerFilter, limit: usize) -> Result<Vec<LedgerEntry>>;

    /// List every entry, most recently detected first
    fn list_all(&self) -> Result<Vec<LedgerEntry>>;

    /// Store the resolution of a pending entry. Resolved entries never reopen.
    fn apply_resolution(&self, ledger_id: i64, resolved: &ConflictItem) -> Result<LedgerEntry>;

    /// Delete resolved entries settled before `resolved_before` (Unix ms)
    fn clear_resolved(&self, resolved_before: i64) -> Result<usize>;
}

/// `SQLite` implementation of `ConflictRepository`
pub struct SqliteConflictRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteConflictRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a ledger entry from a database row
    fn parse_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
        let payload: String = row.get(2)?;
        let conflict = serde_json::from_str(&payload).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error))
        })?;

        Ok(LedgerEntry {
            ledger_id: row.get(0)?,
            detected_at: row.get(1)?,
            conflict,
        })
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, Self::parse_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

impl ConflictRepository for SqliteConflictRepository<'_> {
    fn record(&self, conflict: &ConflictItem) -> Result<LedgerEntry> {
        let now = unix_timestamp_ms_now();
        let payload = serde_json::to_string(conflict)?;
        let store = conflict.store().as_str();
        let resolution = conflict.resolution().map(|resolution| resolution.as_str());

        let tx = self.conn.unchecked_transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT ledger_id FROM sync_conflicts
                 WHERE store = ? AND record_id = ? AND resolved = 0",
                params![store, conflict.id()],
                |row| row.get(0),
            )
            .optional()?;

        let ledger_id = if let Some(ledger_id) = existing {
            tx.execute(
                "UPDATE sync_conflicts
                 SET conflict_type = ?, local_timestamp = ?, server_timestamp = ?,
                     detected_at = ?, resolved = ?, resolution = ?, resolved_at = ?, payload = ?
                 WHERE ledger_id = ?",
                params![
                    conflict.conflict_type().as_str(),
                    conflict.local_timestamp(),
                    conflict.server_timestamp(),
                    now,
                    i32::from(conflict.is_resolved()),
                    resolution,
                    conflict.resolved_at(),
                    payload,
                    ledger_id
                ],
            )?;
            tracing::debug!("Replaced pending conflict {ledger_id} for {store}/{}", conflict.id());
            ledger_id
        } else {
            tx.execute(
                "INSERT INTO sync_conflicts (
                    store, record_id, conflict_type, local_timestamp, server_timestamp,
                    detected_at, resolved, resolution, resolved_at, payload
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    store,
                    conflict.id(),
                    conflict.conflict_type().as_str(),
                    conflict.local_timestamp(),
                    conflict.server_timestamp(),
                    now,
                    i32::from(conflict.is_resolved()),
                    resolution,
                    conflict.resolved_at(),
                    payload
                ],
            )?;
            tx.last_insert_rowid()
        };
        tx.commit()?;

        Ok(LedgerEntry {
            ledger_id,
            detected_at: now,
            conflict: conflict.clone(),
        })
    }

    fn get(&self, ledger_id: i64) -> Result<Option<LedgerEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE ledger_id = ?"),
                params![ledger_id],
                Self::parse_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn find_pending(&self, store: Store, record_id: &str) -> Result<Option<LedgerEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE store = ? AND record_id = ? AND resolved = 0"),
                params![store.as_str(), record_id],
                Self::parse_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn list(&self, filter: LedgerFilter, limit: usize) -> Result<Vec<LedgerEntry>> {
        let resolved = match filter.state {
            LedgerState::All => None,
            LedgerState::Pending => Some(0),
            LedgerState::Resolved => Some(1),
        };

        self.query_entries(
            &format!(
                "{SELECT_COLUMNS}
                 WHERE (?1 IS NULL OR resolved = ?1) AND (?2 IS NULL OR store = ?2)
                 ORDER BY detected_at DESC, ledger_id DESC
                 LIMIT ?3"
            ),
            params![
                resolved,
                filter.store.map(Store::as_str),
                limit as i64
            ],
        )
    }

    fn list_all(&self) -> Result<Vec<LedgerEntry>> {
        self.query_entries(
            &format!("{SELECT_COLUMNS} ORDER BY detected_at DESC, ledger_id DESC"),
            [],
        )
    }

    fn apply_resolution(&self, ledger_id: i64, resolved: &ConflictItem) -> Result<LedgerEntry> {
        if !resolved.is_resolved() {
            return Err(Error::InvalidInput(format!(
                "conflict {ledger_id} has no resolution to apply"
            )));
        }

        let entry = self
            .get(ledger_id)?
            .ok_or_else(|| Error::NotFound(ledger_id.to_string()))?;
        if entry.conflict.is_resolved() {
            return Err(Error::AlreadyResolved(ledger_id.to_string()));
        }
        if entry.conflict.store() != resolved.store() || entry.conflict.id() != resolved.id() {
            return Err(Error::InvalidInput(format!(
                "resolution for {}/{} does not match conflict {ledger_id} ({}/{})",
                resolved.store(),
                resolved.id(),
                entry.conflict.store(),
                entry.conflict.id()
            )));
        }

        let rows = self.conn.execute(
            "UPDATE sync_conflicts
             SET resolved = 1, resolution = ?, resolved_at = ?, payload = ?
             WHERE ledger_id = ? AND resolved = 0",
            params![
                resolved.resolution().map(|resolution| resolution.as_str()),
                resolved.resolved_at(),
                serde_json::to_string(resolved)?,
                ledger_id
            ],
        )?;
        if rows == 0 {
            return Err(Error::AlreadyResolved(ledger_id.to_string()));
        }

        tracing::info!(
            "Resolved conflict {ledger_id} ({}/{}) as {}",
            resolved.store(),
            resolved.id(),
            resolved
                .resolution()
                .map_or("unknown", |resolution| resolution.as_str())
        );

        Ok(LedgerEntry {
            ledger_id,
            detected_at: entry.detected_at,
            conflict: resolved.clone(),
        })
    }

    fn clear_resolved(&self, resolved_before: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM sync_conflicts WHERE resolved = 1 AND resolved_at < ?",
            params![resolved_before],
        )?;
        if rows > 0 {
            tracing::info!("Cleared {rows} resolved conflicts from the ledger");
        }
        Ok(rows)
    }
}
