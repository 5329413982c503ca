//! Database migrations

use crate::error::{Error, Result};
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::Database(format!(
            "ledger schema version {version} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: conflict ledger
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN TRANSACTION;

        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS sync_conflicts (
            ledger_id INTEGER PRIMARY KEY AUTOINCREMENT,
            store TEXT NOT NULL,
            record_id TEXT NOT NULL,
            conflict_type TEXT NOT NULL,
            local_timestamp INTEGER NOT NULL,
            server_timestamp INTEGER NOT NULL,
            detected_at INTEGER NOT NULL,
            resolved INTEGER NOT NULL DEFAULT 0,
            resolution TEXT,
            resolved_at INTEGER,
            payload TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sync_conflicts_record
            ON sync_conflicts(store, record_id);
        CREATE INDEX IF NOT EXISTS idx_sync_conflicts_detected
            ON sync_conflicts(detected_at DESC);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sync_conflicts_one_pending
            ON sync_conflicts(store, record_id) WHERE resolved = 0;

        INSERT INTO schema_version (version) VALUES (1);

        COMMIT;",
    )
    .inspect_err(|_| {
        conn.execute_batch("ROLLBACK").ok();
    })?;

    tracing::info!("Migrated conflict ledger to version {CURRENT_VERSION}");
    Ok(())
}
