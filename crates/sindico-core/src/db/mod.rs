//! Durable conflict ledger

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{
    ConflictRepository, LedgerEntry, LedgerFilter, LedgerState, SqliteConflictRepository,
};
