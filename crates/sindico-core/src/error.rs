//! Error types for sindico-core

use thiserror::Error;

/// Result type alias using sindico-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sindico-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ledger entry not found
    #[error("Conflict not found: {0}")]
    NotFound(String),

    /// Attempt to resolve a conflict that already carries a resolution
    #[error("Conflict already resolved: {0}")]
    AlreadyResolved(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Settings file could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),
}
