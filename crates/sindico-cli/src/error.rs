use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] sindico_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to read {path}: {message}")]
    InvalidSnapshot { path: String, message: String },
    #[error("Conflict not found for ledger id: {0}")]
    ConflictNotFound(i64),
    #[error("Conflict {0} is already resolved")]
    ConflictAlreadyResolved(i64),
    #[error("Configuration error: {0}")]
    Config(String),
}
