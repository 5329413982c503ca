//! sindico-core - Offline-sync core for App Síndico
//!
//! This crate contains the record and conflict models, the conflict
//! detection/resolution/merge functions, the SQLite-backed conflict ledger,
//! and the reconcile pass used by every App Síndico client (web shell, CLI).

pub mod config;
pub mod conflict;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{ConflictItem, ConflictStats, Resolution, ResolutionStrategy, Store, SyncRecord};
