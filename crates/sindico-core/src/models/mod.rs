//! Data models for App Síndico offline sync

mod conflict;
mod record;
mod store;

pub use conflict::{ConflictItem, ConflictStats, ConflictType, Resolution, ResolutionStrategy};
pub use record::{canonical_json, parse_timestamp, value_id, SyncRecord};
pub use store::Store;
