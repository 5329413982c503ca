//! Sync conflict model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Store;
use crate::error::Error;

/// Nature of the divergence between the local and server copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    /// Both sides carry a different version of the record
    Update,
    /// One side deleted the record
    Delete,
    /// Both sides created a record with the same identity
    Create,
}

impl ConflictType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a conflict was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Local copy kept
    Local,
    /// Server copy kept
    Server,
    /// Structural merge of both copies
    Merge,
    /// Record supplied by a person reviewing the conflict
    Manual,
}

impl Resolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Server => "server",
            Self::Merge => "merge",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Automatic resolution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Keep whichever side changed last (ties go to the server)
    #[default]
    Newest,
    /// Keep whichever side changed first (ties go to the server)
    Oldest,
    /// Always keep the local copy
    Local,
    /// Always keep the server copy
    Server,
}

impl ResolutionStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Local => "local",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "local" => Ok(Self::Local),
            "server" => Ok(Self::Server),
            other => Err(Error::InvalidInput(format!(
                "unknown resolution strategy '{other}' (expected newest, oldest, local or server)"
            ))),
        }
    }
}

/// One detected divergence between a cached record and its server copy.
///
/// Items are immutable apart from a single resolution step, which sets the
/// resolution kind, instant and data together and is never undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictItem<T = Value> {
    id: String,
    store: Store,
    local_data: T,
    server_data: T,
    local_timestamp: i64,
    server_timestamp: i64,
    conflict_type: ConflictType,
    resolved: bool,
    #[serde(default)]
    resolution: Option<Resolution>,
    #[serde(default)]
    resolved_at: Option<i64>,
    resolved_data: Option<T>,
}

impl<T: Clone> ConflictItem<T> {
    /// Create a pending conflict
    pub fn new(
        id: impl Into<String>,
        store: Store,
        conflict_type: ConflictType,
        local_data: T,
        local_timestamp: i64,
        server_data: T,
        server_timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            store,
            local_data,
            server_data,
            local_timestamp,
            server_timestamp,
            conflict_type,
            resolved: false,
            resolution: None,
            resolved_at: None,
            resolved_data: None,
        }
    }

    /// Copy of this item carrying the given resolution
    #[must_use]
    pub(crate) fn with_resolution(&self, resolution: Resolution, resolved_at: i64, data: T) -> Self {
        Self {
            resolved: true,
            resolution: Some(resolution),
            resolved_at: Some(resolved_at),
            resolved_data: Some(data),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn store(&self) -> Store {
        self.store
    }

    pub const fn local_data(&self) -> &T {
        &self.local_data
    }

    pub const fn server_data(&self) -> &T {
        &self.server_data
    }

    pub const fn local_timestamp(&self) -> i64 {
        self.local_timestamp
    }

    pub const fn server_timestamp(&self) -> i64 {
        self.server_timestamp
    }

    pub const fn conflict_type(&self) -> ConflictType {
        self.conflict_type
    }

    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub const fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub const fn resolved_at(&self) -> Option<i64> {
        self.resolved_at
    }

    pub const fn resolved_data(&self) -> Option<&T> {
        self.resolved_data.as_ref()
    }
}

/// Aggregate counts over a set of conflicts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictStats {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
    pub by_store: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending() -> ConflictItem {
        ConflictItem::new(
            "a1",
            Store::Polls,
            ConflictType::Update,
            json!({"id": "a1", "title": "local"}),
            200,
            json!({"id": "a1", "title": "server"}),
            100,
        )
    }

    #[test]
    fn new_item_is_pending() {
        let item = pending();
        assert!(!item.is_resolved());
        assert_eq!(item.resolution(), None);
        assert_eq!(item.resolved_at(), None);
        assert!(item.resolved_data().is_none());
    }

    #[test]
    fn with_resolution_sets_all_fields_and_keeps_original() {
        let item = pending();
        let resolved = item.with_resolution(Resolution::Server, 999, json!({"id": "a1"}));

        assert!(resolved.is_resolved());
        assert_eq!(resolved.resolution(), Some(Resolution::Server));
        assert_eq!(resolved.resolved_at(), Some(999));
        assert_eq!(resolved.resolved_data(), Some(&json!({"id": "a1"})));
        assert!(!item.is_resolved());
    }

    #[test]
    fn item_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(pending()).unwrap();
        assert_eq!(value["store"], "polls");
        assert_eq!(value["conflictType"], "update");
        assert_eq!(value["localTimestamp"], 200);
        assert_eq!(value["serverData"]["title"], "server");
        assert_eq!(value["resolved"], false);
    }

    #[test]
    fn pending_item_deserializes_without_resolution_fields() {
        let item: ConflictItem = serde_json::from_value(json!({
            "id": "p1",
            "store": "polls",
            "localData": {"id": "p1", "updatedAt": 2},
            "serverData": {"id": "p1", "updatedAt": 1},
            "localTimestamp": 2,
            "serverTimestamp": 1,
            "conflictType": "update",
            "resolved": false
        }))
        .unwrap();

        assert!(!item.is_resolved());
        assert_eq!(item.resolution(), None);
        assert_eq!(item.resolved_at(), None);
        assert_eq!(item.resolved_data(), None);
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!(
            " Newest ".parse::<ResolutionStrategy>().unwrap(),
            ResolutionStrategy::Newest
        );
        assert_eq!(
            "server".parse::<ResolutionStrategy>().unwrap(),
            ResolutionStrategy::Server
        );
        assert!("merge".parse::<ResolutionStrategy>().is_err());
    }

    #[test]
    fn default_strategy_is_newest() {
        assert_eq!(ResolutionStrategy::default(), ResolutionStrategy::Newest);
    }
}
