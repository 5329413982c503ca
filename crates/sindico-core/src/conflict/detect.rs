//! Conflict detection between a cached record and its server copy

use crate::models::{ConflictItem, ConflictType, Store, SyncRecord};

/// Compare a local and server version of the same record.
///
/// Returns `None` when either side is missing (or a JSON `null`), when both sides carry the same
/// modification instant (checked first, whatever the content), or when both
/// sides serialize to the same canonical form. Otherwise a pending
/// [`ConflictType::Update`] conflict is returned for `store`.
pub fn detect<T: SyncRecord>(
    store: Store,
    local: Option<&T>,
    server: Option<&T>,
) -> Option<ConflictItem<T>> {
    let local = local.filter(|record| !record.is_absent())?;
    let server = server.filter(|record| !record.is_absent())?;

    let local_timestamp = local.modified_at();
    let server_timestamp = server.modified_at();
    if local_timestamp == server_timestamp {
        return None;
    }

    if local.canonical() == server.canonical() {
        return None;
    }

    let id = server
        .record_id()
        .or_else(|| local.record_id())
        .unwrap_or_default();

    tracing::debug!(
        "Conflict detected in {store} for record '{id}' (local={local_timestamp}, server={server_timestamp})"
    );

    Some(ConflictItem::new(
        id,
        store,
        ConflictType::Update,
        local.clone(),
        local_timestamp,
        server.clone(),
        server_timestamp,
    ))
}
