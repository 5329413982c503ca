//! Store-level reconcile pass run after a background pull.
//!
//! Pairs cached records with their freshly pulled server copies by id, runs
//! conflict detection on every pair and optionally settles the conflicts
//! straight away.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::conflict::{detect, Clock, Resolver, SystemClock};
use crate::models::{ConflictItem, ResolutionStrategy, Store, SyncRecord};

/// How detected conflicts are settled during a reconcile pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoResolution {
    /// Keep one side according to the strategy
    Strategy(ResolutionStrategy),
    /// Keep the structural merge of both sides
    Merge,
}

/// Reconcile behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcilePolicy {
    /// `None` leaves conflicts pending for review
    pub auto_resolve: Option<AutoResolution>,
}

/// Outcome of reconciling one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub store: Store,
    /// Detected conflicts, resolved when the policy auto-resolves
    pub conflicts: Vec<ConflictItem>,
    /// Ids only present on the server (to be written to the local cache)
    pub pulled: Vec<String>,
    /// Ids only present locally (to be pushed to the server)
    pub pushed: Vec<String>,
    /// Pairs with no conflict
    pub unchanged: usize,
    /// Records ignored because they carry no id
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn pending(&self) -> usize {
        self.conflicts
            .iter()
            .filter(|conflict| !conflict.is_resolved())
            .count()
    }

    pub fn resolved(&self) -> usize {
        self.conflicts.len() - self.pending()
    }
}

/// Reconcile with the system clock.
pub fn reconcile(
    store: Store,
    local: &[Value],
    server: &[Value],
    policy: &ReconcilePolicy,
) -> ReconcileReport {
    reconcile_with(&Resolver::new(SystemClock), store, local, server, policy)
}

/// Reconcile a store's cached records against the server's.
///
/// Records are paired by id; when a side lists the same id twice, the last
/// occurrence wins.
pub fn reconcile_with<C: Clock>(
    resolver: &Resolver<C>,
    store: Store,
    local: &[Value],
    server: &[Value],
    policy: &ReconcilePolicy,
) -> ReconcileReport {
    let mut skipped = 0;
    let local_by_id = index_by_id(store, "local", local, &mut skipped);
    let server_by_id = index_by_id(store, "server", server, &mut skipped);

    let ids = local_by_id
        .keys()
        .chain(server_by_id.keys())
        .collect::<BTreeSet<_>>();

    let mut report = ReconcileReport {
        store,
        conflicts: Vec::new(),
        pulled: Vec::new(),
        pushed: Vec::new(),
        unchanged: 0,
        skipped,
    };

    for id in ids {
        match (local_by_id.get(id), server_by_id.get(id)) {
            (Some(local_record), Some(server_record)) => {
                match detect(store, Some(*local_record), Some(*server_record)) {
                    Some(conflict) => report.conflicts.push(settle(resolver, &conflict, policy)),
                    None => report.unchanged += 1,
                }
            }
            (None, Some(_)) => report.pulled.push(id.clone()),
            (Some(_), None) => report.pushed.push(id.clone()),
            (None, None) => {}
        }
    }

    tracing::info!(
        "Reconciled {store}: {} conflicts ({} pending), {} pulled, {} pushed, {} unchanged",
        report.conflicts.len(),
        report.pending(),
        report.pulled.len(),
        report.pushed.len(),
        report.unchanged
    );
    report
}

fn settle<C: Clock>(
    resolver: &Resolver<C>,
    conflict: &ConflictItem,
    policy: &ReconcilePolicy,
) -> ConflictItem {
    match policy.auto_resolve {
        None => conflict.clone(),
        Some(AutoResolution::Strategy(strategy)) => resolver.resolve(conflict, strategy),
        Some(AutoResolution::Merge) => resolver.resolve_with_merge(conflict),
    }
}

fn index_by_id<'a>(
    store: Store,
    side: &str,
    records: &'a [Value],
    skipped: &mut usize,
) -> BTreeMap<String, &'a Value> {
    let mut indexed = BTreeMap::new();
    for record in records {
        if let Some(id) = record.record_id() {
            indexed.insert(id, record);
        } else {
            tracing::warn!("Skipping {side} {store} record without id");
            *skipped += 1;
        }
    }
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::FixedClock;
    use crate::models::Resolution;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn local() -> Vec<Value> {
        vec![
            json!({"id": "a", "updatedAt": 300, "title": "Obra na garagem"}),
            json!({"id": "b", "updatedAt": 100, "title": "Reunião"}),
            json!({"id": "c", "updatedAt": 100, "title": "Só local"}),
            json!({"title": "sem id"}),
        ]
    }

    fn server() -> Vec<Value> {
        vec![
            json!({"id": "a", "updatedAt": 200, "title": "Obra na garagem (adiada)"}),
            json!({"id": "b", "updatedAt": 100, "title": "Reunião"}),
            json!({"id": "d", "updatedAt": 100, "title": "Só servidor"}),
        ]
    }

    #[test]
    fn reconcile_leaves_conflicts_pending_by_default() {
        let report = reconcile(
            Store::Announcements,
            &local(),
            &server(),
            &ReconcilePolicy::default(),
        );

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].id(), "a");
        assert_eq!(report.pending(), 1);
        assert_eq!(report.resolved(), 0);
        assert_eq!(report.pulled, vec!["d".to_string()]);
        assert_eq!(report.pushed, vec!["c".to_string()]);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn reconcile_auto_resolves_with_strategy() {
        let policy = ReconcilePolicy {
            auto_resolve: Some(AutoResolution::Strategy(ResolutionStrategy::Newest)),
        };
        let report = reconcile_with(
            &Resolver::new(FixedClock(42)),
            Store::Announcements,
            &local(),
            &server(),
            &policy,
        );

        let conflict = &report.conflicts[0];
        assert!(conflict.is_resolved());
        assert_eq!(conflict.resolution(), Some(Resolution::Local));
        assert_eq!(conflict.resolved_at(), Some(42));
        assert_eq!(report.resolved(), 1);
    }

    #[test]
    fn reconcile_auto_resolves_with_merge() {
        let policy = ReconcilePolicy {
            auto_resolve: Some(AutoResolution::Merge),
        };
        let local = vec![json!({"id": 1, "updatedAt": 10, "tags": ["a"]})];
        let server = vec![json!({"id": 1, "updatedAt": 20, "tags": ["b"], "extra": true})];

        let report = reconcile(Store::Documents, &local, &server, &policy);
        let conflict = &report.conflicts[0];

        assert_eq!(conflict.resolution(), Some(Resolution::Merge));
        assert_eq!(
            conflict.resolved_data(),
            Some(&json!({"id": 1, "updatedAt": 20, "tags": ["a", "b"], "extra": true}))
        );
    }

    #[test]
    fn reconcile_empty_inputs() {
        let report = reconcile(Store::Polls, &[], &[], &ReconcilePolicy::default());
        assert!(report.conflicts.is_empty());
        assert_eq!(report.unchanged, 0);
    }
}
