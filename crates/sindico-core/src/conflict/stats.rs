//! Ledger statistics

use crate::models::{ConflictItem, ConflictStats};

/// Aggregate a set of conflicts by state, store and type.
pub fn calculate_conflict_stats<T>(conflicts: &[ConflictItem<T>]) -> ConflictStats
where
    T: Clone,
{
    let mut stats = ConflictStats {
        total: conflicts.len(),
        ..ConflictStats::default()
    };

    for conflict in conflicts {
        if conflict.is_resolved() {
            stats.resolved += 1;
        } else {
            stats.pending += 1;
        }
        *stats
            .by_store
            .entry(conflict.store().to_string())
            .or_default() += 1;
        *stats
            .by_type
            .entry(conflict.conflict_type().to_string())
            .or_default() += 1;
    }

    stats
}
