//! Conflict resolution

use serde_json::Value;

use super::merge::merge;
use crate::models::{ConflictItem, Resolution, ResolutionStrategy};
use crate::util::unix_timestamp_ms_now;

/// Source of the resolution instant
pub trait Clock {
    /// Current time in Unix ms
    fn now_ms(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        unix_timestamp_ms_now()
    }
}

/// A clock frozen at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// Settles conflicts, stamping each resolution with its clock's time.
///
/// Every method returns a fresh resolved item and leaves its input untouched.
/// Resolving an item that is already resolved is caller misuse; the ledger
/// refuses to store a second resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolver<C = SystemClock> {
    clock: C,
}

impl<C: Clock> Resolver<C> {
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Pick one side according to `strategy`.
    pub fn resolve<T: Clone>(
        &self,
        conflict: &ConflictItem<T>,
        strategy: ResolutionStrategy,
    ) -> ConflictItem<T> {
        let resolution = pick_side(
            strategy,
            conflict.local_timestamp(),
            conflict.server_timestamp(),
        );
        let data = match resolution {
            Resolution::Local => conflict.local_data().clone(),
            _ => conflict.server_data().clone(),
        };

        tracing::debug!(
            "Resolved {} conflict '{}' with strategy {strategy}: kept {resolution}",
            conflict.store(),
            conflict.id()
        );
        conflict.with_resolution(resolution, self.clock.now_ms(), data)
    }

    /// Keep a user-supplied record.
    pub fn resolve_manually<T: Clone>(&self, conflict: &ConflictItem<T>, data: T) -> ConflictItem<T> {
        conflict.with_resolution(Resolution::Manual, self.clock.now_ms(), data)
    }

    /// Keep the structural merge of both sides.
    pub fn resolve_with_merge(&self, conflict: &ConflictItem<Value>) -> ConflictItem<Value> {
        let merged = merge(conflict.local_data(), conflict.server_data());
        conflict.with_resolution(Resolution::Merge, self.clock.now_ms(), merged)
    }
}

/// Resolve with the system clock.
pub fn resolve<T: Clone>(conflict: &ConflictItem<T>, strategy: ResolutionStrategy) -> ConflictItem<T> {
    Resolver::new(SystemClock).resolve(conflict, strategy)
}

/// Which side a strategy keeps. Exact timestamp ties go to the server.
pub const fn pick_side(
    strategy: ResolutionStrategy,
    local_timestamp: i64,
    server_timestamp: i64,
) -> Resolution {
    let keep_local = match strategy {
        ResolutionStrategy::Newest => local_timestamp > server_timestamp,
        ResolutionStrategy::Oldest => local_timestamp < server_timestamp,
        ResolutionStrategy::Local => true,
        ResolutionStrategy::Server => false,
    };

    if keep_local {
        Resolution::Local
    } else {
        Resolution::Server
    }
}
