//! Named zone locks for casita
//!
//! A zone is a logical group of devices (e.g. "office", "master_bedroom")
//! that must be commanded serially: the physical receivers miss commands
//! sent while they are still settling from the previous one. This crate
//! provides one in-process async mutex per zone name, created lazily and
//! idempotent across lookups: the same name always yields the same lock,
//! process-wide.
//!
//! Acquisition blocks until the lock is free, with no timeout. The locks
//! are not reentrant: a dispatch handler must never re-acquire its own
//! zone. Release happens when the guard drops, on every exit path.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Guard holding one zone; the zone unlocks when this drops
pub type ZoneGuard = OwnedMutexGuard<()>;

/// The process-wide table of zone locks
pub struct ZoneLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ZoneLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, zone: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(zone.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for `zone`, waiting as long as it takes
    pub async fn acquire(&self, zone: &str) -> ZoneGuard {
        trace!(zone = %zone, "acquiring zone lock");
        let guard = self.lock_for(zone).lock_owned().await;
        trace!(zone = %zone, "zone lock acquired");
        guard
    }

    /// Acquire the lock for `zone` only if it is free right now
    pub fn try_acquire(&self, zone: &str) -> Option<ZoneGuard> {
        self.lock_for(zone).try_lock_owned().ok()
    }

    /// Number of zones that have been locked at least once
    pub fn zone_count(&self) -> usize {
        self.locks.len()
    }
}

impl Default for ZoneLocks {
    fn default() -> Self {
        Self::new()
    }
}
