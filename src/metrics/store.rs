//! Append-only snapshot log shared across pipeline runs.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info};

use super::aggregate;
use crate::types::{MetricsSnapshot, MetricsSummary, TicketState};

/// Thread-safe metrics log. Appends take the write lock; every aggregate
/// read takes the read lock once, so it sees a consistent snapshot count.
#[derive(Debug, Default)]
pub struct MetricsStore {
    snapshots: RwLock<Vec<MetricsSnapshot>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-pushed Vec behind,
    // so a poisoned lock is still safe to read.
    fn read(&self) -> RwLockReadGuard<'_, Vec<MetricsSnapshot>> {
        self.snapshots.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a snapshot of `state`; the same ticket may be recorded twice.
    pub fn record(&self, state: &TicketState) -> MetricsSnapshot {
        let snapshot = MetricsSnapshot::from_state(state, Utc::now());
        let mut snapshots = self.snapshots.write().unwrap_or_else(PoisonError::into_inner);
        snapshots.push(snapshot.clone());
        debug!(ticket_id = %snapshot.ticket_id, total = snapshots.len(), "Metrics recorded");
        snapshot
    }

    pub fn summary(&self) -> MetricsSummary {
        aggregate::summarize(&self.read())
    }

    pub fn category_breakdown(&self) -> BTreeMap<String, usize> {
        aggregate::category_breakdown(&self.read())
    }

    pub fn priority_breakdown(&self) -> BTreeMap<String, usize> {
        aggregate::priority_breakdown(&self.read())
    }

    /// Every snapshot in recording order
    pub fn snapshots(&self) -> Vec<MetricsSnapshot> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all snapshots. Test isolation only.
    pub fn clear(&self) {
        let mut snapshots = self.snapshots.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = snapshots.len();
        snapshots.clear();
        info!(dropped, "Metrics cleared");
    }
}
