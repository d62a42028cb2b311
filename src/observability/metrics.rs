//! Query lifecycle counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics; metrics never influence execution

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one query coordinator
#[derive(Debug, Default)]
pub struct QueryMetrics {
    debounce_restarts: AtomicU64,
    gated: AtomicU64,
    commits: AtomicU64,
    executions: AtomicU64,
    cache_hits: AtomicU64,
    stale_hits: AtomicU64,
    in_flight_joins: AtomicU64,
    failures: AtomicU64,
    superseded: AtomicU64,
}

/// Point-in-time copy of [`QueryMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub debounce_restarts: u64,
    pub gated: u64,
    pub commits: u64,
    pub executions: u64,
    pub cache_hits: u64,
    pub stale_hits: u64,
    pub in_flight_joins: u64,
    pub failures: u64,
    pub superseded: u64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_debounce_restarts(&self) {
        self.debounce_restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_gated(&self) {
        self.gated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts calls that actually reached the query service
    pub fn increment_executions(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stale_hits(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_in_flight_joins(&self) {
        self.in_flight_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    /// Takes a snapshot of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            debounce_restarts: self.debounce_restarts.load(Ordering::Relaxed),
            gated: self.gated.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            in_flight_joins: self.in_flight_joins.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
        }
    }
}
