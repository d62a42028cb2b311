//! Request-keyed result cache
//!
//! An entry is fresh for `fresh_ttl` after it was stored and is kept, stale,
//! until `retain_ttl`. Expired entries are evicted on access.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::request::VisualizerQueryResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: Arc<VisualizerQueryResult>,
    stored_at: Instant,
    updated_at: DateTime<Utc>,
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Usable as-is
    Fresh(Arc<VisualizerQueryResult>, DateTime<Utc>),
    /// Usable while a refetch runs
    Stale(Arc<VisualizerQueryResult>, DateTime<Utc>),
    Miss,
}

#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
    fresh_ttl: Duration,
    retain_ttl: Duration,
}

impl ResultCache {
    /// `retain_ttl` below `fresh_ttl` is raised to it
    pub fn new(fresh_ttl: Duration, retain_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            fresh_ttl,
            retain_ttl: retain_ttl.max(fresh_ttl),
        }
    }

    pub fn lookup(&mut self, key: &str, now: Instant) -> CacheLookup {
        self.evict_expired(now);
        match self.entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.fresh_ttl => {
                CacheLookup::Fresh(Arc::clone(&entry.result), entry.updated_at)
            }
            Some(entry) => CacheLookup::Stale(Arc::clone(&entry.result), entry.updated_at),
            None => CacheLookup::Miss,
        }
    }

    /// Stores a result, replacing any previous entry for `key`
    pub fn insert(&mut self, key: String, result: Arc<VisualizerQueryResult>, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                stored_at: now,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn evict_expired(&mut self, now: Instant) {
        let retain_ttl = self.retain_ttl;
        self.entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < retain_ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
