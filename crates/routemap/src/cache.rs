//! Bounded memo of match results, safe to share across worker threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use http::Method;
use parking_lot::Mutex;

use crate::MatchResult;

/// Default number of `(path, method)` results kept
pub const DEFAULT_CACHE_SIZE: usize = 1600;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: String,
    method: Method,
}

#[derive(Debug)]
struct CacheEntry {
    /// `None` records a path that matched nothing
    value: Arc<Option<MatchResult>>,
    last_used: AtomicU64,
}

/// A thread-safe least-recently-used cache of match results
///
/// Lookups bump a per-entry stamp without locking. Inserts that push the
/// cache past capacity take the eviction lock and drop the stalest entries.
#[derive(Debug)]
pub struct MatchCache {
    entries: DashMap<CacheKey, CacheEntry>,
    clock: AtomicU64,
    capacity: usize,
    eviction: Mutex<()>,
}

impl MatchCache {
    /// Creates a cache holding at most `capacity` results; 0 disables it
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity.min(DEFAULT_CACHE_SIZE)),
            clock: AtomicU64::new(0),
            capacity,
            eviction: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Cached result for `(path, method)`
    ///
    /// The outer `Option` is hit/miss; the inner one is match/no-match.
    pub fn get(&self, path: &str, method: &Method) -> Option<Arc<Option<MatchResult>>> {
        if self.capacity == 0 {
            return None;
        }
        let key = CacheKey {
            path: path.to_string(),
            method: method.clone(),
        };
        let entry = self.entries.get(&key)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        tracing::trace!(path, %method, "match cache hit");
        Some(Arc::clone(&entry.value))
    }

    /// Stores a result, evicting the least recently used entries if full
    pub fn insert(&self, path: &str, method: &Method, value: Option<MatchResult>) {
        if self.capacity == 0 {
            return;
        }
        let key = CacheKey {
            path: path.to_string(),
            method: method.clone(),
        };
        self.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                last_used: AtomicU64::new(self.tick()),
            },
        );

        if self.entries.len() > self.capacity {
            self.evict();
        }
    }

    fn evict(&self) {
        let _guard = self.eviction.lock();
        let excess = self.entries.len().saturating_sub(self.capacity);
        if excess == 0 {
            return;
        }

        // Keys are collected first; removing while iterating would deadlock
        // on the shard lock.
        let mut stamps: Vec<(u64, CacheKey)> = self
            .entries
            .iter()
            .map(|e| (e.value().last_used.load(Ordering::Relaxed), e.key().clone()))
            .collect();
        stamps.sort_unstable_by_key(|(stamp, _)| *stamp);

        for (_, key) in stamps.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        tracing::trace!(evicted = excess, "match cache eviction");
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}
