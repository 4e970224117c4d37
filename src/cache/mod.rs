//! In-memory cache of rendered post bodies
//!
//! Entries are keyed by post identifier plus the source file's modification
//! time. Editing a post changes its timestamp, so the next lookup misses and
//! the stale entry is simply never asked for again; it ages out through
//! first-in-first-out eviction once the cache is full.

use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;

/// Number of rendered bodies kept when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 10;

/// Identifies one version of one post
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub id: String,
    pub mtime: SystemTime,
}

impl CacheKey {
    pub fn new(id: impl Into<String>, mtime: SystemTime) -> Self {
        Self {
            id: id.into(),
            mtime,
        }
    }
}

/// Lookup counters, for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Bounded map from post version to its rendered form
///
/// Eviction follows insertion order, never the timestamp values. Not
/// synchronized: the owner serializes access.
#[derive(Debug)]
pub struct RenderCache<V> {
    capacity: usize,
    entries: HashMap<CacheKey, V>,
    order: VecDeque<CacheKey>,
    stats: CacheStats,
}

impl<V: Clone> RenderCache<V> {
    /// Create an empty cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    /// Rendered value for this exact post version, if cached
    pub fn get(&mut self, id: &str, mtime: SystemTime) -> Option<V> {
        let key = CacheKey::new(id, mtime);
        match self.entries.get(&key) {
            Some(value) => {
                self.stats.hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a rendered value, evicting the oldest insertion once over capacity
    ///
    /// Re-inserting an existing key replaces the value but keeps its original
    /// position in the eviction queue.
    pub fn put(&mut self, id: &str, mtime: SystemTime, value: V) {
        let key = CacheKey::new(id, mtime);
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!("Evicted rendered post {} from cache", oldest.id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl<V: Clone> Default for RenderCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
