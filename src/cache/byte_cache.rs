//! Space-bounded LRU byte store.
//!
//! # Responsibilities
//! - Map string keys to byte blobs
//! - Account every entry as `data.len() + key.len()` against a fixed capacity
//! - Evict least-recently-used entries until a new entry fits
//!
//! # Design Decisions
//! - One mutex covers the index, the recency order and the byte count
//! - Recency is a monotonic stamp; the oldest stamp is the next victim
//! - An oversized entry is rejected before anything is evicted

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::cache::CacheError;
use crate::observability::metrics;

/// A stored blob and its accounted size.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Bytes,
    pub size: u64,
    stamp: u64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Stores refused because the entry alone exceeds capacity.
    pub rejected: u64,
    pub entries: usize,
    pub current_bytes: u64,
    pub max_bytes: u64,
}

impl CacheStats {
    /// hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// stamp -> key, oldest first.
    recency: BTreeMap<u64, String>,
    current_bytes: u64,
    next_stamp: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    rejected: u64,
}

impl CacheState {
    fn stamp(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.stamp);
        self.current_bytes -= entry.size;
        Some(entry)
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.current_bytes -= entry.size;
        }
        self.evictions += 1;
        true
    }
}

/// Thread-safe LRU cache bounded by total bytes.
#[derive(Debug)]
pub struct ByteCache {
    max_bytes: u64,
    state: Mutex<CacheState>,
}

impl ByteCache {
    /// Create a cache holding at most `max_bytes`, keys included.
    pub fn new(max_bytes: u64) -> Result<Self, CacheError> {
        if max_bytes == 0 {
            return Err(CacheError::InvalidArgument(
                "max bytes must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_bytes,
            state: Mutex::new(CacheState::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `data` under `key`, evicting least-recently-used entries as needed.
    ///
    /// Returns `false` and leaves the cache untouched when the entry alone is
    /// larger than the capacity. An existing entry for `key` is replaced.
    pub fn put(&self, key: &str, data: impl Into<Bytes>) -> bool {
        let data = data.into();
        let size = (data.len() + key.len()) as u64;

        let mut state = self.lock();
        if size > self.max_bytes {
            state.rejected += 1;
            metrics::record_cache_rejected();
            return false;
        }

        state.remove(key);

        let mut evicted = 0;
        while self.max_bytes - state.current_bytes < size {
            if !state.evict_oldest() {
                break;
            }
            evicted += 1;
        }

        let stamp = state.stamp();
        state.recency.insert(stamp, key.to_string());
        state
            .entries
            .insert(key.to_string(), CacheEntry { data, size, stamp });
        state.current_bytes += size;

        metrics::record_cache_evictions(evicted);
        metrics::set_cache_bytes(state.current_bytes);
        true
    }

    /// Fetch the blob for `key` and mark it most recently used.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut state = self.lock();
        let stamp = state.stamp();
        let Some(entry) = state.entries.get_mut(key) else {
            state.misses += 1;
            metrics::record_cache_miss();
            return None;
        };

        let previous = std::mem::replace(&mut entry.stamp, stamp);
        let data = entry.data.clone();
        state.recency.remove(&previous);
        state.recency.insert(stamp, key.to_string());
        state.hits += 1;
        metrics::record_cache_hit();
        Some(data)
    }

    /// Returns true if `key` is stored. Does not touch recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Bytes currently accounted.
    pub fn current_bytes(&self) -> u64 {
        self.lock().current_bytes
    }

    /// Configured capacity.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            rejected: state.rejected,
            entries: state.entries.len(),
            current_bytes: state.current_bytes,
            max_bytes: self.max_bytes,
        }
    }
}
