//! Cache Store Module
//!
//! Synchronous storage behind the timed cache: a HashMap of stamped entries
//! with a single freshness window.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// Keyed storage with one TTL shared by every entry.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Freshness window applied to every entry
    ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Lookup ==
    /// Returns a clone of the value under `key` if it is still fresh.
    ///
    /// Stale entries are left in place for the sweep; they are never served.
    pub fn lookup(&mut self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Counts a lookup that skipped the stored entry on purpose.
    pub fn record_bypass(&mut self) {
        self.stats.record_miss();
    }

    pub fn record_fetch_failure(&mut self) {
        self.stats.record_fetch_failure();
    }

    // == Insert ==
    /// Stores `value` under `key`, replacing any previous entry and
    /// restarting its freshness window.
    pub fn insert(&mut self, key: String, value: V) {
        self.entries.insert(key, CacheEntry::new(value));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Clear ==
    /// Drops every entry. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.stats.record_invalidated(count);
        self.stats.set_total_entries(0);
        count
    }

    // == Remove Matching ==
    /// Drops every entry whose key matches `pattern`. Returns the number removed.
    pub fn remove_matching(&mut self, pattern: &Regex) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.is_match(key));
        let count = before - self.entries.len();

        self.stats.record_invalidated(count);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Cleanup Expired ==
    /// Removes every entry that is no longer fresh, including entries
    /// whose age is exactly the TTL.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(ttl));
        let count = before - self.entries.len();

        self.stats.record_swept(count);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Checks whether `key` has an entry, fresh or not.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
