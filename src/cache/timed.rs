//! Timed Cache Module
//!
//! Memoizes asynchronous reads by key for a fixed freshness window.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore, DEFAULT_TTL};
use crate::error::CacheError;

// == Get Options ==
/// Per-call lookup options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    /// Skip any stored entry and always call the fetcher
    pub force_fresh: bool,
}

impl GetOptions {
    pub fn fresh() -> Self {
        Self { force_fresh: true }
    }
}

// == Timed Cache ==
/// Read-through cache shared by every data-fetching caller.
///
/// Built once at startup and handed out as `Arc<TimedCache<V>>`. The store
/// lock is released while a fetcher runs, so a slow backend call never
/// blocks hits on other keys.
#[derive(Debug)]
pub struct TimedCache<V = Value> {
    store: RwLock<CacheStore<V>>,
}

impl<V: Clone + Send + Sync> TimedCache<V> {
    /// Creates a cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: RwLock::new(CacheStore::new(ttl)),
        }
    }

    /// Creates a cache with the five-minute default window.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    pub async fn ttl(&self) -> Duration {
        self.store.read().await.ttl()
    }

    /// Returns the fresh value under `key`, or runs `fetch` and stores its result.
    pub async fn get<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        self.get_with(key, fetch, GetOptions::default()).await
    }

    // == Get With Options ==
    /// Read-through lookup.
    ///
    /// A fresh entry is returned without calling `fetch` unless
    /// `options.force_fresh` is set. A successful fetch overwrites the entry;
    /// a failed fetch writes nothing and leaves any existing entry as it was.
    pub async fn get_with<F, Fut, E>(&self, key: &str, fetch: F, options: GetOptions) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        {
            let mut store = self.store.write().await;
            if options.force_fresh {
                store.record_bypass();
            } else if let Some(value) = store.lookup(key) {
                debug!(key, "cache hit");
                return Ok(value);
            }
        }

        debug!(key, force_fresh = options.force_fresh, "cache miss, fetching");

        match fetch().await {
            Ok(value) => {
                self.store
                    .write()
                    .await
                    .insert(key.to_string(), value.clone());
                Ok(value)
            }
            Err(err) => {
                warn!(key, error = %err, "fetch failed, cache left untouched");
                self.store.write().await.record_fetch_failure();
                Err(err)
            }
        }
    }

    // == Invalidate ==
    /// Drops cached entries.
    ///
    /// `None` clears everything; `Some(pattern)` is compiled as a regular
    /// expression and removes every key it matches. Returns the number of
    /// entries removed. A malformed pattern is a caller bug and is returned
    /// as an error without touching the cache.
    pub async fn invalidate(&self, pattern: Option<&str>) -> Result<usize, CacheError> {
        let removed = match pattern {
            None => self.store.write().await.clear(),
            Some(pattern) => {
                let regex = Regex::new(pattern)?;
                self.store.write().await.remove_matching(&regex)
            }
        };

        debug!(pattern = pattern.unwrap_or("<all>"), removed, "cache invalidated");
        Ok(removed)
    }

    // == Sweep ==
    /// Removes every stale entry. Only bounds memory; lookups check
    /// freshness on their own.
    pub async fn sweep(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Checks whether `key` is held in storage, fresh or not.
    pub async fn contains(&self, key: &str) -> bool {
        self.store.read().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl<V: Clone + Send + Sync> Default for TimedCache<V> {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}
