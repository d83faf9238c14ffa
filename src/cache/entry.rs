//! Cache Entry Module
//!
//! Defines a single cached query result and its freshness check.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A cached payload together with the moment it was stored.
///
/// The payload is kept verbatim; the cache never inspects it.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion time
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    // == Age ==
    /// Time elapsed since the entry was stored.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.stored_at)
    }

    // == Is Fresh ==
    /// Checks whether the entry may still be served.
    ///
    /// Boundary condition: an entry whose age equals the TTL is already
    /// stale, so `fresh` holds strictly while `age < ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}
