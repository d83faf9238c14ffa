//! Cache Module
//!
//! Read-through caching of backend queries with a fixed freshness window
//! and manual invalidation.

use std::time::Duration;

mod entry;
mod stats;
mod store;
mod timed;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::CacheStore;
pub use timed::{GetOptions, TimedCache};

// == Public Constants ==
/// Freshness window applied when none is configured
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
