//! Cache Sweep Task
//!
//! Background task that periodically removes stale cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TimedCache;

/// Spawns a background task that sweeps stale entries out of `cache`.
///
/// The task sleeps for `interval` between passes and runs until the
/// returned handle is aborted. The sweep only bounds memory: lookups check
/// freshness themselves, so a late or skipped pass never serves stale data.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TimedCache::with_default_ttl());
/// let sweep_handle = spawn_sweep_task(cache.clone(), cache.ttl().await);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V>(cache: Arc<TimedCache<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep().await;

            if removed > 0 {
                info!("Cache sweep: removed {} stale entries", removed);
            } else {
                debug!("Cache sweep: no stale entries found");
            }
        }
    })
}
