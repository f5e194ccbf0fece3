//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;

// == Sweep Handle ==
/// Owns a running sweep task. Dropping the handle stops the sweep.
#[derive(Debug)]
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the sweep.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a background task that runs `cleanup` on `cache` every `interval`.
///
/// Ticks never overlap: each sweep holds the write lock until it completes,
/// and the next sleep starts only afterwards.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval` - Time between sweeps
/// * `name` - Cache name used in log lines
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(ResponseCache::<Value>::new(100, 300_000)));
/// let sweep = spawn_cleanup_task(cache.clone(), Duration::from_secs(60), "api");
/// // Dropping `sweep` stops the task
/// ```
pub fn spawn_cleanup_task<T>(
    cache: Arc<RwLock<ResponseCache<T>>>,
    interval: Duration,
    name: &'static str,
) -> SweepHandle
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        info!(
            cache = name,
            "Starting expiry sweep with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup()
            };

            if removed > 0 {
                info!(cache = name, "Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!(cache = name, "Expiry sweep: no expired entries found");
            }
        }
    });

    SweepHandle { handle }
}
