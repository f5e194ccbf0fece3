//! Cache-or-fetch composition.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::ResponseCache;

/// Returns the cached value for `identifier` and `params`, or runs `fetch`
/// and caches its result.
///
/// The lock is not held while `fetch` runs, so concurrent misses on the same
/// key may each fetch; the last one to finish wins. Errors are returned
/// unchanged and never cached.
pub async fn get_or_fetch<T, E, F, Fut>(
    cache: &RwLock<ResponseCache<T>>,
    identifier: &str,
    params: Option<&Value>,
    ttl: Option<u64>,
    fetch: F,
) -> Result<T, E>
where
    T: Clone + Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(hit) = cache.write().await.get(identifier, params) {
        debug!(identifier, "Cache hit");
        return Ok(hit);
    }

    let value = fetch().await?;
    cache
        .write()
        .await
        .set(identifier, value.clone(), params, ttl);
    Ok(value)
}
