//! Cache-aware HTTP client
//!
//! Fetches JSON from the storefront REST API, serving repeated GET requests
//! from a response cache.

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::cache::{get_or_fetch, SharedCache};
use crate::error::FetchError;

// == Cached Client ==
/// JSON client whose GET responses go through a [`SharedCache`].
///
/// Entries are keyed by request path plus params, so they can be busted with
/// `invalidate_pattern` on the path. Only successful GET responses are
/// cached; other methods always hit the network.
#[derive(Debug, Clone)]
pub struct CachedClient {
    http: Client,
    base_url: String,
    cache: SharedCache<Value>,
    default_ttl: Option<u64>,
}

impl CachedClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8080/api`).
    pub fn new(base_url: impl Into<String>, cache: SharedCache<Value>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
            default_ttl: None,
        }
    }

    /// TTL in milliseconds for cached responses when a call doesn't give one.
    /// Without it the cache's own default applies.
    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl = Some(ttl_ms);
        self
    }

    pub fn cache(&self) -> &SharedCache<Value> {
        &self.cache
    }

    // == Get ==
    /// GETs `path` with `params` as the query string, from cache when possible.
    pub async fn get_json(
        &self,
        path: &str,
        params: Option<&Value>,
        ttl: Option<u64>,
    ) -> Result<Value, FetchError> {
        let ttl = ttl.or(self.default_ttl);
        get_or_fetch(&self.cache, path, params, ttl, || {
            self.fetch(Method::GET, path, params, None)
        })
        .await
    }

    // == Send ==
    /// Sends an uncached request, e.g. a POST that changes data.
    ///
    /// Callers are responsible for invalidating affected cache entries.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, FetchError> {
        self.fetch(method, path, None, body).await
    }

    async fn fetch(
        &self,
        method: Method,
        path: &str,
        params: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, url = %url, "Fetching from API");

        let mut request = self.http.request(method, &url);
        if let Some(params) = params {
            request = request.query(&query_pairs(params)?);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // Empty bodies (204 etc.) come back as null
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Flattens a params object into query pairs. Null fields are skipped and
/// non-string values use their JSON text.
fn query_pairs(params: &Value) -> Result<Vec<(String, String)>, FetchError> {
    match params {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect()),
        other => Err(FetchError::InvalidParams(format!(
            "query params must be an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs() {
        let pairs = query_pairs(&json!({"page": 2, "q": "red shoes", "sort": null, "tags": ["a"]}))
            .unwrap();

        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "red shoes".to_string()),
                ("tags".to_string(), r#"["a"]"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_rejects_non_objects() {
        assert!(query_pairs(&Value::Null).unwrap().is_empty());
        assert!(matches!(
            query_pairs(&json!([1, 2])),
            Err(FetchError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let cache = std::sync::Arc::new(tokio::sync::RwLock::new(
            crate::cache::ResponseCache::new(10, 1_000),
        ));
        let client = CachedClient::new("http://localhost:8080/api/", cache);
        assert_eq!(client.base_url, "http://localhost:8080/api");
    }
}
