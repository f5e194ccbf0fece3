//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for storing an entry (PUT /caches/:domain/entries)
///
/// # Fields
/// - `identifier`: Resource identifier, e.g. `/products`
/// - `value`: The JSON value to cache
/// - `params`: Optional params object folded into the key
/// - `ttl`: Optional TTL in milliseconds (uses the cache default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub identifier: String,
    pub value: Value,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.identifier.is_empty() {
            return Some("Identifier cannot be empty".to_string());
        }
        None
    }
}

/// Query string addressing one entry (GET/DELETE /caches/:domain/entries)
///
/// `params` carries the params object as JSON text, e.g. `params={"page":1}`.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryQuery {
    pub identifier: String,
    #[serde(default)]
    pub params: Option<String>,
}

impl EntryQuery {
    /// Parses the `params` JSON, if present.
    pub fn parsed_params(&self) -> Result<Option<Value>, String> {
        match &self.params {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| format!("params is not valid JSON: {}", e)),
        }
    }
}

/// Request body for pattern invalidation (POST /caches/:domain/invalidate)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    pub pattern: String,
}

impl InvalidatePatternRequest {
    /// An empty pattern would match every key; clearing is a separate endpoint.
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}
