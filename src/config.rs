//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::cache::{CacheDomain, KeyMode, DEFAULT_SWEEP_INTERVAL_MS};

const MINUTE_MS: u64 = 60 * 1000;

// == Cache Policy ==
/// Fixed policy of one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// TTL in milliseconds for entries set without one
    pub default_ttl_ms: u64,
    /// Maximum number of entries
    pub max_size: usize,
    /// Whether entries are mirrored to durable storage
    pub persist: bool,
    /// Storage slot owned by this cache
    pub storage_key: String,
}

impl CachePolicy {
    /// Built-in policy for a domain.
    ///
    /// User data is never persisted.
    pub fn default_for(domain: CacheDomain) -> Self {
        let (default_ttl_ms, max_size, persist) = match domain {
            CacheDomain::Api => (5 * MINUTE_MS, 100, true),
            CacheDomain::Products => (15 * MINUTE_MS, 50, true),
            CacheDomain::Users => (30 * MINUTE_MS, 20, false),
            CacheDomain::Categories => (60 * MINUTE_MS, 30, true),
        };
        Self {
            default_ttl_ms,
            max_size,
            persist,
            storage_key: format!("ritkart_{}_cache", domain),
        }
    }
}

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Interval between expiry sweeps in milliseconds
    pub cleanup_interval_ms: u64,
    /// Directory holding persisted cache slots
    pub storage_dir: PathBuf,
    /// How request params are folded into cache keys
    pub key_mode: KeyMode,
    /// Per-domain cache policies
    pub policies: BTreeMap<CacheDomain, CachePolicy>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 60000)
    /// - `CACHE_STORAGE_DIR` - Persisted slot directory (default: `.ritkart_cache`)
    /// - `CACHE_KEY_MODE` - `canonical` or `naive` (default: canonical)
    /// - `RITKART_<DOMAIN>_TTL_MS` - Per-domain default TTL
    /// - `RITKART_<DOMAIN>_MAX_SIZE` - Per-domain capacity
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let policies = CacheDomain::ALL
            .iter()
            .map(|&domain| {
                let mut policy = CachePolicy::default_for(domain);
                let prefix = format!("RITKART_{}", domain.as_str().to_ascii_uppercase());
                policy.default_ttl_ms =
                    env_parse(&format!("{}_TTL_MS", prefix), policy.default_ttl_ms);
                policy.max_size = env_parse(&format!("{}_MAX_SIZE", prefix), policy.max_size);
                (domain, policy)
            })
            .collect();

        Self {
            server_port: env_parse("SERVER_PORT", defaults.server_port),
            cleanup_interval_ms: sweep_interval(env_parse(
                "CLEANUP_INTERVAL_MS",
                defaults.cleanup_interval_ms,
            )),
            storage_dir: env::var("CACHE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            key_mode: env_parse("CACHE_KEY_MODE", defaults.key_mode),
            policies,
        }
    }

    /// Policy for `domain`, falling back to the built-in one.
    pub fn policy(&self, domain: CacheDomain) -> CachePolicy {
        self.policies
            .get(&domain)
            .cloned()
            .unwrap_or_else(|| CachePolicy::default_for(domain))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            storage_dir: PathBuf::from(".ritkart_cache"),
            key_mode: KeyMode::Canonical,
            policies: CacheDomain::ALL
                .iter()
                .map(|&domain| (domain, CachePolicy::default_for(domain)))
                .collect(),
        }
    }
}

/// Sweep interval of at least 1 ms; a zero interval would spin the sweep.
fn sweep_interval(interval_ms: u64) -> u64 {
    if interval_ms == 0 {
        warn!("CLEANUP_INTERVAL_MS must be positive, using 1 ms");
        return 1;
    }
    interval_ms
}

/// Reads and parses `name`, keeping `default` when unset or unparsable.
fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value '{}' for {}", raw, name);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval_ms, 60_000);
        assert_eq!(config.storage_dir, PathBuf::from(".ritkart_cache"));
        assert_eq!(config.key_mode, KeyMode::Canonical);
        assert_eq!(config.policies.len(), 4);
    }

    #[test]
    fn test_domain_policies() {
        let products = CachePolicy::default_for(CacheDomain::Products);
        assert_eq!(products.default_ttl_ms, 15 * 60 * 1000);
        assert_eq!(products.max_size, 50);
        assert!(products.persist);
        assert_eq!(products.storage_key, "ritkart_products_cache");

        let users = CachePolicy::default_for(CacheDomain::Users);
        assert!(!users.persist);
        assert_eq!(users.max_size, 20);

        let api = CachePolicy::default_for(CacheDomain::Api);
        assert_eq!(api.default_ttl_ms, 5 * 60 * 1000);
        assert_eq!(api.storage_key, "ritkart_api_cache");
    }

    #[test]
    fn test_storage_keys_are_unique() {
        let config = Config::default();
        let mut keys: Vec<&str> = config
            .policies
            .values()
            .map(|p| p.storage_key.as_str())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_zero_sweep_interval_is_raised() {
        assert_eq!(sweep_interval(0), 1);
        assert_eq!(sweep_interval(250), 250);
    }

    // Single test touching the environment so parallel tests don't race on it
    #[test]
    fn test_config_from_env() {
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL_MS");
        env::remove_var("CACHE_STORAGE_DIR");
        env::set_var("CACHE_KEY_MODE", "naive");
        env::set_var("RITKART_CATEGORIES_MAX_SIZE", "7");
        env::set_var("RITKART_CATEGORIES_TTL_MS", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval_ms, 60_000);
        assert_eq!(config.key_mode, KeyMode::Naive);

        let categories = config.policy(CacheDomain::Categories);
        assert_eq!(categories.max_size, 7);
        assert_eq!(categories.default_ttl_ms, 60 * 60 * 1000);

        env::set_var("CLEANUP_INTERVAL_MS", "0");
        assert_eq!(Config::from_env().cleanup_interval_ms, 1);

        env::remove_var("CLEANUP_INTERVAL_MS");
        env::remove_var("CACHE_KEY_MODE");
        env::remove_var("RITKART_CATEGORIES_MAX_SIZE");
        env::remove_var("RITKART_CATEGORIES_TTL_MS");
    }
}
