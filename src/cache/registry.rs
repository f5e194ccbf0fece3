//! Cache Registry Module
//!
//! Owns one response cache per data domain and the invalidation helpers that
//! write paths use to bust them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{
    CacheStorage, Clock, FileStorage, Persistence, ResponseCache, StatsSnapshot, SystemClock,
};
use crate::config::{CachePolicy, Config};
use crate::tasks::{spawn_cleanup_task, SweepHandle};

/// A response cache shared between tasks.
pub type SharedCache<T> = Arc<RwLock<ResponseCache<T>>>;

// == Cache Domain ==
/// The logical data domains that get their own cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDomain {
    /// General API responses
    Api,
    Products,
    Users,
    Categories,
}

impl CacheDomain {
    pub const ALL: [CacheDomain; 4] = [
        CacheDomain::Api,
        CacheDomain::Products,
        CacheDomain::Users,
        CacheDomain::Categories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDomain::Api => "api",
            CacheDomain::Products => "products",
            CacheDomain::Users => "users",
            CacheDomain::Categories => "categories",
        }
    }
}

impl fmt::Display for CacheDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheDomain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

// == Registry Stats ==
/// Stats of every domain cache.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub api: StatsSnapshot,
    pub products: StatsSnapshot,
    pub users: StatsSnapshot,
    pub categories: StatsSnapshot,
}

// == Cache Registry ==
/// The set of domain caches an application works with.
///
/// Cloning is cheap; clones share the same caches.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    api: SharedCache<Value>,
    products: SharedCache<Value>,
    users: SharedCache<Value>,
    categories: SharedCache<Value>,
}

impl CacheRegistry {
    // == Constructors ==
    /// Builds the registry from configuration, persisting to files under
    /// `config.storage_dir`.
    pub fn from_config(config: &Config) -> Self {
        let storage: Arc<dyn CacheStorage> = Arc::new(FileStorage::new(config.storage_dir.clone()));
        Self::with_storage(config, storage, Arc::new(SystemClock))
    }

    /// Builds the registry over an explicit storage backend and clock.
    pub fn with_storage(
        config: &Config,
        storage: Arc<dyn CacheStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let build = |domain: CacheDomain| -> SharedCache<Value> {
            let policy = config.policy(domain);
            let cache = build_cache(&policy, config, &storage, &clock);
            info!(
                cache = domain.as_str(),
                max_size = policy.max_size,
                default_ttl_ms = policy.default_ttl_ms,
                persist = policy.persist,
                "Cache initialized with {} entries",
                cache.len()
            );
            Arc::new(RwLock::new(cache))
        };

        Self {
            api: build(CacheDomain::Api),
            products: build(CacheDomain::Products),
            users: build(CacheDomain::Users),
            categories: build(CacheDomain::Categories),
        }
    }

    /// Returns the cache for `domain`.
    pub fn cache(&self, domain: CacheDomain) -> &SharedCache<Value> {
        match domain {
            CacheDomain::Api => &self.api,
            CacheDomain::Products => &self.products,
            CacheDomain::Users => &self.users,
            CacheDomain::Categories => &self.categories,
        }
    }

    // == Invalidation Helpers ==
    /// Invalidates cached product data.
    ///
    /// With an id, only entries under `/products/{id}` go; without, every
    /// entry under `/products`. Returns the number removed.
    pub async fn invalidate_product_cache(&self, product_id: Option<&str>) -> usize {
        let pattern = match product_id {
            Some(id) => format!("/products/{}", id),
            None => "/products".to_string(),
        };
        self.products.write().await.invalidate_pattern(&pattern)
    }

    pub async fn invalidate_user_cache(&self) {
        self.users.write().await.clear();
    }

    pub async fn invalidate_category_cache(&self) {
        self.categories.write().await.clear();
    }

    /// Clears every domain cache.
    pub async fn invalidate_all(&self) {
        for domain in CacheDomain::ALL {
            self.cache(domain).write().await.clear();
        }
    }

    // == Stats ==
    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            api: self.api.read().await.stats(),
            products: self.products.read().await.stats(),
            users: self.users.read().await.stats(),
            categories: self.categories.read().await.stats(),
        }
    }

    // == Sweeps ==
    /// Starts one expiry sweep per domain. The sweeps stop when the returned
    /// handles are dropped.
    pub fn spawn_sweeps(&self, interval: Duration) -> Vec<SweepHandle> {
        CacheDomain::ALL
            .into_iter()
            .map(|domain| spawn_cleanup_task(self.cache(domain).clone(), interval, domain.as_str()))
            .collect()
    }
}

fn build_cache(
    policy: &CachePolicy,
    config: &Config,
    storage: &Arc<dyn CacheStorage>,
    clock: &Arc<dyn Clock>,
) -> ResponseCache<Value> {
    let cache = ResponseCache::new(policy.max_size, policy.default_ttl_ms)
        .with_clock(clock.clone())
        .with_key_mode(config.key_mode);

    if policy.persist {
        cache.with_persistence(Persistence::new(storage.clone(), policy.storage_key.clone()))
    } else {
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStorage};
    use serde_json::json;

    fn test_registry(storage: &MemoryStorage) -> CacheRegistry {
        CacheRegistry::with_storage(
            &Config::default(),
            Arc::new(storage.clone()),
            Arc::new(ManualClock::new(0)),
        )
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("products".parse::<CacheDomain>(), Ok(CacheDomain::Products));
        assert_eq!("orders".parse::<CacheDomain>(), Err("orders".to_string()));
        assert_eq!(CacheDomain::Categories.to_string(), "categories");
    }

    #[tokio::test]
    async fn test_caches_follow_policies() {
        let registry = test_registry(&MemoryStorage::new());

        let products = registry.cache(CacheDomain::Products).read().await;
        assert_eq!(products.max_size(), 50);
        assert!(products.is_persistent());
        drop(products);

        let users = registry.cache(CacheDomain::Users).read().await;
        assert_eq!(users.max_size(), 20);
        assert!(!users.is_persistent());
    }

    #[tokio::test]
    async fn test_invalidate_single_product() {
        let registry = test_registry(&MemoryStorage::new());
        {
            let mut products = registry.cache(CacheDomain::Products).write().await;
            products.set("/products/42", json!({"id": 42}), None, None);
            products.set("/products/42/reviews", json!([]), Some(&json!({"page": 1})), None);
            products.set("/products/7", json!({"id": 7}), None, None);
        }

        assert_eq!(registry.invalidate_product_cache(Some("42")).await, 2);

        let mut products = registry.cache(CacheDomain::Products).write().await;
        assert!(products.has("/products/7", None));
        assert!(!products.has("/products/42", None));
    }

    #[tokio::test]
    async fn test_invalidate_all_products() {
        let registry = test_registry(&MemoryStorage::new());
        {
            let mut products = registry.cache(CacheDomain::Products).write().await;
            products.set("/products", json!([]), Some(&json!({"page": 1})), None);
            products.set("/products/7", json!({"id": 7}), None, None);
            products.set("/featured", json!([]), None, None);
        }

        assert_eq!(registry.invalidate_product_cache(None).await, 2);
        assert_eq!(registry.cache(CacheDomain::Products).read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_slots() {
        let storage = MemoryStorage::new();
        let registry = test_registry(&storage);

        for domain in CacheDomain::ALL {
            registry
                .cache(domain)
                .write()
                .await
                .set("/key", json!(domain.as_str()), None, None);
        }
        assert!(storage.raw("ritkart_categories_cache").is_some());
        assert!(storage.raw("ritkart_users_cache").is_none());

        registry.invalidate_all().await;

        let stats = registry.stats().await;
        assert_eq!(stats.api.size, 0);
        assert_eq!(stats.products.size, 0);
        assert_eq!(stats.users.size, 0);
        assert_eq!(stats.categories.size, 0);
        assert!(storage.raw("ritkart_categories_cache").is_none());
    }

    #[tokio::test]
    async fn test_user_and_category_invalidation() {
        let registry = test_registry(&MemoryStorage::new());
        registry
            .cache(CacheDomain::Users)
            .write()
            .await
            .set("User Profile_[]", json!({"name": "A"}), None, None);
        registry
            .cache(CacheDomain::Categories)
            .write()
            .await
            .set("/categories", json!([]), None, None);

        registry.invalidate_user_cache().await;
        registry.invalidate_category_cache().await;

        let stats = registry.stats().await;
        assert_eq!(stats.users.size, 0);
        assert_eq!(stats.categories.size, 0);
    }

    #[tokio::test]
    async fn test_registry_reloads_persisted_domains() {
        let storage = MemoryStorage::new();
        {
            let registry = test_registry(&storage);
            registry
                .cache(CacheDomain::Categories)
                .write()
                .await
                .set("/categories", json!(["shoes"]), None, None);
            registry
                .cache(CacheDomain::Users)
                .write()
                .await
                .set("/auth/profile", json!("secret"), None, None);
        }

        let registry = test_registry(&storage);
        let stats = registry.stats().await;
        assert_eq!(stats.categories.size, 1);
        assert_eq!(stats.users.size, 0);
    }

    #[tokio::test]
    async fn test_spawn_sweeps_one_per_domain() {
        let registry = test_registry(&MemoryStorage::new());
        let sweeps = registry.spawn_sweeps(Duration::from_secs(60));
        assert_eq!(sweeps.len(), 4);
        assert!(sweeps.iter().all(|sweep| !sweep.is_finished()));
    }
}
