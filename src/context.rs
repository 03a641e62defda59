//! Cache Context
//!
//! Owns the one store connection shared by every namespaced cache in the
//! process, with explicit setup and teardown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::NamespacedCache;
use crate::config::{Backend, Config};
use crate::error::Result;
use crate::store::{HashStore, MemoryHashStore, RedisHashStore};
use crate::tasks::spawn_expiry_sweeper;

/// Process-wide cache state: the shared store and the disabled flag.
///
/// Build it once at startup, hand out caches with [`CacheContext::cache`],
/// and call [`CacheContext::shutdown`] on the way out.
pub struct CacheContext {
    store: Arc<dyn HashStore>,
    disabled: bool,
    sweeper: Option<JoinHandle<()>>,
}

impl CacheContext {
    /// Connects the backend selected by the configuration.
    ///
    /// When caching is disabled no connection is attempted, so a missing
    /// store never breaks startup.
    pub async fn connect(config: &Config) -> Result<Self> {
        if config.disabled {
            info!("Caching disabled by configuration, store not connected");
            return Ok(Self::with_store(Arc::new(MemoryHashStore::new()), true));
        }

        match config.backend {
            Backend::Redis => {
                let store = RedisHashStore::connect(&config.redis_url).await?;
                Ok(Self::with_store(Arc::new(store), false))
            }
            Backend::Memory => {
                let store = Arc::new(MemoryHashStore::new());
                let sweeper = spawn_expiry_sweeper(store.clone(), config.cleanup_interval);
                info!("Using in-memory hash store");
                Ok(Self {
                    store,
                    disabled: false,
                    sweeper: Some(sweeper),
                })
            }
        }
    }

    /// Wraps an already built store.
    pub fn with_store(store: Arc<dyn HashStore>, disabled: bool) -> Self {
        Self {
            store,
            disabled,
            sweeper: None,
        }
    }

    /// Creates a cache for `namespace` sharing this context's store.
    pub fn cache(&self, namespace: impl Into<String>, expire_secs: u64) -> NamespacedCache {
        NamespacedCache::new(self.store.clone(), namespace, expire_secs, self.disabled)
    }

    /// Shared store handle.
    pub fn store(&self) -> Arc<dyn HashStore> {
        self.store.clone()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Stops background tasks and releases this context's store handle.
    ///
    /// Caches handed out earlier keep their own handle alive until dropped.
    pub fn shutdown(mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
            warn!("Expiry sweeper aborted");
        }
        info!("Cache context for {} store shut down", self.store.backend_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory_config() -> Config {
        Config {
            backend: Backend::Memory,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_caches_share_one_store() {
        let context = CacheContext::connect(&memory_config()).await.unwrap();
        let writer = context.cache("model.test", 10);
        let reader = context.cache("model.test", 10);

        writer.set("getvalues", json!({"id": 1}), &[1, 2]).await.unwrap();
        let cached: Option<Vec<i32>> = reader.get("getvalues", json!({"id": 1})).await.unwrap();

        assert_eq!(cached, Some(vec![1, 2]));
        context.shutdown();
    }

    #[tokio::test]
    async fn test_disabled_config_skips_connection() {
        let config = Config {
            redis_url: "redis://127.0.0.1:1".to_string(),
            disabled: true,
            ..Config::default()
        };

        let context = CacheContext::connect(&config).await.unwrap();
        assert!(context.is_disabled());

        let cache = context.cache("model.test", 10);
        assert!(cache.is_disabled());
        assert_eq!(cache.set("k", json!({"id": 1}), &1).await.unwrap(), None);
        context.shutdown();
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_connect() {
        let config = Config {
            redis_url: "redis://127.0.0.1:1".to_string(),
            ..Config::default()
        };

        let result = CacheContext::connect(&config).await;
        assert!(matches!(
            result,
            Err(crate::error::CacheError::StorageFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweeper() {
        let context = CacheContext::connect(&memory_config()).await.unwrap();
        let sweeper = context.sweeper.as_ref().unwrap().abort_handle();
        assert!(!sweeper.is_finished());

        context.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        assert!(sweeper.is_finished());
    }
}
