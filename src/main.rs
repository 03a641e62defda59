//! Module Cache demo
//!
//! Memoizes a fake data-access call through a namespaced cache, then
//! invalidates it by prefix and as a whole.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use module_cache::{CacheContext, ClearOutcome, Config, NamespacedCache};

const MODULE_KEY: &str = "model.test";
const CACHE_KEY: &str = "getvalues";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
    id: u32,
}

/// Stand-in for a database query filtered by `filter`.
async fn get_values(cache: &NamespacedCache, filter: serde_json::Value) -> anyhow::Result<Vec<Row>> {
    let rows = cache
        .get_or_compute(CACHE_KEY, &filter, || async {
            info!("Cache miss for {}, querying", filter);
            vec![Row { id: 1 }, Row { id: 2 }]
        })
        .await?;
    Ok(rows)
}

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the shared store
/// 4. Run lookups with and without params
/// 5. Clear by prefix, then the whole module
/// 6. Shut the context down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "module_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, disabled={}, default_expire={}s",
        config.backend, config.disabled, config.default_expire
    );

    let context = CacheContext::connect(&config).await?;
    let cache = context.cache(MODULE_KEY, config.default_expire);

    // No params: written under "default" but never read back
    let rows = get_values(&cache, serde_json::Value::Null).await?;
    info!("Without params: {} rows", rows.len());

    let filter = json!({"id": 1});
    let rows = get_values(&cache, filter.clone()).await?;
    info!("With {}: {} rows", filter, rows.len());

    // Second call within the expiry is served from the cache
    let rows = get_values(&cache, filter.clone()).await?;
    info!("With {} again: {:?}", filter, rows);

    if let Some(ClearOutcome::Fields(removed)) = cache.clear(Some(CACHE_KEY)).await? {
        info!("Cleared {} fields starting with {}", removed.len(), CACHE_KEY);
    }
    if let Some(ClearOutcome::Bucket(removed)) = cache.clear(None).await? {
        info!("Cleared module {} ({} bucket)", MODULE_KEY, removed);
    }

    context.shutdown();
    Ok(())
}
