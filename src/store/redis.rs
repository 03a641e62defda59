//! Redis Hash Store Module
//!
//! Hash buckets stored as Redis hashes, with `EXPIRE` providing the
//! bucket-wide TTL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, Script};
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::HashStore;

/// Deletes every field of `KEYS[1]` starting with `ARGV[1]` in one step.
const DELETE_PREFIX_SCRIPT: &str = r"
local results = {}
local prefix = ARGV[1]
for _, field in ipairs(redis.call('HKEYS', KEYS[1])) do
    if string.sub(field, 1, string.len(prefix)) == prefix then
        table.insert(results, redis.call('HDEL', KEYS[1], field))
    end
end
return results
";

/// Reconnect attempts before the manager gives up on a dial
const CONNECT_RETRIES: usize = 2;

/// Bound on one connection attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Bound on one command round trip
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on the whole initial connect, retries included
const ESTABLISH_TIMEOUT: Duration = Duration::from_secs(10);

// == Redis Hash Store ==
/// Redis-backed hash store over one auto-reconnecting multiplexed connection.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisHashStore {
    conn: ConnectionManager,
    delete_prefix: Script,
}

impl RedisHashStore {
    // == Constructor ==
    /// Opens a client for `url`, establishes the connection and pings it.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    pub async fn connect(url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            StoreError::Connection(format!("failed to create redis client: {}", e))
        })?;
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(CONNECT_RETRIES)
            .set_connection_timeout(CONNECT_TIMEOUT)
            .set_response_timeout(RESPONSE_TIMEOUT);
        let mut conn = tokio::time::timeout(
            ESTABLISH_TIMEOUT,
            ConnectionManager::new_with_config(client, config),
        )
        .await
        .map_err(|_| {
            StoreError::Connection(format!(
                "timed out connecting to redis at {} after {:?}",
                url, ESTABLISH_TIMEOUT
            ))
        })?
        .map_err(|e| {
            StoreError::Connection(format!("failed to connect to redis at {}: {}", url, e))
        })?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(StoreError::Connection(format!(
                "unexpected PING reply from redis: {}",
                pong
            )));
        }

        info!("Redis connection established");
        Ok(Self {
            conn,
            delete_prefix: Script::new(DELETE_PREFIX_SCRIPT),
        })
    }

    fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl HashStore for RedisHashStore {
    async fn hash_field_set(&self, bucket: &str, field: &str, value: &str) -> StoreResult<u64> {
        let mut conn = self.connection();
        let created: u64 = conn.hset(bucket, field, value).await.map_err(|e| {
            warn!("Redis HSET failed for {}/{}: {}", bucket, field, e);
            StoreError::from(e)
        })?;
        Ok(created)
    }

    async fn hash_field_get(&self, bucket: &str, field: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection();
        let value: Option<String> = conn.hget(bucket, field).await.map_err(|e| {
            warn!("Redis HGET failed for {}/{}: {}", bucket, field, e);
            StoreError::from(e)
        })?;
        Ok(value)
    }

    async fn bucket_expire(&self, bucket: &str, seconds: u64) -> StoreResult<bool> {
        let mut conn = self.connection();
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        let applied: bool = conn.expire(bucket, seconds).await.map_err(|e| {
            warn!("Redis EXPIRE failed for {}: {}", bucket, e);
            StoreError::from(e)
        })?;
        Ok(applied)
    }

    async fn hash_get_all(&self, bucket: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.connection();
        let fields: HashMap<String, String> = conn.hgetall(bucket).await.map_err(|e| {
            warn!("Redis HGETALL failed for {}: {}", bucket, e);
            StoreError::from(e)
        })?;
        Ok(fields)
    }

    async fn hash_field_delete(&self, bucket: &str, field: &str) -> StoreResult<u64> {
        let mut conn = self.connection();
        let removed: u64 = conn.hdel(bucket, field).await.map_err(|e| {
            warn!("Redis HDEL failed for {}/{}: {}", bucket, field, e);
            StoreError::from(e)
        })?;
        Ok(removed)
    }

    async fn bucket_delete(&self, bucket: &str) -> StoreResult<u64> {
        let mut conn = self.connection();
        let removed: u64 = conn.del(bucket).await.map_err(|e| {
            warn!("Redis DEL failed for {}: {}", bucket, e);
            StoreError::from(e)
        })?;
        Ok(removed)
    }

    async fn hash_delete_prefix(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<u64>> {
        let mut conn = self.connection();
        let results: Vec<u64> = self
            .delete_prefix
            .key(bucket)
            .arg(prefix)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                warn!("Redis prefix delete failed for {}/{}*: {}", bucket, prefix, e);
                StoreError::from(e)
            })?;
        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis server
    // Run with: docker run -d -p 6379:6379 redis:latest
    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    #[tokio::test]
    async fn test_connect_invalid_url() {
        let result = RedisHashStore::connect("not-a-redis-url").await;
        assert!(matches!(result, Err(StoreError::Connection(_))));
    }

    #[tokio::test]
    async fn test_connect_refused_fails_fast() {
        let started = std::time::Instant::now();
        let result = RedisHashStore::connect("redis://127.0.0.1:1").await;

        assert!(matches!(result, Err(StoreError::Connection(_))));
        assert!(started.elapsed() <= ESTABLISH_TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test]
    #[ignore = "requires a running redis server"]
    async fn test_hash_roundtrip_and_expire() {
        let store = RedisHashStore::connect(&redis_url()).await.unwrap();
        let bucket = "module_cache.test.roundtrip";
        store.bucket_delete(bucket).await.unwrap();

        assert_eq!(store.hash_field_set(bucket, "f1", "v1").await.unwrap(), 1);
        assert_eq!(store.hash_field_set(bucket, "f1", "v2").await.unwrap(), 0);
        assert_eq!(
            store.hash_field_get(bucket, "f1").await.unwrap().as_deref(),
            Some("v2")
        );
        assert!(store.bucket_expire(bucket, 30).await.unwrap());
        assert!(!store.bucket_expire("module_cache.test.missing", 30).await.unwrap());

        assert_eq!(store.bucket_delete(bucket).await.unwrap(), 1);
        assert!(store.hash_field_get(bucket, "f1").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running redis server"]
    async fn test_delete_prefix_script() {
        let store = RedisHashStore::connect(&redis_url()).await.unwrap();
        let bucket = "module_cache.test.prefix";
        store.bucket_delete(bucket).await.unwrap();

        store.hash_field_set(bucket, "getvalues.id:1", "a").await.unwrap();
        store.hash_field_set(bucket, "getvalues.id:2", "b").await.unwrap();
        store.hash_field_set(bucket, "other.id:1", "c").await.unwrap();

        let results = store.hash_delete_prefix(bucket, "getvalues").await.unwrap();
        assert_eq!(results, vec![1, 1]);

        let remaining = store.hash_get_all(bucket).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains_key("other.id:1"));

        store.bucket_delete(bucket).await.unwrap();
    }
}
