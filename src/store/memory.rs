//! Memory Hash Store Module
//!
//! In-process hash store with the same bucket and TTL semantics as Redis.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::{Bucket, HashStore};

// == Memory Hash Store ==
/// Hash buckets kept in process memory.
///
/// Expired buckets are invisible to reads, dropped when touched, and swept
/// eagerly by [`MemoryHashStore::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    buckets: RwLock<HashMap<String, Bucket>>,
}

impl MemoryHashStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Purge Expired ==
    /// Removes all expired buckets.
    ///
    /// Returns the number of buckets removed.
    pub async fn purge_expired(&self) -> usize {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| !bucket.is_expired());
        before - buckets.len()
    }

    // == Bucket TTL ==
    /// Remaining TTL of a live bucket in milliseconds.
    ///
    /// `None` when the bucket is absent, expired, or has no expiry.
    pub async fn bucket_ttl_ms(&self, bucket: &str) -> Option<u64> {
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .filter(|b| !b.is_expired())
            .and_then(Bucket::ttl_remaining_ms)
    }

    // == Length ==
    /// Returns the number of live buckets.
    pub async fn len(&self) -> usize {
        let buckets = self.buckets.read().await;
        buckets.values().filter(|b| !b.is_expired()).count()
    }

    // == Is Empty ==
    /// Returns true if no live bucket exists.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Mutable access to a live bucket, dropping it first if it has expired.
    fn live_bucket<'a>(
        buckets: &'a mut HashMap<String, Bucket>,
        name: &str,
    ) -> Option<&'a mut Bucket> {
        if buckets.get(name).is_some_and(Bucket::is_expired) {
            buckets.remove(name);
            debug!("Dropped expired bucket {}", name);
        }
        buckets.get_mut(name)
    }

    fn drop_if_empty(buckets: &mut HashMap<String, Bucket>, name: &str) {
        if buckets.get(name).is_some_and(|b| b.fields.is_empty()) {
            buckets.remove(name);
        }
    }
}

#[async_trait]
impl HashStore for MemoryHashStore {
    async fn hash_field_set(&self, bucket: &str, field: &str, value: &str) -> StoreResult<u64> {
        let mut buckets = self.buckets.write().await;
        // Writing into an expired bucket starts a fresh one without TTL
        Self::live_bucket(&mut buckets, bucket);
        let entry = buckets.entry(bucket.to_string()).or_default();
        let created = entry
            .fields
            .insert(field.to_string(), value.to_string())
            .is_none();
        Ok(u64::from(created))
    }

    async fn hash_field_get(&self, bucket: &str, field: &str) -> StoreResult<Option<String>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(bucket)
            .filter(|b| !b.is_expired())
            .and_then(|b| b.fields.get(field).cloned()))
    }

    async fn bucket_expire(&self, bucket: &str, seconds: u64) -> StoreResult<bool> {
        let mut buckets = self.buckets.write().await;
        match Self::live_bucket(&mut buckets, bucket) {
            Some(b) => {
                b.expire_in(seconds);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hash_get_all(&self, bucket: &str) -> StoreResult<HashMap<String, String>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(bucket)
            .filter(|b| !b.is_expired())
            .map(|b| b.fields.clone())
            .unwrap_or_default())
    }

    async fn hash_field_delete(&self, bucket: &str, field: &str) -> StoreResult<u64> {
        let mut buckets = self.buckets.write().await;
        let removed = Self::live_bucket(&mut buckets, bucket)
            .map(|b| b.fields.remove(field).is_some())
            .unwrap_or(false);
        Self::drop_if_empty(&mut buckets, bucket);
        Ok(u64::from(removed))
    }

    async fn bucket_delete(&self, bucket: &str) -> StoreResult<u64> {
        let mut buckets = self.buckets.write().await;
        let removed = buckets
            .remove(bucket)
            .is_some_and(|b| !b.is_expired());
        Ok(u64::from(removed))
    }

    async fn hash_delete_prefix(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<u64>> {
        // Whole scan and delete under one write lock
        let mut buckets = self.buckets.write().await;
        let results = match Self::live_bucket(&mut buckets, bucket) {
            Some(b) => {
                let before = b.fields.len();
                b.fields.retain(|field, _| !field.starts_with(prefix));
                vec![1; before - b.fields.len()]
            }
            None => Vec::new(),
        };
        Self::drop_if_empty(&mut buckets, bucket);
        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
