//! Hash Store Module
//!
//! The remote key-value collaborator behind every namespaced cache, seen as
//! a set of hash buckets with bucket-wide expiry.

mod bucket;
mod memory;
mod redis;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreResult;

pub use bucket::{current_timestamp_ms, Bucket};
pub use memory::MemoryHashStore;
pub use self::redis::RedisHashStore;

// == Hash Store Trait ==
/// Primitive hash-bucket operations a cache backend must provide.
///
/// A bucket is one hash structure addressed by name; fields inside it hold
/// serialized values. Expiry applies to the whole bucket.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Upserts one field. Returns the number of fields created (0 on overwrite).
    async fn hash_field_set(&self, bucket: &str, field: &str, value: &str) -> StoreResult<u64>;

    /// Reads one field, `None` when the field or bucket is absent.
    async fn hash_field_get(&self, bucket: &str, field: &str) -> StoreResult<Option<String>>;

    /// Sets or refreshes the bucket TTL. Returns false if the bucket does not exist.
    async fn bucket_expire(&self, bucket: &str, seconds: u64) -> StoreResult<bool>;

    /// Returns every field and value of the bucket.
    async fn hash_get_all(&self, bucket: &str) -> StoreResult<HashMap<String, String>>;

    /// Removes one field. Returns the number of fields removed.
    async fn hash_field_delete(&self, bucket: &str, field: &str) -> StoreResult<u64>;

    /// Removes the whole bucket. Returns the number of buckets removed.
    async fn bucket_delete(&self, bucket: &str) -> StoreResult<u64>;

    /// Removes every field whose name starts with `prefix`, one result per field.
    ///
    /// The provided version scans then deletes field by field, so writes
    /// racing with the scan may be missed. Backends able to do it in one
    /// step override it.
    async fn hash_delete_prefix(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<u64>> {
        let fields = self.hash_get_all(bucket).await?;
        let mut results = Vec::new();
        for field in fields.keys().filter(|f| f.starts_with(prefix)) {
            results.push(self.hash_field_delete(bucket, field).await?);
        }
        Ok(results)
    }

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
