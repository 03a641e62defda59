//! Namespaced Cache Module
//!
//! One cache per logical module, stored as one hash bucket in the shared store.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::key::format_key;
use crate::cache::params::IntoParams;
use crate::error::Result;
use crate::store::HashStore;

// == Clear Outcome ==
/// What a [`NamespacedCache::clear`] call removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Whole bucket deleted; number of buckets removed (0 or 1)
    Bucket(u64),
    /// Per-field deletion results for every field matching the prefix
    Fields(Vec<u64>),
}

// == Namespaced Cache ==
/// Cache bound to one module namespace.
///
/// Every field lives in the bucket named after the namespace, and every
/// write pushes the bucket expiry back to `expire_secs`, for all fields at
/// once. When disabled, every operation returns an empty result without
/// touching the store.
#[derive(Clone)]
pub struct NamespacedCache {
    store: Arc<dyn HashStore>,
    namespace: String,
    expire_secs: u64,
    disabled: bool,
}

impl NamespacedCache {
    // == Constructor ==
    /// Creates a cache over `store` for `namespace`.
    ///
    /// # Arguments
    /// * `store` - Shared store handle
    /// * `namespace` - Bucket name, usually the owning module
    /// * `expire_secs` - Bucket TTL applied on every write
    /// * `disabled` - Turns every operation into a no-op
    pub fn new(
        store: Arc<dyn HashStore>,
        namespace: impl Into<String>,
        expire_secs: u64,
        disabled: bool,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            expire_secs,
            disabled,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn expire_secs(&self) -> u64 {
        self.expire_secs
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    // == Set ==
    /// Stores `value` under the field derived from `cache_key` and `params`,
    /// then refreshes the bucket expiry.
    ///
    /// Returns the number of fields created (0 when an existing field was
    /// overwritten), or `None` when the cache is disabled.
    ///
    /// # Errors
    /// - `InvalidArgumentType` / `InvalidParameterShape` for unusable params
    /// - `Serialization` when `value` cannot be encoded
    /// - `StorageFailure` when the store rejects the write or the expiry;
    ///   nothing already written is rolled back
    pub async fn set<T>(
        &self,
        cache_key: &str,
        params: impl IntoParams,
        value: &T,
    ) -> Result<Option<u64>>
    where
        T: Serialize + ?Sized,
    {
        if self.disabled {
            return Ok(None);
        }
        let params = params.into_params()?;
        let field = format_key(cache_key, &params);
        let payload = serde_json::to_string(value)?;

        let created = self
            .store
            .hash_field_set(&self.namespace, &field, &payload)
            .await
            .map_err(|e| {
                error!("Cache {} SET error on {}: {}", self.namespace, field, e);
                e
            })?;
        self.store
            .bucket_expire(&self.namespace, self.expire_secs)
            .await
            .map_err(|e| {
                error!("Cache {} EXPIRE error: {}", self.namespace, e);
                e
            })?;

        debug!("Cache {} stored {}", self.namespace, field);
        Ok(Some(created))
    }

    // == Get ==
    /// Reads the value stored for `cache_key` and `params`.
    ///
    /// Calls without params always miss, even though [`set`](Self::set)
    /// without params writes the `"default"` field.
    ///
    /// # Errors
    /// Params errors as for `set`. When the store read fails or the stored
    /// text is not valid JSON, the whole bucket is deleted before the error
    /// is returned. Valid JSON that does not fit `T` returns `Serialization`
    /// and leaves the bucket alone.
    pub async fn get<T>(&self, cache_key: &str, params: impl IntoParams) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        if self.disabled {
            return Ok(None);
        }
        let params = params.into_params()?;
        if params.is_none() {
            return Ok(None);
        }
        let field = format_key(cache_key, &params);

        let cached = match self.read(&field).await {
            Ok(cached) => cached,
            Err(e) => {
                error!("Cache {} GET error on {}: {}", self.namespace, field, e);
                self.discard_bucket().await;
                return Err(e);
            }
        };
        match cached {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                warn!("Cache {} value for {} has another type: {}", self.namespace, field, e);
                e.into()
            }),
            None => Ok(None),
        }
    }

    async fn read(&self, field: &str) -> Result<Option<Value>> {
        let cached = self.store.hash_field_get(&self.namespace, field).await?;
        match cached {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Best-effort bucket drop after a failed read.
    async fn discard_bucket(&self) {
        if let Err(e) = self.store.bucket_delete(&self.namespace).await {
            warn!("Cache {} could not drop bucket after read error: {}", self.namespace, e);
        }
    }

    // == Get Or Compute ==
    /// Returns the cached value, or runs `compute`, caches its output and
    /// returns it.
    ///
    /// Without params the lookup always misses, so `compute` runs on every
    /// call.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        cache_key: &str,
        params: impl IntoParams,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.disabled {
            return Ok(compute().await);
        }
        let params = params.into_params()?;
        if let Some(cached) = self.get::<T>(cache_key, &params).await? {
            return Ok(cached);
        }
        let value = compute().await;
        self.set(cache_key, &params, &value).await?;
        Ok(value)
    }

    // == Clear ==
    /// Invalidates cached fields.
    ///
    /// With a prefix, deletes every field whose name starts with it and
    /// returns one result per deleted field. Without one (or with an empty
    /// one), deletes the whole bucket.
    pub async fn clear(&self, cache_key: Option<&str>) -> Result<Option<ClearOutcome>> {
        if self.disabled {
            return Ok(None);
        }
        let outcome = match cache_key.filter(|k| !k.is_empty()) {
            Some(prefix) => self
                .store
                .hash_delete_prefix(&self.namespace, prefix)
                .await
                .map(ClearOutcome::Fields),
            None => self
                .store
                .bucket_delete(&self.namespace)
                .await
                .map(ClearOutcome::Bucket),
        };

        match outcome {
            Ok(outcome) => {
                debug!("Cache {} cleared: {:?}", self.namespace, outcome);
                Ok(Some(outcome))
            }
            Err(e) => {
                error!(
                    "Cache {}/{} DEL error: {}",
                    self.namespace,
                    cache_key.unwrap_or_default(),
                    e
                );
                Err(e.into())
            }
        }
    }
}

impl fmt::Debug for NamespacedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespacedCache")
            .field("backend", &self.store.backend_name())
            .field("namespace", &self.namespace)
            .field("expire_secs", &self.expire_secs)
            .field("disabled", &self.disabled)
            .finish()
    }
}
