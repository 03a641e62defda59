//! Module Cache - Namespaced caches over a Redis hash store
//!
//! Each logical module gets one hash bucket. Fields are keyed by an
//! operation name plus the params the cached result depends on, the whole
//! bucket shares one TTL refreshed on every write, and fields can be
//! invalidated by key prefix.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod store;
pub mod tasks;

pub use cache::{
    format_key, ClearOutcome, IntoParams, NamespacedCache, ParamValue, Params, Scalar,
};
pub use config::{Backend, Config};
pub use context::CacheContext;
pub use error::{CacheError, Result, StoreError};
pub use store::{HashStore, MemoryHashStore, RedisHashStore};
