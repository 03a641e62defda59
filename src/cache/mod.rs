//! Cache Module
//!
//! Namespaced caches with parameter-derived keys over a shared hash store.

mod key;
mod namespaced;
mod params;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use key::{format_key, format_value, ARRAY_PREFIX, DEFAULT_KEY};
pub use namespaced::{ClearOutcome, NamespacedCache};
pub use params::{IntoParams, ParamValue, Params, Scalar};
