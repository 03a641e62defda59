//! Bucket Module
//!
//! A single in-memory hash bucket with bucket-wide TTL.

use std::collections::HashMap;

// == Bucket ==
/// One hash bucket: its fields and an optional expiry shared by all of them.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    /// Field name to serialized value
    pub fields: HashMap<String, String>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl Bucket {
    // == Constructor ==
    /// Creates an empty bucket without expiry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Expire ==
    /// Sets the bucket expiry `ttl_seconds` from now, replacing any previous one.
    pub fn expire_in(&mut self, ttl_seconds: u64) {
        let ttl_ms = ttl_seconds.saturating_mul(1000);
        self.expires_at = Some(current_timestamp_ms().saturating_add(ttl_ms));
    }

    // == Is Expired ==
    /// Checks if the bucket has expired.
    ///
    /// A bucket is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the bucket has expired
    /// - `Some(remaining_ms)` if the bucket has TTL and hasn't expired
    /// - `None` if the bucket never expires
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
