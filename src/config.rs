//! Configuration Module
//!
//! Handles loading the cache layer configuration from environment variables.

use std::env;

/// Which hash store backs the caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Remote Redis server
    Redis,
    /// In-process store with the same hash/TTL semantics
    Memory,
}

impl Backend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "redis" => Some(Backend::Redis),
            "memory" | "mem" => Some(Backend::Memory),
            _ => None,
        }
    }
}

/// Cache layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL
    pub redis_url: String,
    /// Store backend to connect
    pub backend: Backend,
    /// Turns every cache operation into a no-op
    pub disabled: bool,
    /// Default bucket expiry in seconds
    pub default_expire: u64,
    /// Memory store sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `CACHE_DISABLED` - `1`, `true`, `yes` or `on` disables caching (default: false)
    /// - `CACHE_DEFAULT_EXPIRE` - Default bucket expiry in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Memory store sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            backend: env::var("CACHE_BACKEND")
                .ok()
                .and_then(|v| Backend::parse(&v))
                .unwrap_or(defaults.backend),
            disabled: env::var("CACHE_DISABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.disabled),
            default_expire: env::var("CACHE_DEFAULT_EXPIRE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_expire),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            backend: Backend::Redis,
            disabled: false,
            default_expire: 300,
            cleanup_interval: 1,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
