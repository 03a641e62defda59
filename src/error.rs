//! Error types for the module cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Failure reported by a hash store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Could not reach or set up the backend
    #[error("Connection error: {0}")]
    Connection(String),

    /// A store command was rejected or failed mid-flight
    #[error("Command error: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Params supplied but not an object, a list or null
    #[error("Invalid argument type: {0}")]
    InvalidArgumentType(String),

    /// A nested object used where only scalars or lists are allowed
    #[error("Invalid parameter shape: {0}")]
    InvalidParameterShape(String),

    /// Underlying store operation failed
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    /// Value could not be encoded, or stored text could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type returned by hash store backends.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts_into_storage_failure() {
        let err: CacheError = StoreError::Command("boom".to_string()).into();
        assert!(matches!(err, CacheError::StorageFailure(StoreError::Command(_))));
        assert_eq!(err.to_string(), "Storage failure: Command error: boom");
    }

    #[test]
    fn test_redis_type_error_is_command_error() {
        let err = redis::RedisError::from((redis::ErrorKind::TypeError, "bad type"));
        assert!(matches!(StoreError::from(err), StoreError::Command(_)));
    }

    #[test]
    fn test_json_error_converts_into_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
