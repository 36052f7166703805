//! Backend abstraction for the cache
//!
//! Backends deal in raw bytes; serialization lives in `Cache` so every
//! backend stores exactly the same wire format.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or did not answer in time
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A value could not be encoded, or a stored payload could not be decoded
    #[error("cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller passed a key or TTL the backend cannot honour
    #[error("invalid cache argument: {0}")]
    InvalidArgument(String),
}

/// A key/value store with per-entry expiration.
///
/// Implementations must never return an entry whose TTL has elapsed, and
/// must report connectivity problems as `CacheError::Unavailable` rather
/// than `Ok(None)`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name used in log output (e.g. "redis")
    fn name(&self) -> &'static str;

    /// Fetch the raw bytes stored under `key`, or `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, replacing any existing entry
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Remove the entry under `key`; a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
