//! Typed cache over a byte-oriented backend
//!
//! Provides a `Cache` that stores serializable data as JSON under a TTL and
//! reads it back into whatever type the call site asks for.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::backend::{CacheBackend, CacheError};

/// Default upper bound on a single backend round-trip
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(2);

/// Manages reading and writing JSON-encoded values through a `CacheBackend`
///
/// The cache holds only a shared backend handle and its timeout, so it can be
/// cloned freely and used from concurrent tasks without locking. Every
/// backend call is bounded by the timeout; running out of time is reported
/// as `CacheError::Unavailable`.
#[derive(Clone)]
pub struct Cache {
    /// Storage the serialized entries live in
    backend: Arc<dyn CacheBackend>,
    /// Upper bound on each backend round-trip
    timeout: Duration,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Cache {
    /// Creates a new Cache over the given backend with the default timeout
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    /// Sets the upper bound on each backend round-trip
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name of the underlying backend, for log output
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Writes a value to the cache with the given TTL
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "weather:london")
    /// * `value` - The data to cache (must implement Serialize)
    /// * `ttl` - How long the entry stays visible; must be at least one millisecond
    ///
    /// # Returns
    /// * `Ok(())` on success, replacing any previous entry under `key`
    /// * `Err(CacheError::InvalidArgument)` for an empty key or sub-millisecond TTL
    /// * `Err(CacheError::Serialization)` if the value cannot be encoded
    /// * `Err(CacheError::Unavailable)` if the backend fails or times out
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        validate_key(key)?;
        if ttl.as_millis() == 0 {
            return Err(CacheError::InvalidArgument(format!(
                "ttl must be at least 1ms, got {:?}",
                ttl
            )));
        }

        let bytes = serde_json::to_vec(value)?;
        self.bounded(self.backend.set(key, bytes, ttl)).await
    }

    /// Reads a value from the cache
    ///
    /// A missing or expired key is a normal outcome and yields `Ok(None)`.
    ///
    /// # Returns
    /// * `Ok(Some(T))` if a live entry exists and decodes into `T`
    /// * `Ok(None)` if the key is absent or expired
    /// * `Err(CacheError::Serialization)` if the stored payload does not decode into `T`
    /// * `Err(CacheError::Unavailable)` if the backend fails or times out
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        validate_key(key)?;

        match self.bounded(self.backend.get(key)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Removes an entry from the cache; deleting a missing key succeeds
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        validate_key(key)?;
        self.bounded(self.backend.delete(key)).await
    }

    /// Runs a backend operation under the configured timeout
    async fn bounded<F, R>(&self, op: F) -> Result<R, CacheError>
    where
        F: std::future::Future<Output = Result<R, CacheError>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Unavailable(format!(
                "{} did not respond within {:?}",
                self.backend.name(),
                self.timeout
            ))),
        }
    }
}

fn validate_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "cache key must not be empty".to_string(),
        ));
    }
    Ok(())
}
