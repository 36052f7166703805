//! Redis cache backend
//!
//! Entries are written with `SET key value PX ttl_ms`, read with `GET` and
//! removed with `DEL`, so Redis alone decides when an entry has expired.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tokio::sync::OnceCell;
use tracing::debug;

use super::backend::{CacheBackend, CacheError};

impl From<RedisError> for CacheError {
    fn from(err: RedisError) -> Self {
        CacheError::Unavailable(err.to_string())
    }
}

/// Backend talking to a Redis-compatible server.
///
/// Opening only parses the URL. The connection is made on first use, and a
/// failed attempt leaves nothing behind so the next call tries again; a
/// Redis outage at start-up therefore shows up as `Unavailable` per call
/// instead of preventing the service from starting.
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The URL may carry a password, so it is left out.
        f.debug_struct("RedisBackend")
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisBackend {
    /// Creates a backend for the given `redis://` or `rediss://` URL
    ///
    /// Returns `CacheError::InvalidArgument` if the URL cannot be parsed.
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)
            .map_err(|e| CacheError::InvalidArgument(format!("invalid redis url: {}", e)))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    /// Returns a handle to the shared multiplexed connection, connecting if needed
    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!("connecting to redis");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}
