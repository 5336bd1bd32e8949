//! Redis-backed cache store.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use std::time::Duration;

use crate::store::{CacheStore, CacheStoreError};

/// Cache store backed by a Redis connection pool.
///
/// Unlike a write-behind cache tier, every command result is returned to
/// the caller so store faults can be wrapped into the cache error
/// taxonomy instead of being dropped.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Create a store from a Redis URL (e.g. `redis://localhost:6379`).
    ///
    /// `timeout` bounds how long a caller waits for a pooled connection;
    /// command timeouts beyond that are the Redis client's own concern.
    pub fn connect(url: &str, pool_size: usize, timeout: Duration) -> Result<Self, CacheStoreError> {
        let mut cfg = Config::from_url(url);
        let mut pool_cfg = PoolConfig::new(pool_size);
        pool_cfg.timeouts.wait = Some(timeout);
        pool_cfg.timeouts.create = Some(timeout);
        cfg.pool = Some(pool_cfg);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheStoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheStoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheStoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| CacheStoreError::Command(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError> {
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|e| CacheStoreError::Command(e.to_string()))?;
        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheStoreError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| CacheStoreError::Command(e.to_string()))?;
        tracing::debug!(key = %key, "cache entry deleted");
        Ok(())
    }
}
