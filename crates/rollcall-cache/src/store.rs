use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failures surfaced by a cache store backend.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache store unreachable: {0}")]
    Connection(String),

    #[error("cache store command failed: {0}")]
    Command(String),

    #[error("cache value could not be encoded or decoded: {0}")]
    Codec(String),
}

/// A TTL key-value store reachable over the network.
///
/// Entries expire on their own after the TTL given at write time; an
/// expired entry is indistinguishable from an absent one on read.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the raw value stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError>;

    /// Store `value` under `key` with the given TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Remove the entry stored under `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheStoreError>;
}
