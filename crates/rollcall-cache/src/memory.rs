//! In-memory cache store for single-instance deployments and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::store::{CacheStore, CacheStoreError};

#[derive(Clone, Debug)]
struct StoredEntry {
    data: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// DashMap-backed cache store with lazy TTL expiry.
///
/// Expired entries are removed when next observed; there is no sweeper.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired but unswept) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.data.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError> {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                data: value,
                stored_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheStoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store
            .set("k", b"value".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let store = MemoryStore::new();
        store
            .set("k", b"value".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        store.delete("k").await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_succeeds() {
        let store = MemoryStore::new();
        assert!(store.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .set("k", b"value".to_vec(), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let store = MemoryStore::new();
        store
            .set("k", b"first".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set("k", b"second".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"second".to_vec()));
    }
}
