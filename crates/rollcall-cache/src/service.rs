//! Attendance cache service: key derivation, cache-aside reads,
//! TTL-bounded writes and class-scoped invalidation.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use rollcall_core::{AttendanceRecord, AttendanceStatus, attendance_key, class_of_key, now_utc};

use crate::record::{RecordFetchError, SystemOfRecord};
use crate::store::{CacheStore, CacheStoreError};

/// Failures surfaced by the attendance cache service. Every variant
/// carries the offending key and the underlying collaborator error.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read from cache for key: {key} ({source})")]
    Read {
        key: String,
        #[source]
        source: CacheStoreError,
    },

    #[error("Failed to write to cache for key: {key} ({source})")]
    Write {
        key: String,
        #[source]
        source: CacheStoreError,
    },

    #[error("Failed to invalidate cache for key: {key} ({source})")]
    Invalidation {
        key: String,
        #[source]
        source: CacheStoreError,
    },

    #[error("Fallback fetch failed for key: {key} ({source})")]
    Fallback {
        key: String,
        #[source]
        source: RecordFetchError,
    },
}

impl CacheError {
    /// The cache key the failed operation was addressing.
    pub fn key(&self) -> &str {
        match self {
            Self::Read { key, .. }
            | Self::Write { key, .. }
            | Self::Invalidation { key, .. }
            | Self::Fallback { key, .. } => key,
        }
    }
}

/// TTL policy applied to cache writes.
///
/// `fallback_ttl_secs` governs the populate-on-miss path, where the
/// original writer's TTL is unavailable; it is an explicit policy knob
/// rather than an implicit reuse of the write default.
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    pub default_ttl_secs: u64,
    pub fallback_ttl_secs: u64,
    pub min_ttl_secs: u64,
    pub max_ttl_secs: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            default_ttl_secs: 3600,
            fallback_ttl_secs: 3600,
            min_ttl_secs: 60,
            max_ttl_secs: 86400,
        }
    }
}

impl TtlPolicy {
    /// Resolve a caller-supplied TTL: default when unspecified, clamped
    /// to `[min_ttl_secs, max_ttl_secs]` otherwise.
    pub fn resolve(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_ttl_secs)
            .clamp(self.min_ttl_secs, self.max_ttl_secs)
    }
}

/// Cache-aside service over a [`CacheStore`] with a class→keys index.
///
/// The index is what makes class-wide invalidation possible: the store
/// itself cannot enumerate keys, so every write records its key under
/// the owning class and every invalidation removes it again.
pub struct AttendanceCacheService {
    store: Arc<dyn CacheStore>,
    records: Arc<dyn SystemOfRecord>,
    ttl: TtlPolicy,
    class_index: DashMap<String, HashSet<String>>,
}

impl AttendanceCacheService {
    pub fn new(store: Arc<dyn CacheStore>, records: Arc<dyn SystemOfRecord>, ttl: TtlPolicy) -> Self {
        Self {
            store,
            records,
            ttl,
            class_index: DashMap::new(),
        }
    }

    /// Derive the cache key for `(class, student)` on today's UTC date.
    pub fn key_for_today(&self, class_id: &str, student_id: &str) -> String {
        attendance_key(class_id, student_id, now_utc().date())
    }

    /// Write an attendance mark under its derived key.
    ///
    /// Returns the key on success. The key is recorded in the class
    /// index before the store write so a concurrent class invalidation
    /// can always enumerate it; a failed write prunes it again.
    pub async fn set_attendance(
        &self,
        class_id: &str,
        student_id: &str,
        status: AttendanceStatus,
        ttl_seconds: Option<u64>,
    ) -> Result<String, CacheError> {
        let ttl = self.ttl.resolve(ttl_seconds);
        let key = self.key_for_today(class_id, student_id);
        let record = AttendanceRecord::new(status, now_utc());

        let payload = serde_json::to_vec(&record).map_err(|e| CacheError::Write {
            key: key.clone(),
            source: CacheStoreError::Codec(e.to_string()),
        })?;

        self.index_key(class_id, &key);

        if let Err(source) = self.store.set(&key, payload, Duration::from_secs(ttl)).await {
            self.unindex_key(class_id, &key);
            tracing::error!(key = %key, error = %source, "failed to set attendance data");
            return Err(CacheError::Write { key, source });
        }

        tracing::debug!(key = %key, ttl_secs = ttl, status = %status, "attendance data set");
        Ok(key)
    }

    /// Cache-aside read: return the cached record, or fetch it from the
    /// system of record, repopulate with the fallback TTL and return it.
    pub async fn cached_record(&self, key: &str) -> Result<AttendanceRecord, CacheError> {
        let cached = self.store.get(key).await.map_err(|source| CacheError::Read {
            key: key.to_string(),
            source,
        })?;

        if let Some(bytes) = cached {
            metrics::counter!("rollcall_cache_hits_total").increment(1);
            tracing::debug!(key = %key, "cache hit");
            return serde_json::from_slice(&bytes).map_err(|e| CacheError::Read {
                key: key.to_string(),
                source: CacheStoreError::Codec(e.to_string()),
            });
        }

        metrics::counter!("rollcall_cache_misses_total").increment(1);
        tracing::debug!(key = %key, "cache miss, falling back to system of record");

        let record = self
            .records
            .fetch(key)
            .await
            .map_err(|source| CacheError::Fallback {
                key: key.to_string(),
                source,
            })?;

        let payload = serde_json::to_vec(&record).map_err(|e| CacheError::Read {
            key: key.to_string(),
            source: CacheStoreError::Codec(e.to_string()),
        })?;

        self.store
            .set(key, payload, Duration::from_secs(self.ttl.fallback_ttl_secs))
            .await
            .map_err(|source| CacheError::Read {
                key: key.to_string(),
                source,
            })?;

        if let Some(class_id) = class_of_key(key) {
            let class_id = class_id.to_string();
            self.index_key(&class_id, key);
        }

        Ok(record)
    }

    /// Read today's record for `(class, student)`.
    pub async fn student_record(
        &self,
        class_id: &str,
        student_id: &str,
    ) -> Result<AttendanceRecord, CacheError> {
        let key = self.key_for_today(class_id, student_id);
        self.cached_record(&key).await
    }

    /// Delete a single cache entry and drop it from its class index.
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.store
            .delete(key)
            .await
            .map_err(|source| CacheError::Invalidation {
                key: key.to_string(),
                source,
            })?;

        if let Some(class_id) = class_of_key(key) {
            let class_id = class_id.to_string();
            self.unindex_key(&class_id, key);
        }

        tracing::debug!(key = %key, "cache invalidated");
        Ok(())
    }

    /// Invalidate today's entry for `(class, student)`; returns the key.
    pub async fn invalidate_student(
        &self,
        class_id: &str,
        student_id: &str,
    ) -> Result<String, CacheError> {
        let key = self.key_for_today(class_id, student_id);
        self.invalidate(&key).await?;
        Ok(key)
    }

    /// Delete every key recorded for `class_id`; returns how many were
    /// removed. An empty or absent index is a no-op returning 0.
    ///
    /// On a store failure midway, the keys not yet deleted (including the
    /// failed one) are put back into the index so they stay enumerable.
    pub async fn invalidate_class(&self, class_id: &str) -> Result<usize, CacheError> {
        let Some((_, keys)) = self.class_index.remove(class_id) else {
            tracing::debug!(class_id = %class_id, "no cached attendance keys for class");
            return Ok(0);
        };

        let keys: Vec<String> = keys.into_iter().collect();
        let mut removed = 0;

        for (i, key) in keys.iter().enumerate() {
            if let Err(source) = self.store.delete(key).await {
                let mut entry = self.class_index.entry(class_id.to_string()).or_default();
                for k in &keys[i..] {
                    entry.insert(k.clone());
                }
                drop(entry);
                tracing::error!(class_id = %class_id, key = %key, error = %source, "class invalidation aborted");
                return Err(CacheError::Invalidation {
                    key: key.clone(),
                    source,
                });
            }
            removed += 1;
        }

        tracing::debug!(class_id = %class_id, removed, "class attendance cache invalidated");
        Ok(removed)
    }

    /// Number of keys currently indexed for a class.
    pub fn indexed_key_count(&self, class_id: &str) -> usize {
        self.class_index.get(class_id).map(|s| s.len()).unwrap_or(0)
    }

    fn index_key(&self, class_id: &str, key: &str) {
        self.class_index
            .entry(class_id.to_string())
            .or_default()
            .insert(key.to_string());
    }

    fn unindex_key(&self, class_id: &str, key: &str) {
        if let Some(mut keys) = self.class_index.get_mut(class_id) {
            keys.remove(key);
            let empty = keys.is_empty();
            drop(keys);
            if empty {
                self.class_index.remove_if(class_id, |_, v| v.is_empty());
            }
        }
    }
}
