//! Shared fakes and state construction for integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rollcall_auth::StaticTokenVerifier;
use rollcall_cache::{
    AttendanceCacheService, MemoryStore, RecordFetchError, SystemOfRecord, TtlPolicy,
};
use rollcall_core::{AttendanceMark, AttendanceRecord, AttendanceStatus, now_utc};
use rollcall_server::realtime::RealtimeBroadcaster;
use rollcall_server::{AppState, build_app};
use rollcall_sync::{DurableSink, OfflineSyncQueue, SyncError};

pub const TEST_TOKEN: &str = "test-token";

/// System-of-record stub answering every fetch with an `absent` record
/// and counting how often it was consulted.
#[derive(Default)]
pub struct StubRecords {
    fetches: AtomicUsize,
}

impl StubRecords {
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemOfRecord for StubRecords {
    async fn fetch(&self, _key: &str) -> Result<AttendanceRecord, RecordFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(AttendanceRecord::new(AttendanceStatus::Absent, now_utc()))
    }
}

/// Durable sink that records every forwarded entry.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<AttendanceMark>>,
}

impl RecordingSink {
    pub fn forwarded(&self) -> Vec<AttendanceMark> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl DurableSink for RecordingSink {
    async fn forward(&self, entry: &AttendanceMark) -> Result<(), SyncError> {
        self.seen.lock().push(entry.clone());
        Ok(())
    }
}

pub fn test_state() -> (AppState, Arc<StubRecords>, Arc<RecordingSink>) {
    let records = Arc::new(StubRecords::default());
    let sink = Arc::new(RecordingSink::default());

    let state = AppState {
        cache: Arc::new(AttendanceCacheService::new(
            Arc::new(MemoryStore::new()),
            records.clone(),
            TtlPolicy::default(),
        )),
        queue: Arc::new(OfflineSyncQueue::new()),
        sink: sink.clone(),
        verifier: Arc::new(StaticTokenVerifier::from_tokens([(TEST_TOKEN, "teacher-1")])),
        broadcaster: Arc::new(RealtimeBroadcaster::new()),
        metrics: None,
    };

    (state, records, sink)
}

pub fn test_app(state: AppState) -> axum::Router {
    build_app(state, 1024 * 1024)
}
