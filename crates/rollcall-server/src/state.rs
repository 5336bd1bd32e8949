//! Shared application state and the mark write path.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use rollcall_auth::TokenVerifier;
use rollcall_cache::{AttendanceCacheService, CacheError};
use rollcall_core::{AttendanceMark, now_utc};
use rollcall_sync::{DurableSink, OfflineSyncQueue};

use crate::api::MarkAttendanceRequest;
use crate::realtime::{AttendanceUpdate, RealtimeBroadcaster};

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<AttendanceCacheService>,
    pub queue: Arc<OfflineSyncQueue>,
    pub sink: Arc<dyn DurableSink>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub broadcaster: Arc<RealtimeBroadcaster>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Apply a validated mark mutation: write through the cache,
    /// enqueue for offline sync, then broadcast to the class room.
    ///
    /// The broadcast happens only after the cache write succeeded; a
    /// failed write returns the error and neither enqueues nor
    /// broadcasts.
    pub async fn mark(&self, req: &MarkAttendanceRequest) -> Result<String, CacheError> {
        let cache_key = self
            .cache
            .set_attendance(&req.class_id, &req.student_id, req.status, req.ttl)
            .await?;

        self.queue.enqueue(AttendanceMark {
            class_id: req.class_id.clone(),
            student_id: req.student_id.clone(),
            status: req.status,
            ttl_seconds: req.ttl,
            marked_at: now_utc(),
        });

        self.broadcaster.broadcast(
            &req.class_id,
            AttendanceUpdate {
                student_id: req.student_id.clone(),
                status: req.status,
            },
        );

        Ok(cache_key)
    }
}
