//! In-process FIFO buffer of pending attendance writes.

use parking_lot::Mutex;
use std::collections::VecDeque;

use rollcall_core::AttendanceMark;

use crate::sink::{DurableSink, SyncError};

/// Result of a drain attempt.
#[derive(Debug)]
pub enum DrainOutcome {
    /// Every queued entry was forwarded.
    Completed { forwarded: usize },
    /// A forward failed; the failed entry is dropped and the remainder
    /// stays queued for the next trigger (at-most-once).
    Stopped { forwarded: usize, error: SyncError },
    /// Another drain holds the guard; this trigger was dropped.
    AlreadyDraining,
}

/// Unbounded FIFO of pending writes with a single-flight drain.
///
/// Drains are triggered on every new realtime connection, so concurrent
/// triggers are the norm; the async guard ensures at most one drain
/// pops entries at a time, and later triggers are dropped rather than
/// queued behind it.
pub struct OfflineSyncQueue {
    entries: Mutex<VecDeque<AttendanceMark>>,
    drain_guard: tokio::sync::Mutex<()>,
}

impl OfflineSyncQueue {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            drain_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Append a copy of the mutation payload to the tail. No
    /// deduplication and no size bound.
    pub fn enqueue(&self, entry: AttendanceMark) {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        tracing::debug!(pending = entries.len(), "entry enqueued for offline sync");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forward queued entries to the sink, head first, until empty.
    ///
    /// An entry is popped before it is forwarded; a forwarding failure
    /// drops that entry and stops the drain, leaving the rest queued.
    pub async fn drain(&self, sink: &dyn DurableSink) -> DrainOutcome {
        let Ok(_guard) = self.drain_guard.try_lock() else {
            tracing::debug!("drain already in flight, trigger dropped");
            return DrainOutcome::AlreadyDraining;
        };

        let mut forwarded = 0;
        loop {
            let entry = {
                let mut entries = self.entries.lock();
                entries.pop_front()
            };
            let Some(entry) = entry else {
                break;
            };

            if let Err(error) = sink.forward(&entry).await {
                tracing::warn!(
                    class_id = %entry.class_id,
                    student_id = %entry.student_id,
                    error = %error,
                    "drain stopped, entry dropped"
                );
                return DrainOutcome::Stopped { forwarded, error };
            }
            forwarded += 1;
        }

        if forwarded > 0 {
            tracing::info!(forwarded, "offline sync queue drained");
        }
        DrainOutcome::Completed { forwarded }
    }
}

impl Default for OfflineSyncQueue {
    fn default() -> Self {
        Self::new()
    }
}
