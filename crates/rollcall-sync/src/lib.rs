//! Offline replay queue for attendance writes.
//!
//! Marks are buffered in-process and forwarded to a durable sink when a
//! drain is triggered (on every new realtime connection). The queue is
//! owned by the process that created it; entries do not survive restart.

pub mod queue;
pub mod sink;

pub use queue::{DrainOutcome, OfflineSyncQueue};
pub use sink::{DurableSink, SyncError, WebhookSink};
