//! Durable sink the offline queue drains into.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use rollcall_core::AttendanceMark;

/// Failures while forwarding a queue entry to the durable backend.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("durable sink unreachable: {0}")]
    Transport(String),

    #[error("durable sink rejected entry with status {0}")]
    Rejected(u16),
}

/// Destination for buffered attendance writes.
#[async_trait]
pub trait DurableSink: Send + Sync {
    async fn forward(&self, entry: &AttendanceMark) -> Result<(), SyncError>;
}

/// Sink that POSTs each entry as JSON to a configured endpoint.
pub struct WebhookSink {
    http_client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl DurableSink for WebhookSink {
    async fn forward(&self, entry: &AttendanceMark) -> Result<(), SyncError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(entry)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Rejected(response.status().as_u16()));
        }

        tracing::debug!(
            class_id = %entry.class_id,
            student_id = %entry.student_id,
            "queue entry forwarded to durable sink"
        );
        Ok(())
    }
}
