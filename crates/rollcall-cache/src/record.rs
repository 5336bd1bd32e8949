//! System-of-record client used by the cache-aside miss path.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use rollcall_core::AttendanceRecord;

/// Failures while fetching from the authoritative source.
#[derive(Debug, Error)]
pub enum RecordFetchError {
    #[error("system of record unreachable: {0}")]
    Transport(String),

    #[error("system of record returned status {status} for key: {key}")]
    Status { key: String, status: u16 },

    #[error("system of record response could not be decoded: {0}")]
    Decode(String),
}

/// The authoritative source an unpopulated key falls back to.
#[async_trait]
pub trait SystemOfRecord: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<AttendanceRecord, RecordFetchError>;
}

/// HTTP client for the durable backend's record endpoint.
///
/// Fetches `GET {base_url}/records/{key}` and expects an attendance
/// record body (`{"status": ..., "markedAt": ...}`).
pub struct HttpSystemOfRecord {
    http_client: Client,
    base_url: String,
}

impl HttpSystemOfRecord {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SystemOfRecord for HttpSystemOfRecord {
    async fn fetch(&self, key: &str) -> Result<AttendanceRecord, RecordFetchError> {
        let url = format!("{}/records/{}", self.base_url.trim_end_matches('/'), key);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| RecordFetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RecordFetchError::Status {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .json::<AttendanceRecord>()
            .await
            .map_err(|e| RecordFetchError::Decode(e.to_string()))
    }
}
