use thiserror::Error;

/// Core error types for Rollcall operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid attendance status: {0}")]
    InvalidStatus(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new InvalidStatus error
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }

    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(ts: impl Into<String>) -> Self {
        Self::InvalidTimestamp(ts.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatus(_) | Self::InvalidId(_) | Self::InvalidTimestamp(_) | Self::JsonError(_)
        )
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::TimeError(_))
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoreError::invalid_status("sleeping");
        assert_eq!(err.to_string(), "Invalid attendance status: sleeping");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_invalid_id_error() {
        let err = CoreError::invalid_id("cls/7");
        assert_eq!(err.to_string(), "Invalid identifier: cls/7");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert!(core_err.is_client_error());
    }

    #[test]
    fn test_configuration_error() {
        let err = CoreError::configuration("cache.min_ttl_secs must be > 0");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_result_type_usage() {
        fn ok_fn() -> Result<&'static str> {
            Ok("done")
        }

        fn err_fn() -> Result<&'static str> {
            Err(CoreError::invalid_id("bad"))
        }

        assert!(ok_fn().is_ok());
        assert!(err_fn().is_err());
    }
}
