//! Boundary mapping from the core error taxonomy to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use rollcall_auth::AuthError;
use rollcall_cache::CacheError;
use rollcall_core::CoreError;

/// Error wrapper returned by the REST handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Cache(CacheError::Fallback { .. }) => StatusCode::BAD_GATEWAY,
            Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => err.status_code(),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::Cache(_) => "cache_error",
            Self::Auth(_) => "authentication_error",
            Self::Validation(_) => "validation_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "error": self.category(),
            "message": self.to_string(),
        });
        if let Self::Cache(ref err) = self {
            body["key"] = json!(err.key());
        }

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = %status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_cache::CacheStoreError;

    #[test]
    fn test_cache_errors_map_to_500() {
        let err = ApiError::Cache(CacheError::Write {
            key: "attendance_1_2_2025-03-10".into(),
            source: CacheStoreError::Connection("refused".into()),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.category(), "cache_error");
    }

    #[test]
    fn test_fallback_errors_map_to_502() {
        let err = ApiError::Cache(CacheError::Fallback {
            key: "attendance_1_2_2025-03-10".into(),
            source: rollcall_cache::RecordFetchError::Transport("timed out".into()),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError = CoreError::invalid_id("bad id").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.category(), "validation_error");
    }

    #[test]
    fn test_auth_maps_to_401() {
        let err = ApiError::Auth(AuthError::unauthorized("no token"));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
