//! Authentication error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors raised while authenticating a connection or request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request lacks usable bearer credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The presented token was rejected by the verifier.
    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    /// The verifier itself could not be consulted.
    #[error("Token verification unavailable: {message}")]
    Verification { message: String },
}

impl AuthError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } | Self::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            Self::Verification { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": "authentication_error",
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthError::unauthorized("no token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::invalid_token("expired").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::verification("introspection endpoint down").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_message_format() {
        let err = AuthError::invalid_token("not active");
        assert_eq!(err.to_string(), "Invalid token: not active");
    }
}
