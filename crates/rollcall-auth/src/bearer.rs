//! Bearer token extraction.
//!
//! Tokens arrive in the `Authorization: Bearer <token>` header or, for
//! WebSocket handshakes that cannot set headers, in a `token` query
//! parameter.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use std::collections::HashMap;

use crate::error::AuthError;

/// Extract a bearer token from the `Authorization` header.
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

/// Extract a bearer token from the header, falling back to a `token`
/// query parameter. Errors when neither is present.
pub fn bearer_from_parts(
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<String, AuthError> {
    if let Some(token) = bearer_from_headers(headers) {
        return Ok(token);
    }
    query
        .get("token")
        .filter(|t| !t.is_empty())
        .cloned()
        .ok_or_else(|| AuthError::unauthorized("Token not provided"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_header_extraction() {
        let headers = headers_with("Bearer abc123");
        assert_eq!(bearer_from_headers(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_header_without_bearer_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_from_headers(&headers), None);
    }

    #[test]
    fn test_empty_bearer_token() {
        let headers = headers_with("Bearer ");
        assert_eq!(bearer_from_headers(&headers), None);
    }

    #[test]
    fn test_query_fallback() {
        let headers = HeaderMap::new();
        let query = HashMap::from([("token".to_string(), "qtok".to_string())]);

        assert_eq!(bearer_from_parts(&headers, &query).unwrap(), "qtok");
    }

    #[test]
    fn test_header_wins_over_query() {
        let headers = headers_with("Bearer htok");
        let query = HashMap::from([("token".to_string(), "qtok".to_string())]);

        assert_eq!(bearer_from_parts(&headers, &query).unwrap(), "htok");
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let err = bearer_from_parts(&HeaderMap::new(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }
}
