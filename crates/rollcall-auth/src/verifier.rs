//! Token verifier seam and implementations.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::AuthError;

/// The authenticated party behind a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub username: Option<String>,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            username: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Display name for logs: username when known, subject otherwise.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.subject)
    }
}

/// Validates bearer credentials before a subscription or mutating call
/// is accepted. Implementations own all token semantics.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Introspection response per RFC 7662. `active` is the only required
/// field; an inactive token carries no further claims.
#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    active: bool,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// Verifier that consults a remote RFC 7662-style introspection endpoint.
///
/// POSTs `token=<value>` form-encoded and accepts the token iff the
/// endpoint answers `active: true`.
pub struct IntrospectionVerifier {
    http_client: Client,
    endpoint: String,
}

impl IntrospectionVerifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for IntrospectionVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| AuthError::verification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::verification(format!(
                "introspection endpoint returned status {}",
                response.status().as_u16()
            )));
        }

        let introspection: IntrospectionResponse = response
            .json()
            .await
            .map_err(|e| AuthError::verification(e.to_string()))?;

        if !introspection.active {
            // Do not reveal why the token is inactive.
            return Err(AuthError::invalid_token("token is not active"));
        }

        let subject = introspection
            .sub
            .or_else(|| introspection.username.clone())
            .ok_or_else(|| AuthError::verification("active token without a subject"))?;

        let mut principal = Principal::new(subject);
        if let Some(username) = introspection.username {
            principal = principal.with_username(username);
        }

        tracing::debug!(user = %principal.display_name(), "token verified");
        Ok(principal)
    }
}

/// Fixed token table for tests and local development.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: impl IntoIterator<Item = (String, Principal)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Convenience constructor mapping each token to a same-named subject.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, subject)| {
                    let subject = subject.into();
                    (token.into(), Principal::new(subject))
                })
                .collect(),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::invalid_token("unknown token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_static_verifier_accepts_known_token() {
        let verifier = StaticTokenVerifier::from_tokens([("secret-token", "teacher-1")]);
        let principal = verifier.verify("secret-token").await.unwrap();
        assert_eq!(principal.subject, "teacher-1");
    }

    #[tokio::test]
    async fn test_static_verifier_rejects_unknown_token() {
        let verifier = StaticTokenVerifier::from_tokens([("secret-token", "teacher-1")]);
        let err = verifier.verify("other").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_introspection_accepts_active_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/introspect"))
            .and(body_string_contains("token=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "active": true,
                "sub": "teacher-1",
                "username": "ms-frizzle",
            })))
            .mount(&server)
            .await;

        let verifier = IntrospectionVerifier::new(format!("{}/introspect", server.uri()));
        let principal = verifier.verify("abc").await.unwrap();

        assert_eq!(principal.subject, "teacher-1");
        assert_eq!(principal.display_name(), "ms-frizzle");
    }

    #[tokio::test]
    async fn test_introspection_rejects_inactive_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "active": false,
            })))
            .mount(&server)
            .await;

        let verifier = IntrospectionVerifier::new(server.uri());
        let err = verifier.verify("abc").await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_introspection_transport_failure_is_verification_error() {
        // Nothing is listening on this port.
        let verifier = IntrospectionVerifier::new("http://127.0.0.1:9/introspect");
        let err = verifier.verify("abc").await.unwrap_err();

        assert!(matches!(err, AuthError::Verification { .. }));
    }
}
