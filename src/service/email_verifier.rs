// service/email_verifier.rs
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Verifier API error ({0}): {1}")]
    Api(u16, String),
    #[error("Malformed verifier response: {0}")]
    Malformed(String),
}

/// Verdict returned by the verification service.
#[derive(Debug, Clone, Serialize)]
pub struct EmailVerification {
    pub status: String,
    pub raw: Value,
}

impl EmailVerification {
    pub fn is_valid(&self) -> bool {
        self.status == "valid"
    }

    /// Extracts `data.status` from a Hunter email-verifier payload.
    pub fn from_response(raw: Value) -> Result<Self, VerifierError> {
        let status = raw
            .get("data")
            .and_then(|data| data.get("status"))
            .and_then(|status| status.as_str())
            .ok_or_else(|| VerifierError::Malformed("missing data.status".to_string()))?
            .to_string();

        Ok(EmailVerification { status, raw })
    }
}

#[async_trait]
pub trait EmailVerifier: Send + Sync {
    /// Returns `None` when the service could not be reached or answered with an error.
    async fn verify(&self, email: &str) -> Option<EmailVerification>;
}

pub struct HunterEmailVerifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HunterEmailVerifier {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        HunterEmailVerifier {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, email: &str) -> Result<EmailVerification, VerifierError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("email", email), ("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "No response body".to_string());
            return Err(VerifierError::Api(status.as_u16(), body));
        }

        let raw: Value = response.json().await?;
        EmailVerification::from_response(raw)
    }
}

#[async_trait]
impl EmailVerifier for HunterEmailVerifier {
    async fn verify(&self, email: &str) -> Option<EmailVerification> {
        match self.request(email).await {
            Ok(verification) => {
                tracing::debug!("Email {} verified with status {}", email, verification.status);
                Some(verification)
            }
            Err(e) => {
                tracing::error!("Email verification failed for {}: {}", email, e);
                None
            }
        }
    }
}

/// Verifier with a canned answer, for tests.
#[cfg(test)]
pub struct StaticEmailVerifier {
    pub status: Option<&'static str>,
}

#[cfg(test)]
#[async_trait]
impl EmailVerifier for StaticEmailVerifier {
    async fn verify(&self, _email: &str) -> Option<EmailVerification> {
        self.status.map(|status| EmailVerification {
            status: status.to_string(),
            raw: serde_json::json!({ "data": { "status": status } }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_verifier(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v2/email-verifier", addr)
    }

    #[test]
    fn test_from_response() {
        let verification =
            EmailVerification::from_response(json!({ "data": { "status": "valid", "score": 98 } }))
                .unwrap();
        assert!(verification.is_valid());

        let verification =
            EmailVerification::from_response(json!({ "data": { "status": "invalid" } })).unwrap();
        assert!(!verification.is_valid());
    }

    #[test]
    fn test_from_response_missing_status() {
        assert!(matches!(
            EmailVerification::from_response(json!({ "errors": [] })),
            Err(VerifierError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_passes_email_and_key() {
        let router = Router::new().route(
            "/v2/email-verifier",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let status = if params.get("api_key").map(String::as_str) == Some("secret")
                    && params.get("email").map(String::as_str) == Some("alice@x.com")
                {
                    "valid"
                } else {
                    "invalid"
                };
                Json(json!({ "data": { "status": status } }))
            }),
        );
        let url = spawn_verifier(router).await;

        let verifier = HunterEmailVerifier::new(url, "secret");
        let verification = verifier.verify("alice@x.com").await.unwrap();
        assert!(verification.is_valid());
    }

    #[tokio::test]
    async fn test_verify_http_error_is_absent() {
        let router = Router::new().route(
            "/v2/email-verifier",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let url = spawn_verifier(router).await;

        let verifier = HunterEmailVerifier::new(url, "secret");
        assert!(verifier.verify("alice@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_verify_unreachable_is_absent() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let verifier =
            HunterEmailVerifier::new(format!("http://{}/v2/email-verifier", addr), "secret");
        assert!(verifier.verify("alice@x.com").await.is_none());
    }
}
