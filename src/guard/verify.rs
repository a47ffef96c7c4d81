use crate::session::Credential;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid verification endpoint: {0}")]
    Endpoint(String),
    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected verification status: {0}")]
    Status(u16),
}

/// Asks the backend whether a credential is still valid.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// `Ok(false)` means the backend rejected the credential.
    ///
    /// # Errors
    /// Returns an error when the backend could not give an answer.
    async fn verify(&self, credential: &Credential) -> Result<bool, VerifyError>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

/// Verifies sessions against `POST {api_origin}/v1/session/verify`.
#[derive(Clone, Debug)]
pub struct HttpSessionVerifier {
    client: Client,
    endpoint: Url,
}

impl HttpSessionVerifier {
    /// # Errors
    /// Returns an error if the endpoint cannot be derived from `api_origin` or
    /// the HTTP client cannot be built.
    pub fn new(api_origin: &Url) -> Result<Self, VerifyError> {
        let endpoint = api_origin
            .join("/v1/session/verify")
            .map_err(|e| VerifyError::Endpoint(e.to_string()))?;

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SessionVerifier for HttpSessionVerifier {
    async fn verify(&self, credential: &Credential) -> Result<bool, VerifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&VerifyRequest {
                token: credential.expose(),
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                debug!("session rejected: {}", response.status());
                Ok(false)
            }
            status => {
                error!("session verification failed: {status}");
                Err(VerifyError::Status(status.as_u16()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_derived_from_origin() {
        let origin = Url::parse("https://api.docgate.dev").expect("valid url");
        let verifier = HttpSessionVerifier::new(&origin).expect("verifier");
        assert_eq!(
            verifier.endpoint().as_str(),
            "https://api.docgate.dev/v1/session/verify"
        );
    }

    #[test]
    fn endpoint_ignores_origin_path() {
        let origin = Url::parse("http://localhost:9000/base/").expect("valid url");
        let verifier = HttpSessionVerifier::new(&origin).expect("verifier");
        assert_eq!(
            verifier.endpoint().as_str(),
            "http://localhost:9000/v1/session/verify"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        // port 9 (discard) is closed on test hosts
        let origin = Url::parse("http://127.0.0.1:9").expect("valid url");
        let verifier = HttpSessionVerifier::new(&origin).expect("verifier");
        let credential = Credential::new("tok").expect("credential");
        assert!(verifier.verify(&credential).await.is_err());
    }
}
