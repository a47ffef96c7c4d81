//! Backend API client used by page sections.
//!
//! Every call is bearer-authenticated with the caller's credential. Any
//! non-success response becomes an [`ApiError`] for the calling section only.

pub mod model;

use crate::session::Credential;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

pub use model::{AdminOverview, Document, Template, Usage};

/// Default request timeout applied to all backend calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters kept in an [`ApiError`].
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
}

/// Backend endpoints the dashboard and admin pages read from.
#[async_trait]
pub trait DocumentsApi: Send + Sync {
    async fn documents(&self, credential: &Credential) -> Result<Vec<Document>, ApiError>;
    async fn usage(&self, credential: &Credential) -> Result<Usage, ApiError>;
    async fn templates(&self, credential: &Credential) -> Result<Vec<Template>, ApiError>;
    async fn admin_overview(&self, credential: &Credential) -> Result<AdminOverview, ApiError>;
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_origin: Url) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base: api_origin,
        })
    }

    /// # Errors
    /// Returns an error if `path` cannot be joined to the API origin.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::Config(format!("Invalid API path {path}: {err}")))
    }

    #[instrument(skip(self, credential))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }
}

#[async_trait]
impl DocumentsApi for ApiClient {
    async fn documents(&self, credential: &Credential) -> Result<Vec<Document>, ApiError> {
        self.get_json("/v1/documents", credential).await
    }

    async fn usage(&self, credential: &Credential) -> Result<Usage, ApiError> {
        self.get_json("/v1/usage", credential).await
    }

    async fn templates(&self, credential: &Credential) -> Result<Vec<Template>, ApiError> {
        self.get_json("/v1/templates", credential).await
    }

    async fn admin_overview(&self, credential: &Credential) -> Result<AdminOverview, ApiError> {
        self.get_json("/v1/admin/overview", credential).await
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        debug!("backend answered {status}");
        Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

/// Trims and truncates an error body for display.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
