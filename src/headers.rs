//! Security response headers applied to every response.

use axum::{
    http::{
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
        HeaderName, HeaderValue,
    },
    Router,
};
use thiserror::Error;
use tower_http::set_header::SetResponseHeaderLayer;
use url::Url;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("API origin must include a valid host: {0}")]
    MissingHost(String),
    #[error("invalid header value: {0}")]
    InvalidValue(#[from] axum::http::header::InvalidHeaderValue),
}

/// `scheme://host[:port]` of the backend API, as it appears in the CSP.
///
/// # Errors
/// Returns an error if the URL has no host.
pub fn origin_of(url: &Url) -> Result<String, HeaderError> {
    let host = url
        .host_str()
        .ok_or_else(|| HeaderError::MissingHost(url.to_string()))?;
    let port = url
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    Ok(format!("{}://{}{}", url.scheme(), host, port))
}

/// Content-Security-Policy allowing scripts, styles and connections to the
/// backend API origin only.
#[must_use]
pub fn content_security_policy(api_origin: &str) -> String {
    [
        "default-src 'self'".to_string(),
        format!("script-src 'self' {api_origin}"),
        format!("style-src 'self' {api_origin}"),
        format!("connect-src 'self' {api_origin}"),
        "img-src 'self' data:".to_string(),
        "font-src 'self'".to_string(),
        "object-src 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'none'".to_string(),
    ]
    .join("; ")
}

#[derive(Clone, Debug)]
pub struct SecurityHeaders {
    csp: HeaderValue,
}

impl SecurityHeaders {
    /// # Errors
    /// Returns an error if the API origin cannot be turned into a CSP value.
    pub fn new(api_origin: &Url) -> Result<Self, HeaderError> {
        let origin = origin_of(api_origin)?;
        let csp = HeaderValue::from_str(&content_security_policy(&origin))?;
        Ok(Self { csp })
    }

    #[must_use]
    pub fn csp(&self) -> &HeaderValue {
        &self.csp
    }

    /// Attach the headers to every response of `router`, overriding any value
    /// a handler set.
    #[must_use]
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(SetResponseHeaderLayer::overriding(
                CONTENT_SECURITY_POLICY,
                self.csp.clone(),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                PERMISSIONS_POLICY,
                HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
            ))
    }
}
