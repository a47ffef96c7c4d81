//! Session oracle: answers whether the caller currently holds a credential.
//!
//! The credential is read-only here. Login and logout live in the backend; this
//! crate only reads the session cookie (or a bearer token) and hands the value
//! to the route guard and the client auth gate through an explicit
//! [`SessionStore`] handle.

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;

pub const SESSION_COOKIE_NAME: &str = "docgate_session";

/// Opaque session token. Never logged.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wraps a raw token. Blank tokens count as no credential at all.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(SecretString::from(token)))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage is unreadable: {0}")]
    Unreadable(String),
}

/// Read access to the session credential.
pub trait SessionStore: Send + Sync {
    /// # Errors
    /// Returns an error when the underlying storage cannot be read.
    fn credential(&self) -> Result<Option<Credential>, SessionError>;
}

/// Session read from request headers: a bearer token wins over the cookie.
#[derive(Debug, Default)]
pub struct CookieSession {
    token: Option<Credential>,
    unreadable: Option<String>,
}

impl CookieSession {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(token) = extract_bearer_token(headers) {
            return Self {
                token: Credential::new(token),
                unreadable: None,
            };
        }

        match extract_cookie(headers, SESSION_COOKIE_NAME) {
            Ok(token) => Self {
                token: token.and_then(Credential::new),
                unreadable: None,
            },
            Err(err) => Self {
                token: None,
                unreadable: Some(err),
            },
        }
    }
}

impl SessionStore for CookieSession {
    fn credential(&self) -> Result<Option<Credential>, SessionError> {
        if let Some(reason) = &self.unreadable {
            return Err(SessionError::Unreadable(reason.clone()));
        }
        Ok(self.token.clone())
    }
}

/// Fixed session, used where the credential is already known.
#[derive(Debug, Default, Clone)]
pub struct StaticSession(Option<Credential>);

impl StaticSession {
    #[must_use]
    pub fn signed_in(token: &str) -> Self {
        Self(Credential::new(token))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl SessionStore for StaticSession {
    fn credential(&self) -> Result<Option<Credential>, SessionError> {
        Ok(self.0.clone())
    }
}

/// Find a cookie by name, across every `Cookie` field of the request.
///
/// # Errors
/// Returns an error when a `Cookie` field is not valid visible ASCII.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Result<Option<String>, String> {
    for header in headers.get_all(COOKIE) {
        let value = header
            .to_str()
            .map_err(|err| format!("invalid cookie header: {err}"))?;
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == name {
                return Ok(Some(val.trim().to_string()));
            }
        }
    }
    Ok(None)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
