//! User-visible notifications (toasts).
//!
//! Used by the client auth gate and by sections reporting a failed fetch.
//! Notifications raised before a redirect travel in a short-lived flash
//! cookie so the next page can show them.

use base64ct::{Base64UrlUnpadded, Encoding};
use parking_lot::Mutex;

pub const FLASH_COOKIE_NAME: &str = "docgate_flash";
const FLASH_MAX_AGE_SECONDS: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Request-scoped notification buffer.
#[derive(Debug, Default)]
pub struct Toasts {
    pending: Mutex<Vec<Notification>>,
}

impl Toasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains everything raised so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending.lock())
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.pending.lock().clone()
    }
}

impl Notifier for Toasts {
    fn notify(&self, kind: NotificationKind, message: &str) {
        tracing::debug!(kind = kind.as_str(), "notification raised");
        self.pending.lock().push(Notification {
            kind,
            message: message.to_string(),
        });
    }
}

/// Encode notifications as a flash cookie value: `kind:b64(message)` joined by `.`.
#[must_use]
pub fn encode_flash(notifications: &[Notification]) -> String {
    notifications
        .iter()
        .map(|n| {
            format!(
                "{}:{}",
                n.kind.as_str(),
                Base64UrlUnpadded::encode_string(n.message.as_bytes())
            )
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Decode a flash cookie value. Malformed entries are skipped.
#[must_use]
pub fn decode_flash(value: &str) -> Vec<Notification> {
    value
        .split('.')
        .filter_map(|entry| {
            let (kind, message) = entry.split_once(':')?;
            let kind = NotificationKind::parse(kind)?;
            let bytes = Base64UrlUnpadded::decode_vec(message).ok()?;
            let message = String::from_utf8(bytes).ok()?;
            Some(Notification { kind, message })
        })
        .collect()
}

#[must_use]
pub fn flash_cookie(notifications: &[Notification], secure: bool) -> String {
    let mut cookie = format!(
        "{FLASH_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={FLASH_MAX_AGE_SECONDS}",
        encode_flash(notifications)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[must_use]
pub fn clear_flash_cookie(secure: bool) -> String {
    let mut cookie = format!("{FLASH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
