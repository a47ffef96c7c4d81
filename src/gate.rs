//! Client auth gate: mount-time check on protected pages.
//!
//! UX guard only. The route guard and the backend are the real access
//! boundary; this gate makes sure a signed-out visitor gets a notification and
//! a redirect instead of a page full of failing sections.

use crate::{
    notify::{NotificationKind, Notifier},
    session::{Credential, SessionStore},
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{info, warn};

pub const SIGN_IN_MESSAGE: &str = "Please sign in to view documents";
pub const ENTRY_PATH: &str = "/";

/// Issues client-side navigations.
pub trait Navigator: Send + Sync {
    fn redirect(&self, to: &str);
}

/// Remembers the requested navigation so the server can answer with a redirect.
#[derive(Debug, Default)]
pub struct PendingRedirect {
    target: Mutex<Option<String>>,
}

impl PendingRedirect {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target(&self) -> Option<String> {
        self.target.lock().clone()
    }
}

impl Navigator for PendingRedirect {
    fn redirect(&self, to: &str) {
        *self.target.lock() = Some(to.to_string());
    }
}

#[derive(Clone, Debug)]
pub enum GateOutcome {
    /// Render the page; fetches use this credential.
    Proceed(Credential),
    /// Navigation away was issued; render nothing protected.
    Redirected,
}

/// One gate per page mount.
#[derive(Debug, Default)]
pub struct ClientAuthGate {
    outcome: OnceCell<GateOutcome>,
}

impl ClientAuthGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the session. Only the first call per mount does any work; later
    /// calls replay its outcome.
    pub fn on_mount(
        &self,
        session: &dyn SessionStore,
        notifier: &dyn Notifier,
        navigator: &dyn Navigator,
    ) -> GateOutcome {
        self.outcome
            .get_or_init(|| {
                let credential = match session.credential() {
                    Ok(credential) => credential,
                    Err(err) => {
                        warn!("session read failed, treating as signed out: {err}");
                        None
                    }
                };

                if let Some(credential) = credential {
                    GateOutcome::Proceed(credential)
                } else {
                    info!("no session on protected page, redirecting to {ENTRY_PATH}");
                    notifier.notify(NotificationKind::Error, SIGN_IN_MESSAGE);
                    navigator.redirect(ENTRY_PATH);
                    GateOutcome::Redirected
                }
            })
            .clone()
    }
}
