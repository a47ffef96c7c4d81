//! Edge route guard.
//!
//! Runs as axum middleware ahead of every handler. Each request path is
//! classified into one [`RouteClass`] and turned into a [`Decision`]. The guard
//! never panics: non-admin paths fail open, admin paths fail closed.

pub mod verify;

use crate::session::{CookieSession, Credential, SessionStore};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use std::{str::FromStr, sync::Arc};
use tracing::{debug, error, warn};

pub use verify::{HttpSessionVerifier, SessionVerifier, VerifyError};

pub const ADMIN_PREFIX: &str = "/admin";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Paths the guard never looks at: API routes, static assets, image routes.
const UNGUARDED_PATTERN: &str = r"^/(api|assets|images)(/|$)|^/favicon\.ico$";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AdminProtected,
    AdminLoginExempt,
}

/// Classify a request path. Total: every path maps to exactly one class.
#[must_use]
pub fn classify(path: &str) -> RouteClass {
    let path = if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    };

    let Some(rest) = path.strip_prefix(ADMIN_PREFIX) else {
        return RouteClass::Public;
    };
    if !(rest.is_empty() || rest.starts_with('/')) {
        // e.g. /administrator
        return RouteClass::Public;
    }
    if path == ADMIN_LOGIN_PATH {
        RouteClass::AdminLoginExempt
    } else {
        RouteClass::AdminProtected
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

/// How admin-protected paths are treated at the edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdminVerification {
    /// Let every admin request through and rely on the client auth gate.
    /// Known gap: the client gate alone is bypassable.
    Deferred,
    /// Require a credential the backend accepts.
    #[default]
    Enforce,
}

impl AdminVerification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Enforce => "enforce",
        }
    }
}

impl FromStr for AdminVerification {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "deferred" => Ok(Self::Deferred),
            "enforce" => Ok(Self::Enforce),
            other => Err(format!("invalid admin verification mode: {other}")),
        }
    }
}

/// Deny-by-pattern matcher selecting which paths the guard inspects.
#[derive(Clone, Debug)]
pub struct Matcher {
    unguarded: Option<Regex>,
}

impl Matcher {
    #[must_use]
    pub fn new() -> Self {
        let unguarded = Regex::new(UNGUARDED_PATTERN)
            .map_err(|err| error!("invalid guard matcher pattern: {err}"))
            .ok();
        Self { unguarded }
    }

    /// Whether the guard applies to `path`. Without a usable pattern every
    /// path is guarded.
    #[must_use]
    pub fn applies(&self, path: &str) -> bool {
        self.unguarded
            .as_ref()
            .map_or(true, |pattern| !pattern.is_match(path))
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RouteGuard {
    matcher: Matcher,
    admin: AdminVerification,
    verifier: Arc<dyn SessionVerifier>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(admin: AdminVerification, verifier: Arc<dyn SessionVerifier>) -> Self {
        Self {
            matcher: Matcher::new(),
            admin,
            verifier,
        }
    }

    /// Decide whether `path` may be rendered.
    pub async fn check(&self, path: &str, credential: Option<&Credential>) -> Decision {
        if !self.matcher.applies(path) {
            return Decision::Allow;
        }

        match classify(path) {
            RouteClass::Public | RouteClass::AdminLoginExempt => Decision::Allow,
            RouteClass::AdminProtected => self.check_admin(path, credential).await,
        }
    }

    async fn check_admin(&self, path: &str, credential: Option<&Credential>) -> Decision {
        if self.admin == AdminVerification::Deferred {
            debug!(path, "admin verification deferred to the client gate");
            return Decision::Allow;
        }

        let Some(credential) = credential else {
            debug!(path, "admin path without session");
            return login_redirect();
        };

        match self.verifier.verify(credential).await {
            Ok(true) => Decision::Allow,
            Ok(false) => {
                debug!(path, "admin session rejected");
                login_redirect()
            }
            Err(err) => {
                warn!(path, "admin session verification failed, failing closed: {err}");
                login_redirect()
            }
        }
    }
}

fn login_redirect() -> Decision {
    Decision::Redirect(ADMIN_LOGIN_PATH.to_string())
}

/// axum middleware running [`RouteGuard::check`] before any handler.
pub async fn route_guard(
    State(guard): State<Arc<RouteGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let credential = CookieSession::from_headers(request.headers())
        .credential()
        .ok()
        .flatten();

    match guard.check(&path, credential.as_ref()).await {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(to) => Redirect::temporary(&to).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Answer {
        Valid,
        Invalid,
        Unreachable,
    }

    struct FakeVerifier {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl FakeVerifier {
        fn new(answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SessionVerifier for FakeVerifier {
        async fn verify(&self, _credential: &Credential) -> Result<bool, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Answer::Valid => Ok(true),
                Answer::Invalid => Ok(false),
                Answer::Unreachable => Err(VerifyError::Status(502)),
            }
        }
    }

    fn credential() -> Option<Credential> {
        Credential::new("tok")
    }

    #[test]
    fn classification_is_total_and_segment_aware() {
        assert_eq!(classify("/"), RouteClass::Public);
        assert_eq!(classify(""), RouteClass::Public);
        assert_eq!(classify("/dashboard"), RouteClass::Public);
        assert_eq!(classify("/administrator"), RouteClass::Public);
        assert_eq!(classify("/admin"), RouteClass::AdminProtected);
        assert_eq!(classify("/admin/"), RouteClass::AdminProtected);
        assert_eq!(classify("/admin/settings"), RouteClass::AdminProtected);
        assert_eq!(classify("/admin/login"), RouteClass::AdminLoginExempt);
        assert_eq!(classify("/admin/login/"), RouteClass::AdminLoginExempt);
        assert_eq!(classify("/admin/login/reset"), RouteClass::AdminProtected);
    }

    #[test]
    fn matcher_skips_api_assets_and_images() {
        let matcher = Matcher::new();
        assert!(!matcher.applies("/api/v1/documents"));
        assert!(!matcher.applies("/assets/sections.js"));
        assert!(!matcher.applies("/images/logo.png"));
        assert!(!matcher.applies("/favicon.ico"));
        assert!(matcher.applies("/apis"));
        assert!(matcher.applies("/admin"));
        assert!(matcher.applies("/dashboard"));
    }

    #[test]
    fn admin_verification_parses() {
        assert_eq!("Deferred".parse(), Ok(AdminVerification::Deferred));
        assert_eq!("enforce".parse(), Ok(AdminVerification::Enforce));
        assert!("maybe".parse::<AdminVerification>().is_err());
        assert_eq!(AdminVerification::default(), AdminVerification::Enforce);
    }

    #[tokio::test]
    async fn non_admin_paths_always_allow() {
        for admin in [AdminVerification::Deferred, AdminVerification::Enforce] {
            let guard = RouteGuard::new(admin, FakeVerifier::new(Answer::Unreachable));
            for path in ["/", "/dashboard", "/payment/success", "/administrator", "/health"] {
                assert_eq!(guard.check(path, None).await, Decision::Allow, "{path}");
            }
        }
    }

    #[tokio::test]
    async fn admin_login_is_always_allowed() {
        for admin in [AdminVerification::Deferred, AdminVerification::Enforce] {
            let verifier = FakeVerifier::new(Answer::Invalid);
            let guard = RouteGuard::new(admin, verifier.clone());
            assert_eq!(guard.check("/admin/login", None).await, Decision::Allow);
            assert_eq!(
                guard.check("/admin/login", credential().as_ref()).await,
                Decision::Allow
            );
            assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn deferred_mode_allows_admin_without_credential() {
        // Legacy behavior, kept selectable: the edge does not verify admin
        // sessions and the client gate is the only check.
        let verifier = FakeVerifier::new(Answer::Invalid);
        let guard = RouteGuard::new(AdminVerification::Deferred, verifier.clone());
        assert_eq!(guard.check("/admin/settings", None).await, Decision::Allow);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enforce_mode_depends_on_credential_validity() {
        let login = Decision::Redirect("/admin/login".to_string());

        let guard = RouteGuard::new(AdminVerification::Enforce, FakeVerifier::new(Answer::Valid));
        assert_eq!(guard.check("/admin/settings", None).await, login);
        assert_eq!(
            guard.check("/admin/settings", credential().as_ref()).await,
            Decision::Allow
        );

        let guard = RouteGuard::new(AdminVerification::Enforce, FakeVerifier::new(Answer::Invalid));
        assert_eq!(
            guard.check("/admin", credential().as_ref()).await,
            login
        );
    }

    #[tokio::test]
    async fn verifier_errors_fail_closed_on_admin_paths_only() {
        let guard = RouteGuard::new(
            AdminVerification::Enforce,
            FakeVerifier::new(Answer::Unreachable),
        );
        assert_eq!(
            guard.check("/admin/settings", credential().as_ref()).await,
            Decision::Redirect("/admin/login".to_string())
        );
        assert_eq!(
            guard.check("/dashboard", credential().as_ref()).await,
            Decision::Allow
        );
    }

    #[tokio::test]
    async fn unguarded_paths_skip_classification() {
        let verifier = FakeVerifier::new(Answer::Invalid);
        let guard = RouteGuard::new(AdminVerification::Enforce, verifier.clone());
        assert_eq!(guard.check("/api/admin/users", None).await, Decision::Allow);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }
}
