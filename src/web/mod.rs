//! HTTP front: router, middleware stack and server loop.

use crate::{
    client::{ApiClient, DocumentsApi},
    guard::{route_guard, AdminVerification, HttpSessionVerifier, RouteGuard},
    headers::SecurityHeaders,
    render::{
        boundary::{Diagnostics, TracingDiagnostics},
        document::{Layout, Renderer},
        section::CancelPolicy,
    },
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;

pub mod handlers;
pub mod layout;
pub mod pages;
pub mod sections;

pub use layout::AppLayout;

/// Runtime settings for the web front.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_origin: Url,
    pub admin_verification: AdminVerification,
    pub section_cancellation: CancelPolicy,
    pub secure_cookies: bool,
}

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<Renderer>,
    pub api: Arc<dyn DocumentsApi>,
    pub secure_cookies: bool,
    pub admin_verification: AdminVerification,
    pub section_cancellation: CancelPolicy,
}

impl AppState {
    #[must_use]
    pub fn new(
        settings: &Settings,
        layout: Arc<dyn Layout>,
        diagnostics: Arc<dyn Diagnostics>,
        api: Arc<dyn DocumentsApi>,
    ) -> Self {
        Self {
            renderer: Arc::new(Renderer::new(
                layout,
                diagnostics,
                settings.section_cancellation,
            )),
            api,
            secure_cookies: settings.secure_cookies,
            admin_verification: settings.admin_verification,
            section_cancellation: settings.section_cancellation,
        }
    }
}

/// All routes, guarded and hardened. Collaborators are injected so tests can
/// swap them.
pub fn router(state: AppState, guard: Arc<RouteGuard>, headers: &SecurityHeaders) -> Router {
    let app = Router::new()
        .route("/", get(handlers::pages::landing))
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/admin", get(handlers::pages::admin))
        .route("/admin/", get(handlers::pages::admin))
        .route("/admin/settings", get(handlers::pages::admin_settings))
        .route("/admin/login", get(handlers::pages::admin_login))
        .route("/payment/success", get(handlers::pages::payment_success))
        .route("/payment/cancel", get(handlers::pages::payment_cancel))
        .route("/health", get(handlers::health::health).options(handlers::health::health))
        .route("/assets/sections.js", get(handlers::assets::sections_js))
        .route("/assets/app.css", get(handlers::assets::app_css))
        .route("/favicon.ico", get(handlers::assets::favicon))
        .fallback(handlers::pages::not_found)
        .layer(middleware::from_fn_with_state(guard, route_guard))
        .with_state(state);

    headers.apply(app).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    )
}

/// Production wiring: real backend client, verifier and layout.
///
/// # Errors
/// Returns an error if a collaborator cannot be built from `settings`.
pub fn app(settings: &Settings) -> Result<Router> {
    let headers =
        SecurityHeaders::new(&settings.api_origin).context("Failed to build security headers")?;
    let verifier = HttpSessionVerifier::new(&settings.api_origin)
        .context("Failed to build session verifier")?;
    let api = ApiClient::new(settings.api_origin.clone()).context("Failed to build API client")?;

    let guard = Arc::new(RouteGuard::new(
        settings.admin_verification,
        Arc::new(verifier),
    ));
    let state = AppState::new(
        settings,
        Arc::new(AppLayout),
        Arc::new(TracingDiagnostics),
        Arc::new(api),
    );

    Ok(router(state, guard, &headers))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, settings: Settings) -> Result<()> {
    let app = app(&settings)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
