use crate::{
    gate::{ClientAuthGate, GateOutcome, PendingRedirect, ENTRY_PATH},
    notify::{clear_flash_cookie, decode_flash, flash_cookie, Notification, Toasts, FLASH_COOKIE_NAME},
    render::{document::Document, document::Page},
    session::{extract_cookie, CookieSession},
    web::{
        pages::{
            AdminLoginPage, AdminPage, AdminSettingsPage, DashboardPage, LandingPage,
            NotFoundPage, PaymentCancelPage, PaymentSuccessPage,
        },
        AppState,
    },
};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use futures::StreamExt;
use std::convert::Infallible;
use tracing::{debug, error};

pub async fn landing(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_page(&state, &headers, &LandingPage, StatusCode::OK)
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let page = DashboardPage::new(state.api.clone());
    render_page(&state, &headers, &page, StatusCode::OK)
}

pub async fn admin(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let page = AdminPage::new(state.api.clone());
    render_page(&state, &headers, &page, StatusCode::OK)
}

pub async fn admin_settings(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_page(&state, &headers, &AdminSettingsPage, StatusCode::OK)
}

pub async fn admin_login(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_page(&state, &headers, &AdminLoginPage, StatusCode::OK)
}

pub async fn payment_success(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_page(&state, &headers, &PaymentSuccessPage, StatusCode::OK)
}

pub async fn payment_cancel(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_page(&state, &headers, &PaymentCancelPage, StatusCode::OK)
}

pub async fn not_found(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_page(&state, &headers, &NotFoundPage, StatusCode::NOT_FOUND)
}

/// Mount `page` for one request: gate it if protected, then render.
fn render_page(state: &AppState, headers: &HeaderMap, page: &dyn Page, status: StatusCode) -> Response {
    let flash = read_flash(headers);
    let session = CookieSession::from_headers(headers);

    let credential = if page.protected() {
        let toasts = Toasts::new();
        let navigator = PendingRedirect::new();
        match ClientAuthGate::new().on_mount(&session, &toasts, &navigator) {
            GateOutcome::Proceed(credential) => Some(credential),
            GateOutcome::Redirected => {
                let to = navigator.target().unwrap_or_else(|| ENTRY_PATH.to_string());
                return gate_redirect(&to, &toasts.take(), state.secure_cookies);
            }
        }
    } else {
        None
    };

    let document = state.renderer.render(page, credential, &flash);
    let mut response = document_response(document, status);

    if !flash.is_empty() {
        set_cookie(&mut response, &clear_flash_cookie(state.secure_cookies));
    }
    response
}

fn read_flash(headers: &HeaderMap) -> Vec<Notification> {
    match extract_cookie(headers, FLASH_COOKIE_NAME) {
        Ok(Some(value)) => decode_flash(&value),
        Ok(None) => Vec::new(),
        Err(err) => {
            debug!("ignoring unreadable flash cookie: {err}");
            Vec::new()
        }
    }
}

fn gate_redirect(to: &str, notifications: &[Notification], secure: bool) -> Response {
    let mut response = Redirect::to(to).into_response();
    if !notifications.is_empty() {
        set_cookie(&mut response, &flash_cookie(notifications, secure));
    }
    no_store(&mut response);
    response
}

fn document_response(document: Document, status: StatusCode) -> Response {
    let (status, body) = match document {
        Document::Streaming(chunks) => (
            status,
            Body::from_stream(chunks.map(|chunk| Ok::<_, Infallible>(chunk.into_string()))),
        ),
        Document::PageFatal(html) | Document::AppFatal(html) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Body::from(html.into_string()))
        }
    };

    let mut response = (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response();
    no_store(&mut response);
    response
}

fn set_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(err) => error!("failed to build cookie header: {err}"),
    }
}

fn no_store(response: &mut Response) {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
}
