//! Static assets. No inline scripts or styles anywhere, so the CSP can stay
//! strict.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Moves streamed `<template>` chunks into their slots as the parser reaches
/// them. A template is swapped once the parser has moved past it.
pub const SECTIONS_JS: &str = r#"(function () {
  "use strict";

  function place(id, template, append) {
    var target = document.getElementById(id);
    if (!target) return;
    var content = template.content.cloneNode(true);
    if (append) {
      target.appendChild(content);
    } else {
      target.replaceChildren(content);
    }
  }

  function swap(template) {
    var slot = template.getAttribute("data-section-target");
    if (slot) {
      place(slot, template, false);
    } else if (template.hasAttribute("data-page-fatal")) {
      place("page", template, false);
    } else if (template.hasAttribute("data-toasts")) {
      place("toasts", template, true);
    } else {
      return;
    }
    template.remove();
  }

  function sweep(all) {
    var pending = document.querySelectorAll(
      "template[data-section-target], template[data-page-fatal], template[data-toasts]"
    );
    for (var i = 0; i < pending.length; i++) {
      if (all || pending[i].nextSibling) swap(pending[i]);
    }
  }

  new MutationObserver(function () {
    sweep(false);
  }).observe(document.documentElement, { childList: true, subtree: true });

  document.addEventListener("DOMContentLoaded", function () {
    sweep(true);
  });
})();
"#;

pub const APP_CSS: &str = r#"body { font-family: system-ui, sans-serif; margin: 0; color: #1f2933; }
header, main, footer { padding: 1rem 2rem; }
nav a { margin-right: 1rem; }
.toasts { position: fixed; top: 1rem; right: 1rem; }
.toast { padding: .5rem 1rem; margin-bottom: .5rem; border-radius: 4px; }
.toast-error { background: #fde8e8; color: #9b1c1c; }
.toast-success { background: #def7ec; color: #03543f; }
.sections { display: grid; gap: 1rem; grid-template-columns: repeat(auto-fit, minmax(16rem, 1fr)); }
.section { border: 1px solid #e4e7eb; border-radius: 4px; padding: 1rem; min-height: 4rem; }
.spinner { width: 1.5rem; height: 1.5rem; border: 3px solid #cbd2d9; border-top-color: #3e4c59; border-radius: 50%; animation: spin 1s linear infinite; }
.section-error, .fallback, .page-fatal { color: #9b1c1c; }
@keyframes spin { to { transform: rotate(360deg); } }
"#;

pub async fn sections_js() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        SECTIONS_JS,
    )
}

pub async fn app_css() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        APP_CSS,
    )
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
