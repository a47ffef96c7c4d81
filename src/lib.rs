//! # Docgate (session-gated rendering front)
//!
//! `docgate` serves the web front of the document generation service: the
//! landing page, the user dashboard, the admin console and the payment
//! landing pages. Pages are rendered on the server and their sections are
//! streamed to the browser as they resolve.
//!
//! ## Rendering pipeline
//!
//! Every navigation request goes through the same layers, outermost first:
//!
//! 1. **Route guard** ([`guard`]): edge middleware that classifies the path and
//!    allows or redirects before any handler runs.
//! 2. **Client auth gate** ([`gate`]): runs once per page mount on protected
//!    pages. Without a credential the user is notified and sent to `/`, and no
//!    protected data is fetched.
//! 3. **Section loader** ([`render::section`]): each page section fetches on its
//!    own schedule behind its own fallback. One slow or failing section never
//!    blocks its siblings.
//! 4. **Failure containers** ([`render::boundary`]): supervisor nodes around
//!    sections and page shells. A render fault is replaced by a fallback panel
//!    and reported exactly once.
//! 5. **Fatal handlers** ([`render::document`]): a fault escaping every
//!    container replaces the page content; a fault in the shared layout
//!    replaces the whole document with a static retry page.
//!
//! Recovery is always an explicit user retry, never an automatic loop.

pub mod cli;
pub mod client;
pub mod gate;
pub mod guard;
pub mod headers;
pub mod notify;
pub mod render;
pub mod session;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
