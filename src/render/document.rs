//! Whole-document rendering and the two terminal fault handlers.
//!
//! - Page-level fatal: a fault that escaped every container inside the page.
//!   The page content is replaced with a retry panel; the shared layout stays.
//! - Application-level fatal: the layout itself faulted. The whole document is
//!   replaced with a static page that depends on nothing that could fault.

use super::{
    boundary::{Boundary, DefaultFallback, Diagnostics, Fallback},
    escape, guarded, retry_panel,
    section::{slot_id, CancelPolicy, SectionContext, SectionEvent, SectionLoader, SharedSection},
    Component, Fault, Html,
};
use crate::{
    notify::{Notification, NotificationKind, Toasts},
    session::Credential,
};
use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt,
};
use std::sync::Arc;
use tracing::error;
use ulid::Ulid;

pub const PAGE_CONTENT_ID: &str = "page";

/// Shared chrome around every page.
pub trait Layout: Send + Sync {
    /// Markup up to and including the opening of the content area.
    ///
    /// # Errors
    /// A fault here takes down the whole document.
    fn open(&self, title: &str, toasts: &[Notification]) -> Result<Html, Fault>;

    /// Markup closing the content area and the document.
    ///
    /// # Errors
    /// A fault here takes down the whole document.
    fn close(&self) -> Result<Html, Fault>;
}

pub trait Page: Send + Sync {
    fn title(&self) -> &str;

    /// Protected pages run the client auth gate before rendering.
    fn protected(&self) -> bool {
        false
    }

    /// Static page content rendered ahead of the sections.
    ///
    /// # Errors
    /// Contained by the page's failure container.
    fn shell(&self) -> Result<Html, Fault>;

    /// Page-level fallback shown when the shell faults.
    ///
    /// # Errors
    /// A fault here escapes to the page-level fatal handler.
    fn fallback(&self, fault: &Fault) -> Result<Html, Fault> {
        DefaultFallback.render(fault)
    }

    fn sections(&self) -> Vec<SharedSection> {
        Vec::new()
    }
}

pub enum Document {
    /// Shell first, then sections as they resolve.
    Streaming(BoxStream<'static, Html>),
    PageFatal(Html),
    AppFatal(Html),
}

impl Document {
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::PageFatal(_) | Self::AppFatal(_))
    }

    /// Wait for the whole document.
    pub async fn into_html(self) -> String {
        match self {
            Self::Streaming(chunks) => {
                chunks
                    .fold(String::new(), |mut acc, chunk| {
                        acc.push_str(chunk.as_str());
                        future::ready(acc)
                    })
                    .await
            }
            Self::PageFatal(html) | Self::AppFatal(html) => html.into_string(),
        }
    }
}

struct PageShell<'a> {
    page: &'a dyn Page,
}

impl Component for PageShell<'_> {
    fn name(&self) -> &str {
        self.page.title()
    }

    fn render(&self) -> Result<Html, Fault> {
        self.page.shell()
    }
}

struct PageFallback<'a> {
    page: &'a dyn Page,
}

impl Fallback for PageFallback<'_> {
    fn render(&self, fault: &Fault) -> Result<Html, Fault> {
        self.page.fallback(fault)
    }
}

pub struct Renderer {
    layout: Arc<dyn Layout>,
    diagnostics: Arc<dyn Diagnostics>,
    cancel: CancelPolicy,
}

impl Renderer {
    #[must_use]
    pub fn new(
        layout: Arc<dyn Layout>,
        diagnostics: Arc<dyn Diagnostics>,
        cancel: CancelPolicy,
    ) -> Self {
        Self {
            layout,
            diagnostics,
            cancel,
        }
    }

    /// Render `page` inside the layout.
    ///
    /// `credential` must be the one observed by the auth gate for protected
    /// pages; sections use it for their fetches.
    #[must_use]
    pub fn render(
        &self,
        page: &dyn Page,
        credential: Option<Credential>,
        flash: &[Notification],
    ) -> Document {
        let chrome = guarded("layout", || self.layout.open(page.title(), flash))
            .and_then(|open| guarded("layout", || self.layout.close()).map(|close| (open, close)));
        let (open, close) = match chrome {
            Ok(chrome) => chrome,
            Err(fault) => {
                let fault = self.escalate(fault);
                return Document::AppFatal(app_fatal_document(fault.digest.as_deref()));
            }
        };

        let boundary = Boundary::new(PageShell { page }, self.diagnostics.clone())
            .with_fallback(PageFallback { page });
        let shell = match boundary.render() {
            Ok(shell) => shell,
            Err(fault) => {
                let fault = self.escalate(fault);
                let mut html = open;
                html.push(&page_content(&page_fatal_panel(fault.digest.as_deref())));
                html.push(&close);
                return Document::PageFatal(html);
            }
        };

        let mut head = open;
        head.push(&Html::raw(format!(r#"<div id="{PAGE_CONTENT_ID}">"#)));
        head.push(&shell);

        // A faulted shell replaces the whole page content, sections included.
        if !boundary.is_clean() {
            head.push(&Html::raw("</div>"));
            head.push(&close);
            return Document::Streaming(stream::iter([head]).boxed());
        }

        let loader = SectionLoader::new(page.sections(), self.cancel);
        head.push(&loader.placeholders());
        head.push(&Html::raw("</div>"));

        let toasts = Arc::new(Toasts::new());
        let cx = SectionContext {
            credential,
            notifier: toasts.clone(),
            diagnostics: self.diagnostics.clone(),
        };
        let diagnostics = self.diagnostics.clone();
        let mut escalated = false;

        let sections = loader.stream(&cx).filter_map(move |event| {
            let chunk = if escalated {
                None
            } else {
                let mut chunk = match event {
                    SectionEvent::Resolved { index, html, .. } => section_chunk(index, &html),
                    SectionEvent::Escalated { fault, .. } => {
                        escalated = true;
                        let fault = escalate_to(diagnostics.as_ref(), fault);
                        page_fatal_chunk(fault.digest.as_deref())
                    }
                };
                chunk.push(&toast_chunk(&toasts.take()));
                Some(chunk)
            };
            future::ready(chunk)
        });

        Document::Streaming(
            stream::iter([head])
                .chain(sections)
                .chain(stream::iter([close]))
                .boxed(),
        )
    }

    fn escalate(&self, fault: Fault) -> Fault {
        escalate_to(self.diagnostics.as_ref(), fault)
    }
}

fn escalate_to(diagnostics: &dyn Diagnostics, mut fault: Fault) -> Fault {
    if fault.digest.is_none() {
        fault.digest = Some(Ulid::new().to_string());
    }
    error!(origin = %fault.origin, "fault escaped every container");
    diagnostics.report(&fault);
    fault
}

fn page_content(inner: &Html) -> Html {
    Html::raw(format!(r#"<div id="{PAGE_CONTENT_ID}">{inner}</div>"#))
}

fn section_chunk(index: usize, html: &Html) -> Html {
    Html::raw(format!(
        r#"<template data-section-target="{}">{html}</template>"#,
        slot_id(index)
    ))
}

fn page_fatal_chunk(digest: Option<&str>) -> Html {
    Html::raw(format!(
        "<template data-page-fatal>{}</template>",
        page_fatal_panel(digest)
    ))
}

fn toast_chunk(notifications: &[Notification]) -> Html {
    if notifications.is_empty() {
        return Html::default();
    }
    Html::raw(format!(
        "<template data-toasts>{}</template>",
        toast_list(notifications)
    ))
}

/// Toast markup, one element per notification.
#[must_use]
pub fn toast_list(notifications: &[Notification]) -> Html {
    let mut html = Html::default();
    for notification in notifications {
        let role = match notification.kind {
            NotificationKind::Error => "alert",
            NotificationKind::Success => "status",
        };
        html.push(&Html::raw(format!(
            r#"<div class="toast toast-{}" role="{role}">{}</div>"#,
            notification.kind.as_str(),
            escape(&notification.message)
        )));
    }
    html
}

#[must_use]
pub fn page_fatal_panel(digest: Option<&str>) -> Html {
    retry_panel(
        "page-fatal",
        "This page could not be displayed",
        "An unexpected error occurred while loading this page.",
        digest,
    )
}

/// Stand-alone document used when the layout is unusable.
#[must_use]
pub fn app_fatal_document(digest: Option<&str>) -> Html {
    let reference = digest.map_or_else(String::new, |digest| {
        format!("<p>Reference: <code>{}</code></p>", escape(digest))
    });
    Html::raw(format!(
        concat!(
            "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">",
            "<title>Something went wrong</title></head><body><main role=\"alert\">",
            "<h1>Something went wrong</h1>",
            "<p>The application could not be loaded. Please try again.</p>{}",
            "<form method=\"get\"><button type=\"submit\">Try again</button></form>",
            "</main></body></html>"
        ),
        reference
    ))
}
