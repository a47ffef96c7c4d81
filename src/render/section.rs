//! Independently loading page sections.
//!
//! The page shell goes out first with one fallback per section, in declaration
//! order. Sections then resolve in whatever order their fetches complete. Each
//! section owns its fetch and its empty/error/populated views; the loader only
//! provides the fallback scaffolding and a failure container per section.

use super::{
    boundary::{Boundary, Diagnostics},
    escape, Component, Fault, Html,
};
use crate::{
    notify::{NotificationKind, Notifier},
    session::Credential,
};
use async_trait::async_trait;
use futures::{
    future::BoxFuture,
    stream::{BoxStream, FuturesUnordered},
    FutureExt, StreamExt,
};
use std::{fmt, panic::AssertUnwindSafe, str::FromStr, sync::Arc};
use tracing::{debug, warn};

/// What happens to in-flight section loads when the response goes away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CancelPolicy {
    /// Loads run to completion in the background; their results are dropped.
    #[default]
    Abandon,
    /// Loads are dropped together with the response.
    Abort,
}

impl CancelPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abandon => "abandon",
            Self::Abort => "abort",
        }
    }
}

impl FromStr for CancelPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "abandon" => Ok(Self::Abandon),
            "abort" => Ok(Self::Abort),
            other => Err(format!("invalid cancellation policy: {other}")),
        }
    }
}

/// Render state of one section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionState<T> {
    Loading,
    Error(String),
    Ready(T),
}

impl<T> SectionState<T> {
    /// Convert a fetch result into section state. A failure raises one error
    /// notification and stays local to the section.
    pub fn from_fetch<E: fmt::Display>(
        result: Result<T, E>,
        notifier: &dyn Notifier,
        message: &str,
    ) -> Self {
        match result {
            Ok(data) => Self::Ready(data),
            Err(err) => {
                warn!(error = %err, "section fetch failed");
                notifier.notify(NotificationKind::Error, message);
                Self::Error(err.to_string())
            }
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Everything a section may use while loading.
#[derive(Clone)]
pub struct SectionContext {
    pub credential: Option<Credential>,
    pub notifier: Arc<dyn Notifier>,
    pub diagnostics: Arc<dyn Diagnostics>,
}

#[async_trait]
pub trait Section: Send + Sync + 'static {
    type Data: Send + Sync;

    fn name(&self) -> &str;

    fn fallback(&self) -> Html {
        loading_indicator(Section::name(self))
    }

    /// Fetch the section data. Collaborator failures must come back as
    /// [`SectionState::Error`], never as a panic.
    async fn load(&self, cx: &SectionContext) -> SectionState<Self::Data>;

    /// # Errors
    /// A render fault, contained by the section's own failure container.
    fn view(&self, state: &SectionState<Self::Data>) -> Result<Html, Fault>;
}

/// Object-safe face of [`Section`].
#[async_trait]
pub trait Loadable: Send + Sync {
    fn name(&self) -> &str;

    fn fallback(&self) -> Html;

    /// Load, then render inside a failure container.
    ///
    /// # Errors
    /// Only when the container's fallback itself faults.
    async fn resolve(&self, cx: &SectionContext) -> Result<Html, Fault>;
}

struct SectionView<'a, S: Section> {
    section: &'a S,
    state: SectionState<S::Data>,
}

impl<S: Section> Component for SectionView<'_, S> {
    fn name(&self) -> &str {
        Section::name(self.section)
    }

    fn render(&self) -> Result<Html, Fault> {
        self.section.view(&self.state)
    }
}

#[async_trait]
impl<S: Section> Loadable for S {
    fn name(&self) -> &str {
        Section::name(self)
    }

    fn fallback(&self) -> Html {
        Section::fallback(self)
    }

    async fn resolve(&self, cx: &SectionContext) -> Result<Html, Fault> {
        let state = self.load(cx).await;
        debug!(section = Section::name(self), ready = state.is_ready(), "section loaded");
        let view = SectionView {
            section: self,
            state,
        };
        Boundary::new(view, cx.diagnostics.clone()).render()
    }
}

pub type SharedSection = Arc<dyn Loadable>;

#[derive(Debug)]
pub enum SectionEvent {
    Resolved {
        index: usize,
        name: String,
        html: Html,
    },
    /// The section's fault escaped its own container.
    Escalated { index: usize, fault: Fault },
}

pub struct SectionLoader {
    sections: Vec<SharedSection>,
    cancel: CancelPolicy,
}

impl SectionLoader {
    #[must_use]
    pub fn new(sections: Vec<SharedSection>, cancel: CancelPolicy) -> Self {
        Self { sections, cancel }
    }

    /// One slot per section, holding its fallback, in declaration order.
    #[must_use]
    pub fn placeholders(&self) -> Html {
        let mut html = Html::default();
        if self.sections.is_empty() {
            return html;
        }
        html.push(&Html::raw(r#"<div class="sections">"#));
        for (index, section) in self.sections.iter().enumerate() {
            html.push(&Html::raw(format!(
                r#"<div class="section" id="{}" data-section-name="{}">"#,
                slot_id(index),
                escape(section.name())
            )));
            html.push(&section.fallback());
            html.push(&Html::raw("</div>"));
        }
        html.push(&Html::raw("</div>"));
        html
    }

    /// Resolve every section, yielding each as soon as it is ready.
    #[must_use]
    pub fn stream(&self, cx: &SectionContext) -> BoxStream<'static, SectionEvent> {
        let pending: FuturesUnordered<BoxFuture<'static, SectionEvent>> = self
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let section = Arc::clone(section);
                let cx = cx.clone();
                match self.cancel {
                    CancelPolicy::Abort => resolve_event(index, section, cx).boxed(),
                    CancelPolicy::Abandon => {
                        let name = section.name().to_string();
                        let handle = tokio::spawn(resolve_event(index, section, cx));
                        async move {
                            match handle.await {
                                Ok(event) => event,
                                Err(err) => SectionEvent::Escalated {
                                    index,
                                    fault: Fault::new(name, format!("section task failed: {err}")),
                                },
                            }
                        }
                        .boxed()
                    }
                }
            })
            .collect();

        pending.boxed()
    }
}

async fn resolve_event(index: usize, section: SharedSection, cx: SectionContext) -> SectionEvent {
    let name = section.name().to_string();
    match AssertUnwindSafe(section.resolve(&cx)).catch_unwind().await {
        Ok(Ok(html)) => SectionEvent::Resolved { index, name, html },
        Ok(Err(fault)) => SectionEvent::Escalated { index, fault },
        Err(payload) => SectionEvent::Escalated {
            index,
            fault: Fault::from_panic(&name, payload.as_ref()),
        },
    }
}

#[must_use]
pub fn slot_id(index: usize) -> String {
    format!("section-{index}")
}

/// Default fallback: a spinner.
#[must_use]
pub fn loading_indicator(name: &str) -> Html {
    Html::raw(format!(
        r#"<div class="spinner" role="status" aria-live="polite" aria-label="Loading {}"></div>"#,
        escape(name)
    ))
}

/// Inline error state for a section whose fetch failed.
#[must_use]
pub fn inline_error(message: &str) -> Html {
    Html::raw(format!(
        r#"<div class="section-error" role="alert">{}</div>"#,
        escape(message)
    ))
}
