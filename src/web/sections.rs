//! Dashboard and admin sections backed by the document service API.

use crate::{
    client::{AdminOverview, ApiError, Document, DocumentsApi, Template, Usage},
    render::{
        escape,
        section::{inline_error, loading_indicator, Section, SectionContext, SectionState},
        Fault, Html,
    },
    session::Credential,
};
use async_trait::async_trait;
use std::{fmt::Write, future::Future, sync::Arc};

/// Fetch with the gate's credential. Without one nothing is fetched.
async fn fetch<'a, T, F, Fut>(
    cx: &'a SectionContext,
    message: &str,
    call: F,
) -> SectionState<T>
where
    F: FnOnce(&'a Credential) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match cx.credential.as_ref() {
        Some(credential) => {
            SectionState::from_fetch(call(credential).await, cx.notifier.as_ref(), message)
        }
        None => SectionState::Error("not signed in".to_string()),
    }
}

fn card(title: &str, body: &str) -> Html {
    Html::raw(format!("<h2>{}</h2>{body}", escape(title)))
}

pub struct DocumentsSection {
    api: Arc<dyn DocumentsApi>,
}

impl DocumentsSection {
    #[must_use]
    pub fn new(api: Arc<dyn DocumentsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Section for DocumentsSection {
    type Data = Vec<Document>;

    fn name(&self) -> &str {
        "documents"
    }

    async fn load(&self, cx: &SectionContext) -> SectionState<Vec<Document>> {
        fetch(cx, "Could not load your documents", |c| self.api.documents(c)).await
    }

    fn view(&self, state: &SectionState<Vec<Document>>) -> Result<Html, Fault> {
        Ok(match state {
            SectionState::Loading => loading_indicator("documents"),
            SectionState::Error(_) => inline_error("Your documents are unavailable right now."),
            SectionState::Ready(docs) if docs.is_empty() => {
                card("Documents", "<p class=\"empty\">No documents yet.</p>")
            }
            SectionState::Ready(docs) => {
                let mut list = String::from("<ul class=\"documents\">");
                for doc in docs {
                    let _ = write!(
                        list,
                        "<li data-id=\"{}\"><span class=\"title\">{}</span> <span class=\"status\">{}</span></li>",
                        escape(&doc.id),
                        escape(&doc.title),
                        escape(&doc.status)
                    );
                }
                list.push_str("</ul>");
                card("Documents", &list)
            }
        })
    }
}

pub struct UsageSection {
    api: Arc<dyn DocumentsApi>,
}

impl UsageSection {
    #[must_use]
    pub fn new(api: Arc<dyn DocumentsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Section for UsageSection {
    type Data = Usage;

    fn name(&self) -> &str {
        "usage"
    }

    async fn load(&self, cx: &SectionContext) -> SectionState<Usage> {
        fetch(cx, "Could not load your usage", |c| self.api.usage(c)).await
    }

    fn view(&self, state: &SectionState<Usage>) -> Result<Html, Fault> {
        Ok(match state {
            SectionState::Loading => loading_indicator("usage"),
            SectionState::Error(_) => inline_error("Usage is unavailable right now."),
            SectionState::Ready(usage) => card(
                "Usage",
                &format!(
                    "<p><span class=\"plan\">{}</span> plan: {} of {} documents generated, {} remaining.</p>",
                    escape(&usage.plan),
                    usage.documents_generated,
                    usage.quota,
                    usage.remaining()
                ),
            ),
        })
    }
}

pub struct TemplatesSection {
    api: Arc<dyn DocumentsApi>,
}

impl TemplatesSection {
    #[must_use]
    pub fn new(api: Arc<dyn DocumentsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Section for TemplatesSection {
    type Data = Vec<Template>;

    fn name(&self) -> &str {
        "templates"
    }

    async fn load(&self, cx: &SectionContext) -> SectionState<Vec<Template>> {
        fetch(cx, "Could not load templates", |c| self.api.templates(c)).await
    }

    fn view(&self, state: &SectionState<Vec<Template>>) -> Result<Html, Fault> {
        Ok(match state {
            SectionState::Loading => loading_indicator("templates"),
            SectionState::Error(_) => inline_error("Templates are unavailable right now."),
            SectionState::Ready(templates) if templates.is_empty() => {
                card("Templates", "<p class=\"empty\">No templates available.</p>")
            }
            SectionState::Ready(templates) => {
                let mut list = String::from("<ul class=\"templates\">");
                for template in templates {
                    let description = template
                        .description
                        .as_deref()
                        .map(|d| format!(" <small>{}</small>", escape(d)))
                        .unwrap_or_default();
                    let _ = write!(
                        list,
                        "<li data-id=\"{}\">{}{description}</li>",
                        escape(&template.id),
                        escape(&template.name)
                    );
                }
                list.push_str("</ul>");
                card("Templates", &list)
            }
        })
    }
}

pub struct AdminOverviewSection {
    api: Arc<dyn DocumentsApi>,
}

impl AdminOverviewSection {
    #[must_use]
    pub fn new(api: Arc<dyn DocumentsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Section for AdminOverviewSection {
    type Data = AdminOverview;

    fn name(&self) -> &str {
        "overview"
    }

    async fn load(&self, cx: &SectionContext) -> SectionState<AdminOverview> {
        fetch(cx, "Could not load the admin overview", |c| {
            self.api.admin_overview(c)
        })
        .await
    }

    fn view(&self, state: &SectionState<AdminOverview>) -> Result<Html, Fault> {
        Ok(match state {
            SectionState::Loading => loading_indicator("overview"),
            SectionState::Error(_) => inline_error("The overview is unavailable right now."),
            SectionState::Ready(overview) => card(
                "Overview",
                &format!(
                    "<dl><dt>Users</dt><dd>{}</dd><dt>Documents</dt><dd>{}</dd><dt>Failed jobs</dt><dd>{}</dd></dl>",
                    overview.users, overview.documents, overview.failed_jobs
                ),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{notify::Toasts, render::boundary::DiagnosticsLog};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DocumentsApi for FakeApi {
        async fn documents(&self, _: &Credential) -> Result<Vec<Document>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Http {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(vec![Document {
                id: "d1".to_string(),
                title: "Q3 <report>".to_string(),
                status: "ready".to_string(),
                created_at: None,
            }])
        }

        async fn usage(&self, _: &Credential) -> Result<Usage, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Usage {
                plan: "pro".to_string(),
                documents_generated: 3,
                quota: 10,
            })
        }

        async fn templates(&self, _: &Credential) -> Result<Vec<Template>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn admin_overview(&self, _: &Credential) -> Result<AdminOverview, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AdminOverview {
                users: 2,
                documents: 5,
                failed_jobs: 0,
            })
        }
    }

    fn context(token: Option<&str>) -> (SectionContext, Arc<Toasts>) {
        let toasts = Arc::new(Toasts::new());
        let cx = SectionContext {
            credential: token.and_then(Credential::new),
            notifier: toasts.clone(),
            diagnostics: Arc::new(DiagnosticsLog::new()),
        };
        (cx, toasts)
    }

    #[tokio::test]
    async fn documents_render_escaped() {
        let api = Arc::new(FakeApi::default());
        let section = DocumentsSection::new(api);
        let (cx, toasts) = context(Some("tok"));

        let state = section.load(&cx).await;
        let html = section.view(&state).map(Html::into_string).unwrap_or_default();
        assert!(html.contains("Q3 &lt;report&gt;"));
        assert!(toasts.snapshot().is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_renders_inline_error_and_notifies() {
        let api = Arc::new(FakeApi {
            fail: true,
            ..FakeApi::default()
        });
        let section = DocumentsSection::new(api);
        let (cx, toasts) = context(Some("tok"));

        let state = section.load(&cx).await;
        assert!(matches!(state, SectionState::Error(_)));
        let html = section.view(&state).map(Html::into_string).unwrap_or_default();
        assert!(html.contains("section-error"));
        assert_eq!(toasts.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn no_credential_means_no_fetch() {
        let api = Arc::new(FakeApi::default());
        let (cx, toasts) = context(None);

        let documents = DocumentsSection::new(api.clone()).load(&cx).await;
        let overview = AdminOverviewSection::new(api.clone()).load(&cx).await;

        assert!(matches!(documents, SectionState::Error(_)));
        assert!(matches!(overview, SectionState::Error(_)));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert!(toasts.snapshot().is_empty());
    }

    #[tokio::test]
    async fn empty_and_populated_views() {
        let api = Arc::new(FakeApi::default());
        let (cx, _) = context(Some("tok"));

        let templates = TemplatesSection::new(api.clone());
        let state = templates.load(&cx).await;
        let html = templates.view(&state).map(Html::into_string).unwrap_or_default();
        assert!(html.contains("No templates available."));

        let usage = UsageSection::new(api);
        let state = usage.load(&cx).await;
        let html = usage.view(&state).map(Html::into_string).unwrap_or_default();
        assert!(html.contains("3 of 10 documents generated, 7 remaining"));
    }
}
