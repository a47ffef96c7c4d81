//! Server-side render tree.
//!
//! Components render to [`Html`] or fail with a [`Fault`]. Faults are
//! contained by [`boundary::Boundary`] supervisors; whatever escapes all of
//! them reaches the fatal handlers in [`document`].

pub mod boundary;
pub mod document;
pub mod section;

use std::{
    any::Any,
    fmt::{self, Write},
    panic::{self, AssertUnwindSafe},
};
use thiserror::Error;

/// Rendered markup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Html(String);

impl Html {
    /// Markup that is already safe to emit.
    #[must_use]
    pub fn raw(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// Text content, escaped.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self(escape(text))
    }

    pub fn push(&mut self, other: &Self) {
        self.0.push_str(&other.0);
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape text for HTML content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// A rendering-time fault.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{origin}: {message}")]
pub struct Fault {
    pub origin: String,
    pub message: String,
    /// Name of the container that caught the fault, set when it trips.
    pub boundary: Option<String>,
    /// Correlates the panel a user sees with the logged report.
    pub digest: Option<String>,
}

impl Fault {
    #[must_use]
    pub fn new(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            message: message.into(),
            boundary: None,
            digest: None,
        }
    }

    pub(crate) fn from_panic(origin: &str, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic during render".to_string());
        Self::new(origin, message)
    }
}

pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    /// Returns the fault that stopped this subtree from rendering.
    fn render(&self) -> Result<Html, Fault>;
}

/// Closure-backed component.
pub struct FnComponent<F> {
    name: String,
    render: F,
}

impl<F> FnComponent<F>
where
    F: Fn() -> Result<Html, Fault> + Send + Sync,
{
    pub fn new(name: impl Into<String>, render: F) -> Self {
        Self {
            name: name.into(),
            render,
        }
    }
}

impl<F> Component for FnComponent<F>
where
    F: Fn() -> Result<Html, Fault> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> Result<Html, Fault> {
        (self.render)()
    }
}

/// Render a component, turning a panic into a fault of that component.
pub(crate) fn render_guarded<C: Component + ?Sized>(component: &C) -> Result<Html, Fault> {
    guarded(component.name(), || component.render())
}

pub(crate) fn guarded<F>(origin: &str, render: F) -> Result<Html, Fault>
where
    F: FnOnce() -> Result<Html, Fault>,
{
    match panic::catch_unwind(AssertUnwindSafe(render)) {
        Ok(result) => result,
        Err(payload) => Err(Fault::from_panic(origin, payload.as_ref())),
    }
}

/// Small panel with a heading, a message and a retry form.
///
/// The form has no action, so submitting it re-requests the current URL.
#[must_use]
pub fn retry_panel(class: &str, title: &str, message: &str, digest: Option<&str>) -> Html {
    let mut markup = format!(
        r#"<section class="{}" role="alert"><h2>{}</h2><p>{}</p>"#,
        escape(class),
        escape(title),
        escape(message)
    );
    if let Some(digest) = digest {
        let _ = write!(
            markup,
            r#"<p class="digest">Reference: <code>{}</code></p>"#,
            escape(digest)
        );
    }
    markup.push_str(r#"<form method="get"><button type="submit">Try again</button></form></section>"#);
    Html::raw(markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
        assert_eq!(Html::text("1 < 2").as_str(), "1 &lt; 2");
    }

    #[test]
    fn html_push_concatenates() {
        let mut html = Html::raw("<p>");
        html.push(&Html::text("hi"));
        html.push(&Html::raw("</p>"));
        assert_eq!(html.to_string(), "<p>hi</p>");
    }

    #[test]
    fn guarded_render_turns_panics_into_faults() {
        let component = FnComponent::new("chart", || -> Result<Html, Fault> {
            panic!("axis out of range")
        });
        let fault = render_guarded(&component).err();
        assert_eq!(
            fault,
            Some(Fault::new("chart", "axis out of range"))
        );
    }

    #[test]
    fn guarded_render_passes_results_through() {
        let ok = FnComponent::new("ok", || Ok(Html::raw("<b>ok</b>")));
        assert_eq!(render_guarded(&ok).ok(), Some(Html::raw("<b>ok</b>")));

        let err = FnComponent::new("err", || Err(Fault::new("err", "nope")));
        assert_eq!(render_guarded(&err).err().map(|f| f.message), Some("nope".to_string()));
    }

    #[test]
    fn retry_panel_includes_digest_and_form() {
        let panel = retry_panel("fallback", "Oops", "<bad>", Some("01J"));
        assert!(panel.as_str().contains("&lt;bad&gt;"));
        assert!(panel.as_str().contains("<code>01J</code>"));
        assert!(panel.as_str().contains(r#"<form method="get">"#));
    }
}
