use crate::{
    notify::Notification,
    render::{
        document::{toast_list, Layout},
        escape, Fault, Html,
    },
};

/// Site chrome: head, navigation, toast region and footer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppLayout;

impl Layout for AppLayout {
    fn open(&self, title: &str, toasts: &[Notification]) -> Result<Html, Fault> {
        Ok(Html::raw(format!(
            concat!(
                "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">",
                "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
                "<title>{title} | Docgate</title>",
                "<link rel=\"stylesheet\" href=\"/assets/app.css\">",
                "<script src=\"/assets/sections.js\"></script>",
                "</head><body>",
                "<header><nav><a href=\"/\">Home</a><a href=\"/dashboard\">Dashboard</a>",
                "<a href=\"/admin\">Admin</a></nav></header>",
                "<div class=\"toasts\" id=\"toasts\" aria-live=\"polite\">{toasts}</div>",
                "<main>"
            ),
            title = escape(title),
            toasts = toast_list(toasts),
        )))
    }

    fn close(&self) -> Result<Html, Fault> {
        Ok(Html::raw(format!(
            "</main><footer><small>{} {}</small></footer></body></html>",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;

    #[test]
    fn open_escapes_title_and_renders_toasts() {
        let html = AppLayout
            .open(
                "<Dashboard>",
                &[Notification {
                    kind: NotificationKind::Error,
                    message: "Please sign in to view documents".to_string(),
                }],
            )
            .map(Html::into_string)
            .unwrap_or_default();

        assert!(html.contains("<title>&lt;Dashboard&gt; | Docgate</title>"));
        assert!(html.contains("Please sign in to view documents"));
        assert!(html.contains(r#"<script src="/assets/sections.js"></script>"#));
        assert!(html.ends_with("<main>"));
    }

    #[test]
    fn close_ends_the_document() {
        let html = AppLayout.close().map(Html::into_string).unwrap_or_default();
        assert!(html.starts_with("</main>"));
        assert!(html.ends_with("</html>"));
    }
}
