use super::sections::{AdminOverviewSection, DocumentsSection, TemplatesSection, UsageSection};
use crate::{
    client::DocumentsApi,
    render::{document::Page, section::SharedSection, Fault, Html},
};
use std::sync::Arc;

pub struct LandingPage;

impl Page for LandingPage {
    fn title(&self) -> &str {
        "Welcome"
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw(concat!(
            "<h1>Generate documents from your templates</h1>",
            "<p>Sign in to see your documents, usage and templates.</p>",
            "<p><a href=\"/dashboard\">Go to your dashboard</a></p>"
        )))
    }
}

pub struct DashboardPage {
    api: Arc<dyn DocumentsApi>,
}

impl DashboardPage {
    #[must_use]
    pub fn new(api: Arc<dyn DocumentsApi>) -> Self {
        Self { api }
    }
}

impl Page for DashboardPage {
    fn title(&self) -> &str {
        "Dashboard"
    }

    fn protected(&self) -> bool {
        true
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw("<h1>Dashboard</h1>"))
    }

    fn sections(&self) -> Vec<SharedSection> {
        vec![
            Arc::new(DocumentsSection::new(self.api.clone())),
            Arc::new(UsageSection::new(self.api.clone())),
            Arc::new(TemplatesSection::new(self.api.clone())),
        ]
    }
}

pub struct AdminPage {
    api: Arc<dyn DocumentsApi>,
}

impl AdminPage {
    #[must_use]
    pub fn new(api: Arc<dyn DocumentsApi>) -> Self {
        Self { api }
    }
}

impl Page for AdminPage {
    fn title(&self) -> &str {
        "Admin"
    }

    fn protected(&self) -> bool {
        true
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw(
            "<h1>Admin</h1><p><a href=\"/admin/settings\">Settings</a></p>",
        ))
    }

    fn sections(&self) -> Vec<SharedSection> {
        vec![Arc::new(AdminOverviewSection::new(self.api.clone()))]
    }
}

pub struct AdminSettingsPage;

impl Page for AdminSettingsPage {
    fn title(&self) -> &str {
        "Admin settings"
    }

    fn protected(&self) -> bool {
        true
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw(concat!(
            "<h1>Settings</h1>",
            "<p>Service settings are managed by the document service.</p>"
        )))
    }
}

pub struct AdminLoginPage;

impl Page for AdminLoginPage {
    fn title(&self) -> &str {
        "Admin sign in"
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw(concat!(
            "<h1>Admin sign in</h1>",
            "<p>Sign in with an administrator account to continue.</p>"
        )))
    }
}

pub struct PaymentSuccessPage;

impl Page for PaymentSuccessPage {
    fn title(&self) -> &str {
        "Payment received"
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw(concat!(
            "<h1>Payment received</h1>",
            "<p>Thank you. Your plan has been updated.</p>",
            "<p><a href=\"/dashboard\">Back to your dashboard</a></p>"
        )))
    }
}

pub struct PaymentCancelPage;

impl Page for PaymentCancelPage {
    fn title(&self) -> &str {
        "Payment cancelled"
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw(concat!(
            "<h1>Payment cancelled</h1>",
            "<p>No charge was made.</p>",
            "<p><a href=\"/dashboard\">Back to your dashboard</a></p>"
        )))
    }
}

pub struct NotFoundPage;

impl Page for NotFoundPage {
    fn title(&self) -> &str {
        "Not found"
    }

    fn shell(&self) -> Result<Html, Fault> {
        Ok(Html::raw(
            "<h1>Page not found</h1><p><a href=\"/\">Go home</a></p>",
        ))
    }
}
