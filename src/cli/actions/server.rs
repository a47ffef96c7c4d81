use crate::{
    cli::telemetry,
    guard::AdminVerification,
    render::section::CancelPolicy,
    web::{self, Settings},
};
use anyhow::Result;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub api_origin: Url,
    pub admin_verification: AdminVerification,
    pub section_cancellation: CancelPolicy,
    pub secure_cookies: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let settings = Settings {
        api_origin: args.api_origin,
        admin_verification: args.admin_verification,
        section_cancellation: args.section_cancellation,
        secure_cookies: args.secure_cookies,
    };

    let result = web::new(args.port, settings).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("api_origin", args.api_origin.to_string()),
        (
            "admin_verification",
            args.admin_verification.as_str().to_string(),
        ),
        (
            "section_cancellation",
            args.section_cancellation.as_str().to_string(),
        ),
        ("secure_cookies", args.secure_cookies.to_string()),
    ];

    let width = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut lines = String::new();
    for (key, value) in &entries {
        lines.push_str(&format!("\n  {key:<width$}  {value}"));
    }
    info!("Startup configuration:{lines}");

    if args.admin_verification == AdminVerification::Deferred {
        tracing::warn!("admin sessions are not verified at the edge (--admin-verification deferred)");
    }
}
