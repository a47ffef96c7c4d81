use crate::{guard::AdminVerification, render::section::CancelPolicy};
use anyhow::Context;
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};
use url::Url;

pub const ARG_API_ORIGIN: &str = "api-origin";
pub const ARG_ADMIN_VERIFICATION: &str = "admin-verification";
pub const ARG_SECTION_CANCELLATION: &str = "section-cancellation";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

#[derive(Debug)]
pub struct Options {
    pub api_origin: Url,
    pub admin_verification: AdminVerification,
    pub section_cancellation: CancelPolicy,
    pub secure_cookies: bool,
}

impl Options {
    /// Parse frontend options from CLI matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let api_origin = matches
            .get_one::<Url>(ARG_API_ORIGIN)
            .cloned()
            .context("missing required argument: --api-origin")?;

        Ok(Self {
            api_origin,
            admin_verification: matches
                .get_one::<AdminVerification>(ARG_ADMIN_VERIFICATION)
                .copied()
                .unwrap_or_default(),
            section_cancellation: matches
                .get_one::<CancelPolicy>(ARG_SECTION_CANCELLATION)
                .copied()
                .unwrap_or_default(),
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
        })
    }
}

/// Backend origins must be absolute http(s) URLs.
fn parse_api_origin(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err("must be an absolute http(s) URL".to_string()),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_ORIGIN)
                .long(ARG_API_ORIGIN)
                .help("Document service API origin, example: https://api.docgate.dev")
                .env("DOCGATE_API_ORIGIN")
                .required(true)
                .value_parser(parse_api_origin),
        )
        .arg(
            Arg::new(ARG_ADMIN_VERIFICATION)
                .long(ARG_ADMIN_VERIFICATION)
                .help("Admin session check at the edge: enforce or deferred")
                .long_help(
                    "Admin session check at the edge. `enforce` verifies the session with the backend before any admin page renders. `deferred` lets admin requests through and relies on the page-level auth gate only.",
                )
                .env("DOCGATE_ADMIN_VERIFICATION")
                .default_value("enforce")
                .value_parser(|s: &str| s.parse::<AdminVerification>()),
        )
        .arg(
            Arg::new(ARG_SECTION_CANCELLATION)
                .long(ARG_SECTION_CANCELLATION)
                .help("In-flight section loads on disconnect: abandon or abort")
                .env("DOCGATE_SECTION_CANCELLATION")
                .default_value("abandon")
                .value_parser(|s: &str| s.parse::<CancelPolicy>()),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark cookies set by this server as Secure")
                .env("DOCGATE_SECURE_COOKIES")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
