//! Maps validated CLI arguments to the action to run.

use crate::cli::{
    actions::{server::Args, Action},
    commands::frontend,
};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let frontend = frontend::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        api_origin: frontend.api_origin,
        admin_verification: frontend.admin_verification,
        section_cancellation: frontend.section_cancellation,
        secure_cookies: frontend.secure_cookies,
    }))
}
