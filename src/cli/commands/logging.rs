use crate::cli::telemetry::LogFormat;
use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_FORMAT: &str = "log-format";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("DOCGATE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_FORMAT)
                .long(ARG_LOG_FORMAT)
                .help("Log output: pretty or json")
                .env("DOCGATE_LOG_FORMAT")
                .default_value("pretty")
                .global(true)
                .value_parser(|s: &str| s.parse::<LogFormat>()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_from_env(value: &str) -> Option<u8> {
        temp_env::with_var("DOCGATE_LOG_LEVEL", Some(value), || {
            with_args(Command::new("docgate"))
                .try_get_matches_from(["docgate"])
                .ok()
                .and_then(|m| m.get_one::<u8>(ARG_VERBOSITY).copied())
        })
    }

    #[test]
    fn log_level_accepts_names_and_numbers() {
        assert_eq!(level_from_env("TRACE"), Some(4));
        assert_eq!(level_from_env("debug"), Some(3));
        assert_eq!(level_from_env("1"), Some(1));
        assert_eq!(level_from_env("9"), None);
        assert_eq!(level_from_env("loud"), None);
    }

    #[test]
    fn log_format_defaults_to_pretty() {
        temp_env::with_var("DOCGATE_LOG_FORMAT", None::<&str>, || {
            let matches = with_args(Command::new("docgate")).try_get_matches_from(["docgate"]);
            let format = matches
                .ok()
                .and_then(|m| m.get_one::<LogFormat>(ARG_LOG_FORMAT).copied());
            assert_eq!(format, Some(LogFormat::Pretty));
        });

        temp_env::with_var("DOCGATE_LOG_FORMAT", Some("json"), || {
            let matches = with_args(Command::new("docgate")).try_get_matches_from(["docgate"]);
            let format = matches
                .ok()
                .and_then(|m| m.get_one::<LogFormat>(ARG_LOG_FORMAT).copied());
            assert_eq!(format, Some(LogFormat::Json));
        });
    }
}
