//! Arguments locating tokens and configuring the engine.

use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};
use regex::Regex;
use secrecy::SecretString;
use std::{path::PathBuf, sync::OnceLock};

pub const ARG_BATCH: &str = "batch";
pub const ARG_TRANSPORT_KEY: &str = "transport-key";
pub const ARG_STATE: &str = "state";
pub const ARG_KERNEL: &str = "kernel";

fn override_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9]*)\s*=\s*(-?[0-9]+)\s*$").ok())
        .as_ref()
}

/// Parses a `NAME=VALUE` kernel parameter override.
#[must_use]
pub fn validator_kernel_override() -> ValueParser {
    ValueParser::from(
        move |raw: &str| -> std::result::Result<(String, i32), String> {
            let captures = override_pattern()
                .and_then(|pattern| pattern.captures(raw))
                .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
            let value = captures[2]
                .parse::<i32>()
                .map_err(|_| format!("{} is not a 32-bit integer", &captures[2]))?;
            Ok((captures[1].to_string(), value))
        },
    )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub batch: Option<PathBuf>,
    pub transport_key: SecretString,
    pub state: Option<PathBuf>,
    pub kernel: Vec<(String, i32)>,
}

impl Options {
    /// Parse engine arguments from matches.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let batch = matches.get_one::<PathBuf>(ARG_BATCH).cloned();
        let state = matches.get_one::<PathBuf>(ARG_STATE).cloned();

        let transport_key = matches
            .get_one::<String>(ARG_TRANSPORT_KEY)
            .cloned()
            .unwrap_or_default();

        Self {
            batch,
            transport_key: SecretString::from(transport_key),
            state,
            kernel: matches
                .get_many::<(String, i32)>(ARG_KERNEL)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BATCH)
                .short('b')
                .long(ARG_BATCH)
                .help("Token batch file to import")
                .env("OTPCTL_BATCH")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_TRANSPORT_KEY)
                .short('k')
                .long(ARG_TRANSPORT_KEY)
                .help("Transport key protecting the batch file")
                .env("OTPCTL_TRANSPORT_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE)
                .short('s')
                .long(ARG_STATE)
                .help("JSON file holding token records between runs")
                .long_help(
                    "JSON file holding token records between runs.\n\nWhen the file exists tokens are loaded from it instead of the batch file, and every command that changes a token writes the records back.",
                )
                .env("OTPCTL_STATE")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_KERNEL)
                .long(ARG_KERNEL)
                .help("Kernel parameter override, NAME=VALUE (repeatable)")
                .env("OTPCTL_KERNEL")
                .global(true)
                .action(ArgAction::Append)
                .value_delimiter(',')
                .value_parser(validator_kernel_override()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> std::result::Result<(String, i32), String> {
        let command = with_args(Command::new("test"));
        command
            .try_get_matches_from(["test", "--batch", "b.json", "--kernel", raw])
            .map_err(|err| err.to_string())
            .map(|matches| {
                matches
                    .get_one::<(String, i32)>(ARG_KERNEL)
                    .cloned()
                    .unwrap()
            })
    }

    #[test]
    fn kernel_overrides() {
        assert_eq!(parse("ITimeWindow=60"), Ok(("ITimeWindow".to_string(), 60)));
        assert_eq!(parse(" GMTAdjust = -3600 "), Ok(("GMTAdjust".to_string(), -3600)));
        assert!(parse("ITimeWindow").is_err());
        assert!(parse("=5").is_err());
        assert!(parse("ITimeWindow=ten").is_err());
        assert!(parse("ITimeWindow=4294967296").is_err());
    }

    #[test]
    fn batch_and_state_are_optional() {
        temp_env::with_vars(
            [("OTPCTL_BATCH", None::<&str>), ("OTPCTL_STATE", None::<&str>)],
            || {
                let matches = with_args(Command::new("test")).get_matches_from(["test"]);
                let options = Options::parse(&matches);
                assert!(options.batch.is_none());
                assert!(options.state.is_none());
            },
        );
    }

    #[test]
    fn kernel_overrides_from_env() {
        temp_env::with_vars(
            [
                ("OTPCTL_BATCH", Some("tokens.json")),
                ("OTPCTL_KERNEL", Some("IThreshold=5,EventWindow=20")),
                ("OTPCTL_TRANSPORT_KEY", Some("secret")),
            ],
            || {
                let matches = with_args(Command::new("test")).get_matches_from(["test"]);
                let options = Options::parse(&matches);
                assert_eq!(options.batch, Some(PathBuf::from("tokens.json")));
                assert_eq!(
                    options.kernel,
                    [("IThreshold".to_string(), 5), ("EventWindow".to_string(), 20)]
                );
                assert_eq!(
                    secrecy::ExposeSecret::expose_secret(&options.transport_key),
                    "secret"
                );
            },
        );
    }
}
