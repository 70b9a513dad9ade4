pub mod engine;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_SERIAL: &str = "serial";
pub const ARG_OTP: &str = "otp";
pub const ARG_STATUS: &str = "status";
pub const ARG_NAME: &str = "name";
pub const ARG_JSON: &str = "json";

fn serial(required: bool) -> Arg {
    Arg::new(ARG_SERIAL)
        .long(ARG_SERIAL)
        .help("Token serial number")
        .required(required)
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("otpctl")
        .about("OTP token administration")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_JSON)
                .long(ARG_JSON)
                .help("Print results as JSON")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("import").about("Import a batch file and list its tokens"))
        .subcommand(
            Command::new("inspect")
                .about("Show token properties")
                .arg(serial(false)),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate the current OTP of a token")
                .arg(serial(true)),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify an OTP")
                .arg(serial(true))
                .arg(
                    Arg::new(ARG_OTP)
                        .help("Candidate OTP, PIN prefix included")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("reset")
                .about("Clear the error counter and time shift of a token")
                .arg(serial(true)),
        )
        .subcommand(
            Command::new("status")
                .about("Change which of the primary and backup tokens are active")
                .arg(serial(true))
                .arg(
                    Arg::new(ARG_STATUS)
                        .help("New status")
                        .required(true)
                        .value_parser(["disabled", "primary_only", "backup_only", "enabled"]),
                ),
        )
        .subcommand(
            Command::new("kernel")
                .about("Show kernel parameters")
                .arg(Arg::new(ARG_NAME).help("Single parameter to show")),
        );

    let command = engine::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "otpctl");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("OTP token administration".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_verify_arguments() {
        let matches = new().get_matches_from(vec![
            "otpctl",
            "--batch",
            "tokens.json",
            "verify",
            "--serial",
            "0097123456",
            "123456",
        ]);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "verify");
        assert_eq!(
            sub.get_one::<String>(ARG_SERIAL).map(String::as_str),
            Some("0097123456")
        );
        assert_eq!(sub.get_one::<String>(ARG_OTP).map(String::as_str), Some("123456"));
    }

    #[test]
    fn test_status_values() {
        let result = new().try_get_matches_from(vec![
            "otpctl", "--batch", "t.json", "status", "--serial", "1", "paused",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("OTPCTL_LOG_LEVEL", Some(level)),
                    ("OTPCTL_BATCH", Some("tokens.json")),
                ],
                || {
                    let matches = new().get_matches_from(vec!["otpctl", "kernel"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5usize {
            temp_env::with_vars([("OTPCTL_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["otpctl".to_string(), "kernel".to_string()];
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(index as u8)
                );
            });
        }
    }
}
