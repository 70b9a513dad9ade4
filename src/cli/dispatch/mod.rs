//! Maps validated CLI arguments to an action and the options it runs with.

use crate::cli::actions::Action;
use crate::cli::commands::{self, engine};
use crate::cli::globals::GlobalArgs;
use crate::property::TokenStatus;
use anyhow::{anyhow, Context, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let globals = GlobalArgs::new(
        engine::Options::parse(matches),
        matches.get_flag(commands::ARG_JSON),
    );

    let (name, sub) = matches.subcommand().context("missing subcommand")?;

    let serial = || {
        sub.get_one::<String>(commands::ARG_SERIAL)
            .cloned()
            .context("missing required argument: --serial")
    };

    let action = match name {
        "import" => Action::Import,
        "inspect" => Action::Inspect {
            serial: sub.get_one::<String>(commands::ARG_SERIAL).cloned(),
        },
        "generate" => Action::Generate { serial: serial()? },
        "verify" => Action::Verify {
            serial: serial()?,
            otp: sub
                .get_one::<String>(commands::ARG_OTP)
                .cloned()
                .context("missing required argument: <otp>")?,
        },
        "reset" => Action::Reset { serial: serial()? },
        "status" => Action::Status {
            serial: serial()?,
            status: sub
                .get_one::<String>(commands::ARG_STATUS)
                .context("missing required argument: <status>")?
                .parse::<TokenStatus>()
                .map_err(|e| anyhow!(e))?,
        },
        "kernel" => Action::Kernel {
            name: sub.get_one::<String>(commands::ARG_NAME).cloned(),
        },
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok((action, globals))
}
