use crate::cli::{actions::session::Session, globals::GlobalArgs};
use crate::property::Snapshot;
use crate::token::TokenState;
use anyhow::{bail, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Report<'a> {
    serial: &'a str,
    app_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<TokenState>,
    properties: Snapshot,
}

/// Prints every property of one token, or of all tokens.
///
/// # Errors
/// Returns an error if the tokens cannot be loaded or `serial` is unknown.
pub fn execute(globals: &GlobalArgs, serial: Option<&str>) -> Result<()> {
    let session = Session::open(globals)?;
    let tokens: Vec<_> = session
        .tokens()
        .iter()
        .filter(|token| serial.map_or(true, |serial| token.serial() == serial))
        .collect();

    if let (Some(serial), true) = (serial, tokens.is_empty()) {
        bail!("token {serial} not found");
    }

    if globals.json {
        let reports: Vec<Report<'_>> = tokens
            .iter()
            .map(|token| Report {
                serial: token.serial(),
                app_name: token.app_name().trim_end(),
                state: token.state().ok(),
                properties: token.properties().all(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for token in tokens {
            println!("{token}");
        }
    }
    Ok(())
}
