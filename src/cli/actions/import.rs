use crate::cli::{actions::session::Session, globals::GlobalArgs};
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Imported<'a> {
    serial: &'a str,
    app_name: &'a str,
}

/// Imports the batch file, saves the records and lists the tokens.
///
/// # Errors
/// Returns an error if the import or the state file write fails.
pub fn execute(globals: &GlobalArgs) -> Result<()> {
    let session = Session::import(globals)?;
    session.save()?;

    let imported: Vec<Imported<'_>> = session
        .tokens()
        .iter()
        .map(|token| Imported {
            serial: token.serial(),
            app_name: token.app_name().trim_end(),
        })
        .collect();

    if globals.json {
        println!("{}", serde_json::to_string_pretty(&imported)?);
    } else {
        for token in &imported {
            println!("{}\t{}", token.serial, token.app_name);
        }
    }
    Ok(())
}
