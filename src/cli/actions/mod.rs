pub mod admin;
pub mod import;
pub mod inspect;
pub mod kernel;
pub mod otp;
pub mod session;

// Single dispatch point for all CLI actions.
mod run;

use crate::cli::globals::GlobalArgs;
use crate::property::TokenStatus;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Import,
    Inspect { serial: Option<String> },
    Generate { serial: String },
    Verify { serial: String, otp: String },
    Reset { serial: String },
    Status { serial: String, status: TokenStatus },
    Kernel { name: Option<String> },
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub fn execute(self, globals: &GlobalArgs) -> anyhow::Result<()> {
        run::execute(self, globals)
    }
}

/// Prints `value` as JSON or through its `Display` implementation.
fn print<T: Serialize + Display>(globals: &GlobalArgs, value: &T) -> anyhow::Result<()> {
    if globals.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}
