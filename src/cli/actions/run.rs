use crate::cli::actions::{admin, import, inspect, kernel, otp, Action};
use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub fn execute(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Import => import::execute(globals),
        Action::Inspect { serial } => inspect::execute(globals, serial.as_deref()),
        Action::Generate { serial } => otp::generate(globals, &serial),
        Action::Verify { serial, otp } => otp::verify(globals, &serial, &otp),
        Action::Reset { serial } => admin::reset(globals, &serial),
        Action::Status { serial, status } => admin::status(globals, &serial, status),
        Action::Kernel { name } => kernel::execute(globals, name.as_deref()),
    }
}
