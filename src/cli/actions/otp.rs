use crate::cli::{actions::session::Session, globals::GlobalArgs};
use crate::token::Verification;
use crate::Error;
use anyhow::Result;

/// Prints the current OTP of a token.
///
/// # Errors
/// Returns an error if the token is unknown or cannot generate.
pub fn generate(globals: &GlobalArgs, serial: &str) -> Result<()> {
    let mut session = Session::open(globals)?;
    let otp = session.token_mut(serial)?.generate()?;
    println!("{otp}");
    Ok(())
}

/// Verifies `otp`, saving the updated counters whatever the outcome.
///
/// # Errors
/// Returns an error when the OTP is rejected or the token is locked.
pub fn verify(globals: &GlobalArgs, serial: &str, otp: &str) -> Result<()> {
    let mut session = Session::open(globals)?;
    let outcome = session.token_mut(serial)?.check(otp)?;
    session.save()?;

    match outcome {
        Verification::Accepted => {
            println!("accepted");
            Ok(())
        }
        Verification::Rejected(record) => Err(Error::ValidationFailed(record).into()),
        Verification::Locked(record) => Err(Error::Locked {
            serial: serial.to_string(),
            record,
        }
        .into()),
    }
}
