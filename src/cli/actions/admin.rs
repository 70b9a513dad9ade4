use crate::cli::{actions::session::Session, globals::GlobalArgs};
use crate::property::TokenStatus;
use anyhow::Result;

/// Unlocks a token.
///
/// # Errors
/// Returns an error if the token is unknown or the engine refuses.
pub fn reset(globals: &GlobalArgs, serial: &str) -> Result<()> {
    let mut session = Session::open(globals)?;
    session.token_mut(serial)?.reset()?;
    session.save()?;
    println!("{serial} reset");
    Ok(())
}

/// Changes which of the primary and backup tokens accept OTPs.
///
/// # Errors
/// Returns an error if the token is unknown or the engine refuses.
pub fn status(globals: &GlobalArgs, serial: &str, status: TokenStatus) -> Result<()> {
    let mut session = Session::open(globals)?;
    let token = session.token_mut(serial)?;
    match status {
        TokenStatus::Disabled => token.disable()?,
        TokenStatus::PrimaryOnly => token.enable_primary_only()?,
        TokenStatus::BackupOnly => token.enable_backup_only()?,
        TokenStatus::Enabled => token.enable()?,
    }
    session.save()?;
    println!("{serial} {status}");
    Ok(())
}
