use anyhow::Result;
use otpctl::cli;

fn main() -> Result<()> {
    let (action, globals) = cli::start()?;

    action.execute(&globals)?;

    Ok(())
}
