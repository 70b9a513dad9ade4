use crate::cli::{
    actions::{print, session},
    globals::GlobalArgs,
};
use anyhow::Result;

/// Prints one kernel parameter, or the whole kernel.
///
/// # Errors
/// Returns an error for unknown parameters.
pub fn execute(globals: &GlobalArgs, name: Option<&str>) -> Result<()> {
    let controller = session::controller(globals)?;
    let kernel = controller.kernel();
    match name {
        Some(name) => print(globals, &kernel.get(name)?),
        None if globals.json => print(globals, &kernel.all()),
        None => {
            println!("{kernel}");
            Ok(())
        }
    }
}
