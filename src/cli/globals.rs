use crate::cli::commands::engine;
use secrecy::SecretString;
use std::path::PathBuf;

/// Options shared by every action.
#[derive(Clone)]
pub struct GlobalArgs {
    pub batch: Option<PathBuf>,
    pub transport_key: SecretString,
    pub state: Option<PathBuf>,
    pub kernel: Vec<(String, i32)>,
    pub json: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(options: engine::Options, json: bool) -> Self {
        Self {
            batch: options.batch,
            transport_key: options.transport_key,
            state: options.state,
            kernel: options.kernel,
            json,
        }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("batch", &self.batch)
            .field("transport_key", &"***")
            .field("state", &self.state)
            .field("kernel", &self.kernel)
            .field("json", &self.json)
            .finish()
    }
}
