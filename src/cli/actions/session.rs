//! Tokens loaded for one CLI run.

use crate::cli::globals::GlobalArgs;
use crate::engine::{memory::MemoryEngine, TokenRecord};
use crate::{Controller, Token};
use anyhow::{anyhow, bail, Context, Result};
use secrecy::ExposeSecret;
use std::{fs, path::Path, sync::Arc};
use tracing::{debug, instrument};

/// A controller with kernel overrides applied.
///
/// # Errors
/// Returns an error if an override names an unknown parameter.
pub fn controller(globals: &GlobalArgs) -> Result<Controller> {
    let controller = Controller::new(Arc::new(MemoryEngine::new()));
    controller
        .kernel()
        .apply(
            globals
                .kernel
                .iter()
                .map(|(name, value)| (name.as_str(), i64::from(*value))),
        )
        .context("invalid kernel override")?;
    Ok(controller)
}

#[derive(Debug)]
pub struct Session {
    tokens: Vec<Token>,
    state: Option<std::path::PathBuf>,
}

impl Session {
    /// Imports the batch file, ignoring any saved state.
    ///
    /// # Errors
    /// Returns an error if no batch file is given or the import fails.
    pub fn import(globals: &GlobalArgs) -> Result<Self> {
        let batch = globals
            .batch
            .as_deref()
            .context("missing required argument: --batch")?;
        let tokens = import(&controller(globals)?, batch, globals)?;
        Ok(Self {
            tokens,
            state: globals.state.clone(),
        })
    }

    /// Loads tokens from the state file when it exists, otherwise from the
    /// batch file.
    ///
    /// # Errors
    /// Returns an error if neither source is usable.
    #[instrument(skip(globals))]
    pub fn open(globals: &GlobalArgs) -> Result<Self> {
        let controller = controller(globals)?;
        let tokens = match (globals.state.as_deref(), globals.batch.as_deref()) {
            (Some(state), _) if state.exists() => {
                debug!(state = %state.display(), "loading saved records");
                let records: Vec<TokenRecord> = serde_json::from_slice(
                    &fs::read(state)
                        .with_context(|| format!("failed to read {}", state.display()))?,
                )
                .with_context(|| format!("invalid state file {}", state.display()))?;
                records
                    .into_iter()
                    .map(|record| controller.token(record))
                    .collect()
            }
            (_, Some(batch)) => import(&controller, batch, globals)?,
            _ => bail!("missing required argument: --batch or --state"),
        };
        Ok(Self {
            tokens,
            state: globals.state.clone(),
        })
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// # Errors
    /// Returns an error if no token has `serial`.
    pub fn token_mut(&mut self, serial: &str) -> Result<&mut Token> {
        self.tokens
            .iter_mut()
            .find(|token| token.serial() == serial)
            .ok_or_else(|| anyhow!("token {serial} not found"))
    }

    /// Writes the records back to the state file, if one is configured.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        let records: Vec<&TokenRecord> = self.tokens.iter().map(Token::record).collect();
        fs::write(state, serde_json::to_vec_pretty(&records)?)
            .with_context(|| format!("failed to write {}", state.display()))?;
        debug!(state = %state.display(), tokens = records.len(), "records saved");
        Ok(())
    }
}

fn import(controller: &Controller, batch: &Path, globals: &GlobalArgs) -> Result<Vec<Token>> {
    controller
        .import(batch, globals.transport_key.expose_secret())
        .with_context(|| format!("failed to import {}", batch.display()))
}
