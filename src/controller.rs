//! Entry point tying an engine to its kernel and imported tokens.

use crate::engine::{Engine, TokenRecord};
use crate::error::{translate_import, Result};
use crate::kernel::Kernel;
use crate::token::Token;
use std::{
    fmt,
    path::Path,
    sync::{Arc, OnceLock},
};
use tracing::{info, instrument};

/// Cheap to clone; every clone and every token it produced share one engine
/// and one [`Kernel`].
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<dyn Engine>,
    kernel: Kernel,
    token_names: OnceLock<Vec<String>>,
}

impl Controller {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            inner: Arc::new(Inner {
                kernel: Kernel::new(Arc::clone(&engine)),
                engine,
                token_names: OnceLock::new(),
            }),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &dyn Engine {
        self.inner.engine.as_ref()
    }

    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.inner.kernel
    }

    /// Token property names, fetched from the engine once.
    pub fn token_property_names(&self) -> &[String] {
        self.inner
            .token_names
            .get_or_init(|| self.inner.engine.token_property_names())
    }

    /// Imports every token of a vendor file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Import`] for unreadable files and wrong
    /// transport keys, [`crate::Error::Engine`] for anything else the engine
    /// rejects.
    pub fn import(&self, path: impl AsRef<Path>, transport_key: &str) -> Result<Vec<Token>> {
        Ok(self
            .import_records(path, transport_key)?
            .into_iter()
            .map(|record| self.token(record))
            .collect())
    }

    /// Like [`Controller::import`], returning the raw records.
    ///
    /// # Errors
    /// Same as [`Controller::import`].
    #[instrument(skip(self, path, transport_key), fields(path = %path.as_ref().display()))]
    pub fn import_records(
        &self,
        path: impl AsRef<Path>,
        transport_key: &str,
    ) -> Result<Vec<TokenRecord>> {
        let records = self
            .engine()
            .import(path.as_ref(), transport_key)
            .map_err(|fault| translate_import(self.engine(), fault))?;
        info!(tokens = records.len(), "tokens imported");
        Ok(records)
    }

    /// Re-attaches a previously persisted record.
    #[must_use]
    pub fn token(&self, record: TokenRecord) -> Token {
        Token::new(self.clone(), record)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("engine", &self.inner.engine)
            .field("kernel", &self.inner.kernel)
            .finish_non_exhaustive()
    }
}
