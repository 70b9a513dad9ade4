#![allow(dead_code)]

use anyhow::Result;
use otpctl::engine::memory::{BatchFile, MemoryEngine, TokenProfile};
use otpctl::{Controller, Token};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

pub const TRANSPORT_KEY: &str = "11111111111111111111111111111111";

/// RFC 4226 appendix D secret; OTPs for counters 0.. are 755224, 287082, ...
pub const RFC_SEED: &[u8] = b"12345678901234567890";
pub const RFC_OTPS: [&str; 4] = ["755224", "287082", "359152", "969429"];

/// A file under the temp dir, removed on drop.
pub struct TempFile(PathBuf);

impl TempFile {
    #[must_use]
    pub fn new(extension: &str) -> Self {
        Self(env::temp_dir().join(format!("otpctl-{}.{extension}", ulid::Ulid::new())))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

pub fn batch(profiles: impl IntoIterator<Item = TokenProfile>) -> Result<TempFile> {
    let file = TempFile::new("json");
    profiles
        .into_iter()
        .fold(BatchFile::new(TRANSPORT_KEY), BatchFile::with_token)
        .write(file.path())?;
    Ok(file)
}

#[must_use]
pub fn controller() -> Controller {
    Controller::new(Arc::new(MemoryEngine::new()))
}

pub fn import_one(controller: &Controller, profile: TokenProfile) -> Result<Token> {
    let file = batch([profile])?;
    let mut tokens = controller.import(file.path(), TRANSPORT_KEY)?;
    Ok(tokens.remove(0))
}

#[must_use]
pub fn rfc_token(serial: &str) -> TokenProfile {
    TokenProfile::new(serial, "APPL 1").with_seed(RFC_SEED)
}
