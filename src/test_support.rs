//! Fixtures shared by unit tests.

use crate::controller::Controller;
use crate::engine::memory::{BatchFile, MemoryEngine, TokenProfile};
use crate::token::Token;
use std::{fs, sync::Arc};

pub(crate) const TRANSPORT_KEY: &str = "11111111111111111111111111111111";

pub(crate) fn controller() -> Controller {
    Controller::new(Arc::new(MemoryEngine::new()))
}

/// Writes `profile` to a throwaway batch file and imports it.
pub(crate) fn import_one(profile: TokenProfile) -> Token {
    let path = std::env::temp_dir().join(format!("otpctl-{}.json", ulid::Ulid::new()));
    BatchFile::new(TRANSPORT_KEY)
        .with_token(profile)
        .write(&path)
        .unwrap();
    let mut tokens = controller().import(&path, TRANSPORT_KEY).unwrap();
    fs::remove_file(&path).unwrap();
    tokens.remove(0)
}
