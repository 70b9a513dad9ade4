//! Token batch files understood by [`super::MemoryEngine`].
//!
//! A batch is a JSON document listing token profiles. The transport key is
//! never stored; the file carries a short check value derived from it so a
//! wrong key can be told apart from a corrupt file.

use base64ct::{Base64, Encoding};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fs, io, path::Path};

const SEED_LEN: usize = 20;

/// Check value stored in a batch for `transport_key`.
#[must_use]
pub fn key_check(transport_key: &str) -> String {
    let digest = Sha256::digest(transport_key.as_bytes());
    Base64::encode_string(&digest[..8])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFile {
    pub key_check: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_vector: Option<String>,
    pub tokens: Vec<TokenProfile>,
}

impl BatchFile {
    #[must_use]
    pub fn new(transport_key: &str) -> Self {
        Self {
            key_check: key_check(transport_key),
            static_vector: None,
            tokens: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: TokenProfile) -> Self {
        self.tokens.push(token);
        self
    }

    #[must_use]
    pub fn with_static_vector(mut self, static_vector: &str) -> Self {
        self.static_vector = Some(static_vector.to_string());
        self
    }

    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

fn default_model() -> String {
    "DP300".to_string()
}

fn default_auth_mode() -> String {
    "RO".to_string()
}

fn default_code_word() -> String {
    "00005200".to_string()
}

/// One token as provisioned by the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenProfile {
    pub serial: String,
    pub app_name: String,
    /// Base64 encoded HOTP seed.
    pub seed: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,
    #[serde(default = "default_code_word")]
    pub code_word: String,
    #[serde(default)]
    pub pin_supported: bool,
    #[serde(default)]
    pub pin_min_len: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_token_type: Option<String>,
    #[serde(default)]
    pub virtual_token_supported: bool,
    #[serde(default)]
    pub flags1: i32,
    #[serde(default)]
    pub flags2: i32,
}

impl TokenProfile {
    /// A response-only token with a fresh random seed.
    #[must_use]
    pub fn new(serial: &str, app_name: &str) -> Self {
        let mut seed = [0u8; SEED_LEN];
        OsRng.fill_bytes(&mut seed);
        Self {
            serial: serial.to_string(),
            app_name: app_name.to_string(),
            seed: Base64::encode_string(&seed),
            model: default_model(),
            auth_mode: default_auth_mode(),
            code_word: default_code_word(),
            pin_supported: false,
            pin_min_len: 0,
            pin: None,
            virtual_token_type: Some("PRIMARY".to_string()),
            virtual_token_supported: false,
            flags1: 0,
            flags2: 0,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: &[u8]) -> Self {
        self.seed = Base64::encode_string(seed);
        self
    }

    /// Enables the static password with an initial PIN.
    #[must_use]
    pub fn with_pin(mut self, pin: &str, min_len: i64) -> Self {
        self.pin_supported = true;
        self.pin_min_len = min_len;
        self.pin = Some(pin.to_string());
        self.virtual_token_type = None;
        self
    }

    #[must_use]
    pub fn with_auth_mode(mut self, code: &str) -> Self {
        self.auth_mode = code.to_string();
        self
    }

    /// Adds a backup (virtual) token, e.g. delivered by SMS.
    #[must_use]
    pub fn with_virtual_token(mut self, kind: &str) -> Self {
        self.virtual_token_supported = true;
        self.virtual_token_type = Some(kind.to_string());
        self
    }
}
