//! The boundary to the token engine.
//!
//! The engine owns key material, the OTP algorithms, the kernel parameter
//! block and the layout of the opaque token blob. This crate only ever talks
//! to it through [`Engine`]; [`memory::MemoryEngine`] is an in-process
//! implementation used by the test-suite and by `otpctl` dry runs.

pub mod memory;

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

/// Status codes the core interprets. Everything else is passed through.
pub mod status {
    /// The candidate OTP did not match.
    pub const VALIDATION_FAILED: i32 = 1;
    /// The error counter reached the kernel threshold; the OTP was not checked.
    pub const TOKEN_LOCKED: i32 = 2;
    /// A property or parameter value the engine cannot store.
    pub const INVALID_VALUE: i32 = -13;
    /// The transport key does not decrypt the import file.
    pub const INVALID_TRANSPORT_KEY: i32 = -15;
    /// The import file could not be opened.
    pub const CANNOT_OPEN_FILE: i32 = -20;
}

/// Raw token state as handed out by the engine.
///
/// The engine rewrites the blob and flag words on every stateful call, so a
/// record must be persisted by the caller after verify/reset/set operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub serial: String,
    pub app_name: String,
    pub blob: String,
    pub flags1: i32,
    pub flags2: i32,
    #[serde(default, rename = "sv", skip_serializing_if = "Option::is_none")]
    pub static_vector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryVersion {
    pub version: String,
    pub bitness: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A raw property value, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Int(i64),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineFault {
    /// `method` returned a non-zero status.
    Status { method: &'static str, code: i32 },
    /// The engine has no property or parameter called `name`.
    UnknownName { name: String },
}

pub type EngineResult<T> = std::result::Result<T, EngineFault>;

/// Primitive operations of a token engine.
///
/// Implementations must be safe to share between threads, with the exception
/// of kernel parameter writes, which callers serialize (see
/// [`crate::kernel::Kernel`]).
pub trait Engine: Send + Sync + fmt::Debug {
    /// # Errors
    /// Returns a fault if the engine cannot report its version.
    fn library_version(&self) -> EngineResult<LibraryVersion>;

    /// Human readable message for a status code.
    fn error_message(&self, code: i32) -> String;

    /// Decodes every token contained in `path`.
    ///
    /// # Errors
    /// Returns [`status::CANNOT_OPEN_FILE`] or [`status::INVALID_TRANSPORT_KEY`]
    /// for unreadable files and wrong keys, other codes for malformed content.
    fn import(&self, path: &Path, transport_key: &str) -> EngineResult<Vec<TokenRecord>>;

    /// Kernel parameter names in a stable order.
    fn kernel_property_names(&self) -> Vec<String>;

    /// # Errors
    /// Returns [`EngineFault::UnknownName`] for unknown parameters.
    fn get_kernel_param(&self, name: &str) -> EngineResult<i32>;

    /// # Errors
    /// Returns [`EngineFault::UnknownName`] for unknown parameters.
    fn set_kernel_param(&self, name: &str, value: i32) -> EngineResult<()>;

    /// Token property names in a stable order.
    fn token_property_names(&self) -> Vec<String>;

    /// # Errors
    /// Returns a fault for unknown or unreadable properties.
    fn get_token_property(&self, token: &TokenRecord, name: &str) -> EngineResult<String>;

    /// # Errors
    /// Returns a fault for unknown or read-only properties, or values the
    /// token cannot accept.
    fn set_token_property(&self, token: &mut TokenRecord, name: &str, value: i64)
        -> EngineResult<()>;

    /// Changes the static password (PIN) of the token.
    ///
    /// # Errors
    /// Returns a fault if the token has no PIN support or the PIN is refused.
    fn set_token_pin(&self, token: &mut TokenRecord, pin: &str) -> EngineResult<()>;

    /// Clears the error counter and the time shift.
    ///
    /// # Errors
    /// Returns a fault if the blob cannot be processed.
    fn reset_token_info(&self, token: &mut TokenRecord) -> EngineResult<()>;

    /// # Errors
    /// Returns a fault if the token mode forbids local generation.
    fn generate_otp(&self, token: &mut TokenRecord) -> EngineResult<String>;

    /// Checks `candidate`, updating counters in the blob either way.
    ///
    /// # Errors
    /// A rejection is reported as [`status::VALIDATION_FAILED`] or
    /// [`status::TOKEN_LOCKED`]; any other code is an engine failure.
    fn verify_otp(&self, token: &mut TokenRecord, candidate: &str) -> EngineResult<()>;
}
