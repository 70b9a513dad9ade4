//! # otpctl
//!
//! Typed property access and authentication for one-time-password tokens
//! managed by a token engine.
//!
//! ## Properties
//!
//! The engine exposes token properties as strings and kernel parameters as
//! 32-bit integers. Every name has a static descriptor (kind, access, write
//! rule), so reads come back as typed values (`bool`, `i64`, UTC timestamps,
//! authentication modes) and writes are validated before anything reaches the
//! engine.
//!
//! ## Authentication and lockout
//!
//! Each failed verification increments the token error counter. Once it
//! reaches the kernel `IThreshold` the engine rejects even correct OTPs until
//! the token is reset. [`token::Verification`] keeps a mismatch apart from a
//! lockout; tokens without PIN support refuse PIN operations with
//! [`Error::UnsupportedFeature`].
//!
//! ## Engines
//!
//! [`engine::Engine`] is the only way this crate talks to key material.
//! [`engine::memory::MemoryEngine`] runs HOTP tokens in process and reads JSON
//! batch files, which is what the tests and `otpctl` dry runs use.

pub mod cli;
pub mod controller;
pub mod engine;
pub mod error;
pub mod kernel;
pub mod property;
pub mod token;

#[cfg(test)]
mod test_support;

pub use controller::Controller;
pub use error::{Error, ErrorRecord, Result};
pub use kernel::Kernel;
pub use token::{Token, TokenProperties, TokenState, Verification};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
