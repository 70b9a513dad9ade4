//! Error taxonomy and translation of engine faults.
//!
//! Every engine call site funnels its failure through [`translate`] (or
//! [`translate_import`] while importing), so callers always see a typed
//! [`Error`] carrying the engine method, code and message when the failure
//! originated inside the engine.

use crate::engine::{status, Engine, EngineFault};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The kind of entity a property belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Token,
    Kernel,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => f.write_str("token property"),
            Self::Kernel => f.write_str("kernel param"),
        }
    }
}

/// Why a property name was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyIssue {
    Unknown,
    ReadOnly,
    WriteOnly,
}

impl fmt::Display for PropertyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown name"),
            Self::ReadOnly => f.write_str("read-only"),
            Self::WriteOnly => f.write_str("write-only"),
        }
    }
}

/// Optional token capabilities that gate some operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Pin,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin => f.write_str("PIN"),
        }
    }
}

/// A failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub library_method: String,
    pub error_code: i32,
    pub error_message: String,
}

impl ErrorRecord {
    /// Builds a record, asking the engine for the message matching `code`.
    #[must_use]
    pub fn from_status(engine: &dyn Engine, method: &str, code: i32) -> Self {
        Self {
            library_method: method.to_string(),
            error_code: code,
            error_message: engine.error_message(code),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error {}: {}",
            self.library_method, self.error_code, self.error_message
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("invalid {entity} {name}: {issue}")]
    InvalidProperty {
        entity: Entity,
        name: String,
        issue: PropertyIssue,
    },
    #[error("invalid {name} value provided: {value}, must be between {min} and {max}")]
    OutOfBounds {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("{entity} {name} cannot be set to {value}, expected {allowed}")]
    InvalidWrite {
        entity: Entity,
        name: String,
        value: String,
        allowed: String,
    },
    #[error("cannot decode {name} value {raw:?}")]
    InvalidValue { name: String, raw: String },
    #[error("token {serial} does not support {feature}")]
    UnsupportedFeature { serial: String, feature: Feature },
    #[error("{0}")]
    ValidationFailed(ErrorRecord),
    #[error("token {serial} is locked: {record}")]
    Locked { serial: String, record: ErrorRecord },
    #[error("{0}")]
    Engine(ErrorRecord),
    #[error("{} error {}: {reason}", record.library_method, record.error_code)]
    Import {
        record: ErrorRecord,
        reason: &'static str,
    },
}

impl Error {
    /// The engine method that failed, when the error came from the engine.
    #[must_use]
    pub fn library_method(&self) -> Option<&str> {
        self.record().map(|r| r.library_method.as_str())
    }

    /// The engine status code, when the error came from the engine.
    #[must_use]
    pub fn error_code(&self) -> Option<i32> {
        self.record().map(|r| r.error_code)
    }

    /// The raw engine message, when the error came from the engine.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.record().map(|r| r.error_message.as_str())
    }

    fn record(&self) -> Option<&ErrorRecord> {
        match self {
            Self::ValidationFailed(record)
            | Self::Engine(record)
            | Self::Locked { record, .. }
            | Self::Import { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Converts an engine fault into a typed error.
pub(crate) fn translate(engine: &dyn Engine, entity: Entity, fault: EngineFault) -> Error {
    match fault {
        EngineFault::Status { method, code } => {
            Error::Engine(ErrorRecord::from_status(engine, method, code))
        }
        EngineFault::UnknownName { name } => Error::InvalidProperty {
            entity,
            name,
            issue: PropertyIssue::Unknown,
        },
    }
}

/// Like [`translate`], with specialised messages for the two import failures
/// the engine does not describe on its own.
pub(crate) fn translate_import(engine: &dyn Engine, fault: EngineFault) -> Error {
    let reason = match &fault {
        EngineFault::Status { code, .. } if *code == status::INVALID_TRANSPORT_KEY => {
            "invalid transport key"
        }
        EngineFault::Status { code, .. } if *code == status::CANNOT_OPEN_FILE => {
            "cannot open key file"
        }
        _ => return translate(engine, Entity::Token, fault),
    };

    match fault {
        EngineFault::Status { method, code } => Error::Import {
            record: ErrorRecord::from_status(engine, method, code),
            reason,
        },
        EngineFault::UnknownName { .. } => translate(engine, Entity::Token, fault),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::MemoryEngine;

    #[test]
    fn engine_status_keeps_method_code_and_message() {
        let engine = MemoryEngine::new();
        let err = translate(
            &engine,
            Entity::Token,
            EngineFault::Status {
                method: "VerifyPassword",
                code: status::VALIDATION_FAILED,
            },
        );

        assert_eq!(err.library_method(), Some("VerifyPassword"));
        assert_eq!(err.error_code(), Some(status::VALIDATION_FAILED));
        assert_eq!(err.error_message(), Some("Validation Failed"));
        assert_eq!(err.to_string(), "VerifyPassword error 1: Validation Failed");
    }

    #[test]
    fn unknown_name_becomes_invalid_property() {
        let engine = MemoryEngine::new();
        let err = translate(
            &engine,
            Entity::Kernel,
            EngineFault::UnknownName {
                name: "Foo".to_string(),
            },
        );

        assert!(matches!(err, Error::InvalidProperty { .. }));
        assert_eq!(err.to_string(), "invalid kernel param Foo: unknown name");
        assert_eq!(err.error_code(), None);
    }

    #[test]
    fn import_specialises_transport_key_and_file_codes() {
        let engine = MemoryEngine::new();

        let err = translate_import(
            &engine,
            EngineFault::Status {
                method: "DPXInit",
                code: status::INVALID_TRANSPORT_KEY,
            },
        );
        assert!(matches!(err, Error::Import { .. }));
        assert_eq!(err.to_string(), "DPXInit error -15: invalid transport key");

        let err = translate_import(
            &engine,
            EngineFault::Status {
                method: "DPXInit",
                code: status::CANNOT_OPEN_FILE,
            },
        );
        assert!(err.to_string().contains("cannot open"));
        assert_eq!(err.error_code(), Some(-20));
    }

    #[test]
    fn import_passes_other_codes_through() {
        let engine = MemoryEngine::new();
        let err = translate_import(
            &engine,
            EngineFault::Status {
                method: "DPXGetToken",
                code: status::VALIDATION_FAILED,
            },
        );

        assert!(matches!(err, Error::Engine(_)));
    }
}
