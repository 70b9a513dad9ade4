//! Typed token and kernel properties.
//!
//! The engine speaks strings (token properties) and int32s (kernel
//! parameters). [`codec`] turns those into [`Value`]s and validates writes;
//! [`accessor`] binds the codec to an entity and the engine.

pub mod accessor;
pub mod codec;

pub use accessor::{PropertyAccessor, PropertySink, PropertySource};
pub use codec::{Access, Kind, PropertyDescriptor, WriteRule};

use chrono::{DateTime, Utc};
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Authentication mode reported by `auth_mode`.
///
/// Codes the engine introduces later are kept verbatim in [`AuthMode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthMode {
    ResponseOnly,
    SignatureApplication,
    ChallengeResponse,
    MultiMode,
    UnlockV2,
    Other(String),
}

impl AuthMode {
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "RO" => Self::ResponseOnly,
            "SG" => Self::SignatureApplication,
            "CR" => Self::ChallengeResponse,
            "MM" => Self::MultiMode,
            "UL" => Self::UnlockV2,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ResponseOnly => "response_only",
            Self::SignatureApplication => "signature_application",
            Self::ChallengeResponse => "challenge_response",
            Self::MultiMode => "multi_mode",
            Self::UnlockV2 => "unlock_v2",
            Self::Other(code) => code,
        }
    }
}

impl Serialize for AuthMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Activation scope written through `token_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Disabled,
    PrimaryOnly,
    BackupOnly,
    Enabled,
}

impl TokenStatus {
    /// Integer understood by the engine.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::PrimaryOnly => 1,
            Self::BackupOnly => 2,
            Self::Enabled => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::PrimaryOnly => "primary_only",
            Self::BackupOnly => "backup_only",
            Self::Enabled => "enabled",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "primary_only" => Ok(Self::PrimaryOnly),
            "backup_only" => Ok(Self::BackupOnly),
            "enabled" => Ok(Self::Enabled),
            _ => Err(format!("unknown token status: {s}")),
        }
    }
}

/// A decoded property value, or a value about to be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Time(DateTime<Utc>),
    Mode(AuthMode),
    Status(TokenStatus),
    Text(String),
}

impl Value {
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mode(&self) -> Option<AuthMode> {
        match self {
            Self::Mode(mode) => Some(mode.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Time(value) => write!(f, "{}", value.to_rfc3339()),
            Self::Mode(mode) => f.write_str(mode.as_str()),
            Self::Status(status) => f.write_str(status.as_str()),
            Self::Text(text) => write!(f, "{text:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value)
    }
}

impl From<TokenStatus> for Value {
    fn from(value: TokenStatus) -> Self {
        Self::Status(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One entry of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(Option<Value>),
    /// The property could not be read; holds the error message.
    Error(String),
}

impl Entry {
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => value.as_ref(),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(Some(value)) => write!(f, "{value}"),
            Self::Value(None) => f.write_str("null"),
            Self::Error(message) => write!(f, "\"ERROR: {message}\""),
        }
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Error(message) => serializer.serialize_str(&format!("ERROR: {message}")),
        }
    }
}

/// Every property of an entity, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(String, Entry)>,
}

impl Snapshot {
    pub(crate) fn push(&mut self, name: String, entry: Entry) {
        self.entries.push((name, entry));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, entry)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name:?}=>{entry}")?;
        }
        f.write_str("}")
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}
