//! Property descriptors, decoding and write validation.
//!
//! Everything here is pure: no engine calls, no shared state besides the
//! lazily built name index.

use crate::error::{Entity, Error, PropertyIssue, Result};
use crate::{
    engine::RawValue,
    property::{AuthMode, TokenStatus, Value},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::{collections::HashMap, sync::OnceLock};

/// Raw values meaning "not applicable to this token".
const SENTINELS: [&str; 2] = ["NA", "DISABLE"];

/// asctime(3) layout used by the engine for dates, always UTC.
const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Integer,
    Boolean,
    Timestamp,
    AuthMode,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
    WriteOnly,
}

impl Access {
    #[must_use]
    pub const fn readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    #[must_use]
    pub const fn writable(self) -> bool {
        matches!(self, Self::ReadWrite | Self::WriteOnly)
    }
}

/// How a semantic value is validated and turned into the engine integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRule {
    /// Integer in `[min, max]`, inclusive.
    Bounded { min: i64, max: i64 },
    /// `true` → 1, `false` → 2.
    PinEnabled,
    /// Only `true` (→ 1) may be written.
    OnlyTrue,
    /// Only `0` may be written.
    OnlyZero,
    /// One of the [`TokenStatus`] variants.
    Status,
}

impl WriteRule {
    /// The values the rule accepts, as shown in error messages.
    #[must_use]
    pub fn allowed(&self) -> String {
        match self {
            Self::Bounded { min, max } => format!("an integer between {min} and {max}"),
            Self::PinEnabled => "true or false".to_string(),
            Self::OnlyTrue => "true".to_string(),
            Self::OnlyZero => "0".to_string(),
            Self::Status => "one of disabled, primary_only, backup_only, enabled".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub kind: Kind,
    pub access: Access,
    pub rule: Option<WriteRule>,
}

impl PropertyDescriptor {
    const fn read(kind: Kind) -> Self {
        Self {
            kind,
            access: Access::ReadOnly,
            rule: None,
        }
    }

    const fn write(kind: Kind, rule: WriteRule) -> Self {
        Self {
            kind,
            access: Access::ReadWrite,
            rule: Some(rule),
        }
    }

    const fn bounded(kind: Kind, min: i64, max: i64) -> Self {
        Self::write(kind, WriteRule::Bounded { min, max })
    }
}

const INTEGER: PropertyDescriptor = PropertyDescriptor::read(Kind::Integer);
const BOOLEAN: PropertyDescriptor = PropertyDescriptor::read(Kind::Boolean);
const TEXT: PropertyDescriptor = PropertyDescriptor::read(Kind::Text);

const LAST_TIME_USED: PropertyDescriptor =
    PropertyDescriptor::bounded(Kind::Timestamp, 631_152_000, 2_147_483_647);
const LAST_TIME_SHIFT: PropertyDescriptor =
    PropertyDescriptor::bounded(Kind::Integer, -100_000, 100_000);
const PIN_MIN_LEN: PropertyDescriptor = PropertyDescriptor::bounded(Kind::Integer, 3, 8);
const PIN_ENABLED: PropertyDescriptor =
    PropertyDescriptor::write(Kind::Boolean, WriteRule::PinEnabled);
const PIN_CHANGE_FORCED: PropertyDescriptor =
    PropertyDescriptor::write(Kind::Boolean, WriteRule::OnlyTrue);
const GRACE_PERIOD: PropertyDescriptor = PropertyDescriptor::bounded(Kind::Timestamp, 1, 364);
const REMAIN_USE: PropertyDescriptor = PropertyDescriptor::bounded(Kind::Integer, 0, 254);
const ERROR_COUNT: PropertyDescriptor =
    PropertyDescriptor::write(Kind::Integer, WriteRule::OnlyZero);
const EVENT_VALUE: PropertyDescriptor =
    PropertyDescriptor::bounded(Kind::Integer, 0, 4_294_967_294);
const TOKEN_STATUS: PropertyDescriptor = PropertyDescriptor {
    kind: Kind::Text,
    access: Access::WriteOnly,
    rule: Some(WriteRule::Status),
};

/// Every kernel parameter is a read-write int32.
pub const KERNEL_PARAM: PropertyDescriptor = PropertyDescriptor::bounded(
    Kind::Integer,
    i32::MIN as i64,
    i32::MAX as i64,
);

/// Descriptor for token properties the engine lists but this table does not.
pub const OPAQUE: PropertyDescriptor = TEXT;

/// Token properties, aliases included, in the engine's discovery order.
pub const TOKEN_PROPERTIES: &[(&str, PropertyDescriptor)] = &[
    ("token_model", TEXT),
    ("token_status", TOKEN_STATUS),
    ("use_count", INTEGER),
    ("last_time_used", LAST_TIME_USED),
    ("last_time_shift", LAST_TIME_SHIFT),
    ("time_based_algo", BOOLEAN),
    ("event_based_algo", BOOLEAN),
    ("pin_supported", BOOLEAN),
    ("unlock_supported", BOOLEAN),
    ("pin_ch_on", BOOLEAN),
    ("pin_change_enabled", BOOLEAN),
    ("pin_len", INTEGER),
    ("pin_length", INTEGER),
    ("pin_min_len", PIN_MIN_LEN),
    ("pin_minimum_length", PIN_MIN_LEN),
    ("pin_enabled", PIN_ENABLED),
    ("pin_ch_forced", PIN_CHANGE_FORCED),
    ("pin_change_forced", PIN_CHANGE_FORCED),
    ("virtual_token_type", TEXT),
    ("virtual_token_grace_period", GRACE_PERIOD),
    ("virtual_token_remain_use", REMAIN_USE),
    ("last_response_type", TEXT),
    ("error_count", ERROR_COUNT),
    ("event_value", EVENT_VALUE),
    ("last_event_value", INTEGER),
    ("sync_windows", BOOLEAN),
    ("primary_token_enabled", BOOLEAN),
    ("virtual_token_supported", BOOLEAN),
    ("virtual_token_enabled", BOOLEAN),
    ("code_word", TEXT),
    ("auth_mode", PropertyDescriptor::read(Kind::AuthMode)),
    ("ocra_suite", TEXT),
    ("derivation_supported", BOOLEAN),
    ("max_dtf_number", INTEGER),
    ("response_len", INTEGER),
    ("response_length", INTEGER),
    ("response_format", TEXT),
    ("response_chk", BOOLEAN),
    ("response_checksum", BOOLEAN),
    ("time_step", INTEGER),
    ("use_3des", BOOLEAN),
    ("triple_des_used", BOOLEAN),
];

fn token_index() -> &'static HashMap<&'static str, PropertyDescriptor> {
    static INDEX: OnceLock<HashMap<&'static str, PropertyDescriptor>> = OnceLock::new();
    INDEX.get_or_init(|| TOKEN_PROPERTIES.iter().copied().collect())
}

/// Looks up the descriptor of a token property.
#[must_use]
pub fn token_descriptor(name: &str) -> Option<PropertyDescriptor> {
    token_index().get(name).copied()
}

/// Canonical spelling of a token property name.
#[must_use]
pub fn canonical_token_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Decodes a raw engine value according to `descriptor`.
///
/// # Errors
/// Returns [`Error::InvalidValue`] if the raw value does not fit the kind.
pub fn decode(name: &str, descriptor: &PropertyDescriptor, raw: RawValue) -> Result<Option<Value>> {
    let text = match raw {
        RawValue::Int(value) => {
            return match descriptor.kind {
                Kind::Integer => Ok(Some(Value::Int(value))),
                Kind::Text => Ok(Some(Value::Text(value.to_string()))),
                _ => Err(invalid_value(name, &value.to_string())),
            };
        }
        RawValue::Text(text) => text,
    };

    if SENTINELS.contains(&text.trim()) {
        return Ok(None);
    }

    let value = match descriptor.kind {
        Kind::Integer => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid_value(name, &text))?,
        Kind::Boolean => match text.trim() {
            "YES" => Value::Bool(true),
            "NO" => Value::Bool(false),
            _ => return Err(invalid_value(name, &text)),
        },
        Kind::Timestamp => {
            Value::Time(parse_timestamp(&text).ok_or_else(|| invalid_value(name, &text))?)
        }
        Kind::AuthMode => Value::Mode(AuthMode::from_code(text.trim())),
        Kind::Text => Value::Text(text),
    };

    Ok(Some(value))
}

/// Validates `value` for `name` and produces the integer handed to the engine.
///
/// # Errors
/// * [`Error::InvalidProperty`] when the descriptor has no write rule.
/// * [`Error::OutOfBounds`] when a bounded integer is outside its range.
/// * [`Error::InvalidWrite`] when the value is not one the rule accepts.
pub fn encode(
    entity: Entity,
    name: &str,
    descriptor: &PropertyDescriptor,
    value: &Value,
) -> Result<i64> {
    let rule = match descriptor.rule {
        Some(rule) if descriptor.access.writable() => rule,
        _ => {
            return Err(Error::InvalidProperty {
                entity,
                name: name.to_string(),
                issue: PropertyIssue::ReadOnly,
            })
        }
    };

    let invalid_write = || Error::InvalidWrite {
        entity,
        name: name.to_string(),
        value: value.to_string(),
        allowed: rule.allowed(),
    };

    match rule {
        WriteRule::Bounded { min, max } => {
            let number = match value {
                Value::Int(number) => *number,
                Value::Time(time) => time.timestamp(),
                _ => return Err(invalid_write()),
            };
            if number < min || number > max {
                return Err(Error::OutOfBounds {
                    name: name.to_string(),
                    value: number,
                    min,
                    max,
                });
            }
            Ok(number)
        }
        WriteRule::PinEnabled => match value {
            Value::Bool(true) => Ok(1),
            Value::Bool(false) => Ok(2),
            _ => Err(invalid_write()),
        },
        WriteRule::OnlyTrue => match value {
            Value::Bool(true) => Ok(1),
            _ => Err(invalid_write()),
        },
        WriteRule::OnlyZero => match value {
            Value::Int(0) => Ok(0),
            _ => Err(invalid_write()),
        },
        WriteRule::Status => match value {
            Value::Status(status) => Ok(status.code()),
            Value::Text(text) => text
                .parse::<TokenStatus>()
                .map(TokenStatus::code)
                .map_err(|_| invalid_write()),
            _ => Err(invalid_write()),
        },
    }
}

/// Parses an engine date such as `Thu Jan  1 00:00:00 1970` as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Formats a date the way the engine reports it.
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format("%a %b %e %H:%M:%S %Y").to_string()
}

fn invalid_value(name: &str, raw: &str) -> Error {
    Error::InvalidValue {
        name: name.to_string(),
        raw: raw.to_string(),
    }
}
