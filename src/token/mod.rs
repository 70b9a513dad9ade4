//! Imported tokens.
//!
//! A [`Token`] pairs the engine record with the [`Controller`] it came from.
//! The record is rewritten by the engine on every stateful call; use
//! [`Token::record`] to persist it afterwards.

pub mod auth;
pub mod properties;

pub use auth::{TokenState, Verification};

use crate::controller::Controller;
use crate::engine::{Engine, EngineResult, RawValue, TokenRecord};
use crate::error::Entity;
use crate::property::{codec, PropertyAccessor, PropertyDescriptor, PropertySink, PropertySource};
use serde::Serialize;
use std::fmt;

/// Writable property view of a token.
pub type TokenProperties<'a> = PropertyAccessor<TokenMut<'a>>;

#[derive(Debug, Clone, Serialize)]
pub struct Token {
    #[serde(flatten)]
    record: TokenRecord,
    #[serde(skip)]
    controller: Controller,
}

impl Token {
    pub(crate) fn new(controller: Controller, record: TokenRecord) -> Self {
        Self { record, controller }
    }

    #[must_use]
    pub fn serial(&self) -> &str {
        &self.record.serial
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.record.app_name
    }

    /// The engine record, for persistence by the caller.
    #[must_use]
    pub fn record(&self) -> &TokenRecord {
        &self.record
    }

    #[must_use]
    pub fn into_record(self) -> TokenRecord {
        self.record
    }

    /// Read-only property access.
    #[must_use]
    pub fn properties(&self) -> PropertyAccessor<TokenRef<'_>> {
        PropertyAccessor::new(TokenRef {
            controller: &self.controller,
            record: &self.record,
        })
    }

    /// Read-write property access. Writes update [`Token::record`].
    #[must_use]
    pub fn properties_mut(&mut self) -> TokenProperties<'_> {
        PropertyAccessor::new(TokenMut {
            controller: &self.controller,
            record: &mut self.record,
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<Token serial={:?} app_name={:?} properties={}>",
            self.record.serial,
            self.record.app_name.trim_end(),
            self.properties().all()
        )
    }
}

/// Marker for property sources backed by a token record.
pub trait TokenSource: PropertySource {}

#[derive(Debug, Clone, Copy)]
pub struct TokenRef<'a> {
    controller: &'a Controller,
    record: &'a TokenRecord,
}

#[derive(Debug)]
pub struct TokenMut<'a> {
    controller: &'a Controller,
    record: &'a mut TokenRecord,
}

fn read_token(
    controller: &Controller,
    record: &TokenRecord,
    name: &str,
) -> EngineResult<RawValue> {
    controller
        .engine()
        .get_token_property(record, name)
        .map(RawValue::Text)
}

impl PropertySource for TokenRef<'_> {
    fn entity(&self) -> Entity {
        Entity::Token
    }

    fn engine(&self) -> &dyn Engine {
        self.controller.engine()
    }

    fn names(&self) -> &[String] {
        self.controller.token_property_names()
    }

    fn canonical(&self, name: &str) -> String {
        codec::canonical_token_name(name)
    }

    fn descriptor(&self, name: &str) -> Option<PropertyDescriptor> {
        codec::token_descriptor(name)
    }

    fn read_raw(&self, name: &str) -> EngineResult<RawValue> {
        read_token(self.controller, self.record, name)
    }
}

impl TokenSource for TokenRef<'_> {}

impl PropertySource for TokenMut<'_> {
    fn entity(&self) -> Entity {
        Entity::Token
    }

    fn engine(&self) -> &dyn Engine {
        self.controller.engine()
    }

    fn names(&self) -> &[String] {
        self.controller.token_property_names()
    }

    fn canonical(&self, name: &str) -> String {
        codec::canonical_token_name(name)
    }

    fn descriptor(&self, name: &str) -> Option<PropertyDescriptor> {
        codec::token_descriptor(name)
    }

    fn read_raw(&self, name: &str) -> EngineResult<RawValue> {
        read_token(self.controller, self.record, name)
    }
}

impl PropertySink for TokenMut<'_> {
    fn write_raw(&mut self, name: &str, value: i64) -> EngineResult<()> {
        self.controller
            .engine()
            .set_token_property(self.record, name, value)
    }
}

impl TokenSource for TokenMut<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::TokenProfile;
    use crate::error::{Error, PropertyIssue};
    use crate::property::{Entry, Value};
    use crate::test_support::import_one;

    fn token() -> Token {
        import_one(TokenProfile::new("0097123456", "APPL 1"))
    }

    #[test]
    fn names_are_normalized() {
        let token = token();
        assert_eq!(
            token.properties().get("  Use_Count ").unwrap(),
            Some(Value::Int(0))
        );
    }

    #[test]
    fn unknown_names_fail_before_the_engine_write() {
        let mut token = token();
        let before = token.record().clone();
        let err = token.properties_mut().set("bogus", 1).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidProperty {
                issue: PropertyIssue::Unknown,
                ..
            }
        ));
        assert_eq!(token.record(), &before);
    }

    #[test]
    fn read_only_properties_cannot_be_written() {
        let mut token = token();
        let err = token.properties_mut().set("use_count", 5).unwrap_err();
        assert_eq!(err.to_string(), "invalid token property use_count: read-only");
    }

    #[test]
    fn token_status_is_write_only() {
        let token = token();
        let err = token.properties().get("token_status").unwrap_err();
        assert!(err.to_string().ends_with("write-only"));
    }

    #[test]
    fn snapshot_reports_unreadable_entries_inline() {
        let token = token();
        let all = token.properties().all();
        assert_eq!(all.len(), codec::TOKEN_PROPERTIES.len());
        assert!(all.get("token_status").is_some_and(Entry::is_error));
        assert_eq!(all.get("ocra_suite"), Some(&Entry::Value(None)));
        assert_eq!(all.iter().filter(|(_, entry)| entry.is_error()).count(), 1);
    }

    #[test]
    fn display_shows_identity_and_properties() {
        let rendered = token().to_string();
        assert!(rendered.starts_with(r#"#<Token serial="0097123456" app_name="APPL 1" properties={"#));
        assert!(rendered.contains(r#""token_model"=>"DP300""#));
    }
}
