mod common;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use common::{controller, import_one, rfc_token};
use otpctl::engine::memory::TokenProfile;
use otpctl::property::{AuthMode, Entry, TokenStatus, Value};
use otpctl::Error;

#[test]
fn snapshot_covers_every_engine_name_in_order() -> Result<()> {
    let controller = controller();
    let token = import_one(&controller, rfc_token("0097123456"))?;
    let snapshot = token.properties().all();

    let names: Vec<&str> = snapshot.names().collect();
    let expected: Vec<&str> = controller
        .token_property_names()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(names, expected);

    assert_eq!(
        snapshot.get("auth_mode"),
        Some(&Entry::Value(Some(Value::Mode(AuthMode::ResponseOnly))))
    );
    assert!(snapshot
        .get("token_status")
        .is_some_and(|entry| entry.to_string().contains("ERROR: invalid token property token_status")));

    let json = serde_json::to_value(&snapshot)?;
    assert_eq!(json["use_count"], 0);
    assert_eq!(json["event_based_algo"], true);
    assert!(json["ocra_suite"].is_null());
    Ok(())
}

#[test]
fn bounded_writes_are_checked_before_the_engine() -> Result<()> {
    let controller = controller();
    let mut token = import_one(&controller, rfc_token("0097123456"))?;
    let before = token.record().clone();
    let mut props = token.properties_mut();

    let cases: [(&str, i64); 5] = [
        ("last_time_shift", 100_001),
        ("last_time_shift", -100_001),
        ("event_value", 4_294_967_295),
        ("event_value", -1),
        ("last_time_used", 631_151_999),
    ];
    for (name, value) in cases {
        let err = props.set(name, value).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }), "{name}={value}");
    }
    assert_eq!(token.record(), &before);
    Ok(())
}

#[test]
fn bounds_are_inclusive() -> Result<()> {
    let controller = controller();
    let mut token = import_one(&controller, rfc_token("0097123456"))?;
    let mut props = token.properties_mut();

    props.set_last_time_shift(100_000)?;
    props.set_last_time_shift(-100_000)?;
    assert_eq!(props.last_time_shift()?, Some(-100_000));

    props.set_event_value(4_294_967_294)?;
    assert_eq!(props.event_value()?, Some(4_294_967_294));

    let when = Utc.with_ymd_and_hms(2020, 2, 29, 13, 5, 9).unwrap();
    props.set_last_time_used(when)?;
    assert_eq!(props.last_time_used()?, Some(when));
    Ok(())
}

#[test]
fn error_count_only_accepts_zero() -> Result<()> {
    let controller = controller();
    let mut token = import_one(&controller, rfc_token("0097123456"))?;
    assert!(!token.verify("000000")?);

    let err = token.properties_mut().set_error_count(1).unwrap_err();
    assert!(matches!(err, Error::InvalidWrite { .. }));
    assert_eq!(token.properties().error_count()?, Some(1));

    token.reset_error_count()?;
    assert_eq!(token.properties().error_count()?, Some(0));
    Ok(())
}

#[test]
fn pin_properties_on_a_pin_token() -> Result<()> {
    let controller = controller();
    let mut token = import_one(
        &controller,
        TokenProfile::new("GO6-0001", "GO6").with_pin("2468", 4),
    )?;
    let mut props = token.properties_mut();

    assert_eq!(props.pin_supported()?, Some(true));
    assert_eq!(props.pin_enabled()?, Some(true));
    assert_eq!(props.pin_length()?, Some(4));
    assert_eq!(props.virtual_token_type()?, None);

    props.set_pin_enabled(false)?;
    assert_eq!(props.pin_enabled()?, Some(false));

    let err = props.set_pin_minimum_length(2).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid pin_minimum_length value provided: 2, must be between 3 and 8"
    );
    props.set_pin_minimum_length(3)?;
    assert_eq!(props.pin_min_len()?, Some(3));
    Ok(())
}

#[test]
fn virtual_token_properties() -> Result<()> {
    let controller = controller();
    let mut token = import_one(
        &controller,
        TokenProfile::new("0097123456", "APPL 1").with_virtual_token("SMS"),
    )?;
    let mut props = token.properties_mut();

    assert_eq!(props.virtual_token_supported()?, Some(true));
    assert_eq!(props.virtual_token_type()?.as_deref(), Some("SMS"));

    props.set_virtual_token_remain_use(254)?;
    assert_eq!(props.virtual_token_remain_use()?, Some(254));
    assert!(matches!(
        props.set_virtual_token_remain_use(255),
        Err(Error::OutOfBounds { max: 254, .. })
    ));

    props.set_virtual_token_grace_period(1)?;
    assert!(matches!(
        props.set_virtual_token_grace_period(365),
        Err(Error::OutOfBounds { .. })
    ));
    assert!(props.virtual_token_grace_period()?.is_some());
    Ok(())
}

#[test]
fn token_status_accepts_names_and_variants_only() -> Result<()> {
    let controller = controller();
    let mut token = import_one(&controller, rfc_token("0097123456"))?;
    let mut props = token.properties_mut();

    props.set("token_status", "disabled")?;
    assert_eq!(props.primary_token_enabled()?, Some(false));
    props.set("token_status", TokenStatus::Enabled)?;
    assert_eq!(props.primary_token_enabled()?, Some(true));

    assert!(matches!(
        props.set("token_status", "paused"),
        Err(Error::InvalidWrite { .. })
    ));
    assert!(matches!(
        props.set("token_status", 3),
        Err(Error::InvalidWrite { .. })
    ));
    Ok(())
}

#[test]
fn read_only_names_and_unknown_names() -> Result<()> {
    let controller = controller();
    let mut token = import_one(&controller, rfc_token("0097123456"))?;
    let mut props = token.properties_mut();

    let err = props.set("token_model", "DP999").unwrap_err();
    assert_eq!(err.to_string(), "invalid token property token_model: read-only");

    let err = props.get("no_such_property").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid token property no_such_property: unknown name"
    );
    Ok(())
}
