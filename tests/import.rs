mod common;

use anyhow::Result;
use common::{batch, controller, rfc_token, TempFile, TRANSPORT_KEY};
use otpctl::engine::memory::{BatchFile, TokenProfile};
use otpctl::Error;
use std::fs;

#[test]
fn imports_all_tokens() -> Result<()> {
    let file = batch([
        rfc_token("0097123456"),
        TokenProfile::new("0097123457", "GO6").with_pin("1234", 4),
    ])?;
    let tokens = controller().import(file.path(), TRANSPORT_KEY)?;

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].serial(), "0097123456");
    assert_eq!(tokens[1].properties().pin_supported()?, Some(true));
    Ok(())
}

#[test]
fn static_vector_is_carried_on_every_record() -> Result<()> {
    let file = TempFile::new("json");
    BatchFile::new(TRANSPORT_KEY)
        .with_static_vector("0102030405")
        .with_token(rfc_token("1"))
        .with_token(rfc_token("2"))
        .write(file.path())?;

    let records = controller().import_records(file.path(), TRANSPORT_KEY)?;
    assert!(records
        .iter()
        .all(|record| record.static_vector.as_deref() == Some("0102030405")));
    Ok(())
}

#[test]
fn wrong_transport_key() -> Result<()> {
    let file = batch([rfc_token("0097123456")])?;
    let err = controller()
        .import(file.path(), "22222222222222222222222222222222")
        .unwrap_err();

    assert!(matches!(err, Error::Import { .. }));
    assert_eq!(err.error_code(), Some(-15));
    assert_eq!(err.to_string(), "DPXInit error -15: invalid transport key");
    Ok(())
}

#[test]
fn missing_file() {
    let file = TempFile::new("json");
    let err = controller().import(file.path(), TRANSPORT_KEY).unwrap_err();

    assert_eq!(err.error_code(), Some(-20));
    assert_eq!(err.to_string(), "DPXInit error -20: cannot open key file");
}

#[test]
fn corrupt_file_is_an_engine_error() -> Result<()> {
    let file = TempFile::new("json");
    fs::write(file.path(), br#"{"key_check": 1}"#)?;
    let err = controller().import(file.path(), TRANSPORT_KEY).unwrap_err();

    assert!(matches!(err, Error::Engine(_)));
    assert!(err.error_message().is_some());
    Ok(())
}
