//! Named members for token properties.
//!
//! Each getter is `get(<name>)` narrowed to the property's semantic type;
//! each setter is `set(<name>, value)`.

use super::TokenSource;
use crate::error::Result;
use crate::property::{AuthMode, PropertyAccessor, PropertySink, TokenStatus, Value};
use chrono::{DateTime, Utc};

macro_rules! getters {
    ($($name:ident: $ty:ty => $narrow:ident;)*) => {
        impl<S: TokenSource> PropertyAccessor<S> {
            $(
                #[doc = concat!("`", stringify!($name), "`, `None` when not applicable.")]
                ///
                /// # Errors
                /// Returns the same errors as [`PropertyAccessor::get`].
                pub fn $name(&self) -> Result<Option<$ty>> {
                    Ok(self.get(stringify!($name))?.and_then(|value| value.$narrow()))
                }
            )*
        }
    };
}

macro_rules! setters {
    ($($setter:ident => $name:literal: $ty:ty;)*) => {
        impl<S: TokenSource + PropertySink> PropertyAccessor<S> {
            $(
                #[doc = concat!("Writes `", $name, "`.")]
                ///
                /// # Errors
                /// Returns the same errors as [`PropertyAccessor::set`].
                pub fn $setter(&mut self, value: $ty) -> Result<()> {
                    self.set($name, Value::from(value))
                }
            )*
        }
    };
}

getters! {
    token_model: String => as_text;
    use_count: i64 => as_int;
    last_time_used: DateTime<Utc> => as_time;
    last_time_shift: i64 => as_int;
    time_based_algo: bool => as_bool;
    event_based_algo: bool => as_bool;
    pin_supported: bool => as_bool;
    unlock_supported: bool => as_bool;
    pin_ch_on: bool => as_bool;
    pin_change_enabled: bool => as_bool;
    pin_len: i64 => as_int;
    pin_length: i64 => as_int;
    pin_min_len: i64 => as_int;
    pin_minimum_length: i64 => as_int;
    pin_enabled: bool => as_bool;
    pin_ch_forced: bool => as_bool;
    pin_change_forced: bool => as_bool;
    virtual_token_type: String => as_text;
    virtual_token_grace_period: DateTime<Utc> => as_time;
    virtual_token_remain_use: i64 => as_int;
    last_response_type: String => as_text;
    error_count: i64 => as_int;
    event_value: i64 => as_int;
    last_event_value: i64 => as_int;
    sync_windows: bool => as_bool;
    primary_token_enabled: bool => as_bool;
    virtual_token_supported: bool => as_bool;
    virtual_token_enabled: bool => as_bool;
    code_word: String => as_text;
    auth_mode: AuthMode => as_mode;
    ocra_suite: String => as_text;
    derivation_supported: bool => as_bool;
    max_dtf_number: i64 => as_int;
    response_len: i64 => as_int;
    response_length: i64 => as_int;
    response_format: String => as_text;
    response_chk: bool => as_bool;
    response_checksum: bool => as_bool;
    time_step: i64 => as_int;
    use_3des: bool => as_bool;
    triple_des_used: bool => as_bool;
}

setters! {
    set_last_time_used => "last_time_used": DateTime<Utc>;
    set_last_time_shift => "last_time_shift": i64;
    set_pin_min_len => "pin_min_len": i64;
    set_pin_minimum_length => "pin_minimum_length": i64;
    set_pin_enabled => "pin_enabled": bool;
    set_pin_ch_forced => "pin_ch_forced": bool;
    set_pin_change_forced => "pin_change_forced": bool;
    set_virtual_token_grace_period => "virtual_token_grace_period": i64;
    set_virtual_token_remain_use => "virtual_token_remain_use": i64;
    set_error_count => "error_count": i64;
    set_event_value => "event_value": i64;
    set_token_status => "token_status": TokenStatus;
}
