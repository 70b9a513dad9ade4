//! In-process token engine.
//!
//! Tokens are event based HOTP (RFC 4226, SHA-1, six digits). Their whole
//! mutable state lives in the record blob as base64 encoded JSON, so records
//! behave like the opaque blobs of a hardware-backed engine: callers must
//! persist them after every stateful call.

pub mod batch;

pub use batch::{key_check, BatchFile, TokenProfile};

use super::{status, Engine, EngineFault, EngineResult, LibraryVersion, TokenRecord};
use crate::property::codec::{format_timestamp, TOKEN_PROPERTIES};
use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::Path,
    sync::{PoisonError, RwLock},
};
use totp_rs::{Algorithm, TOTP};
use tracing::{debug, trace};

const OTP_DIGITS: usize = 6;
const SECONDS_PER_DAY: i64 = 86_400;

const INVALID_IMPORT_FILE: i32 = -21;
const INVALID_PROPERTY: i32 = -12;
const PIN_NOT_SUPPORTED: i32 = -31;
const INVALID_PIN: i32 = -32;
const NOT_SUPPORTED: i32 = -33;
const GENERATION_DENIED: i32 = -40;
const TOKEN_DISABLED: i32 = -41;
const CORRUPT_BLOB: i32 = -50;

const KERNEL_DEFAULTS: &[(&str, i32)] = &[
    ("ITimeWindow", 30),
    ("STimeWindow", 24),
    ("DiagLevel", 0),
    ("GMTAdjust", 0),
    ("CheckChallenge", 0),
    ("IThreshold", 3),
    ("SThreshold", 1),
    ("ChkInactDays", 0),
    ("DeriveVector", 0),
    ("SyncWindow", 6),
    ("OnLineSG", 2),
    ("EventWindow", 100),
    ("HSMSlotId", 0),
    ("StorageKeyId", 0),
    ("TransportKeyId", 0),
    ("StorageDeriveKey1", 0),
    ("StorageDeriveKey2", 0),
    ("StorageDeriveKey3", 0),
    ("StorageDeriveKey4", 0),
];

fn fault(method: &'static str, code: i32) -> EngineFault {
    EngineFault::Status { method, code }
}

fn unknown(name: &str) -> EngineFault {
    EngineFault::UnknownName {
        name: name.to_string(),
    }
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "YES" } else { "NO" };
    text.to_string()
}

fn na() -> String {
    "NA".to_string()
}

fn asctime(seconds: i64) -> String {
    format_timestamp(DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VirtualToken {
    enabled: bool,
    grace_period_days: i64,
    remain_use: i64,
}

/// Everything the engine keeps inside a record blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobState {
    seed: String,
    model: String,
    auth_mode: String,
    code_word: String,
    use_count: i64,
    last_time_used: i64,
    last_time_shift: i64,
    error_count: i64,
    event_value: i64,
    last_event_value: Option<i64>,
    last_response_type: Option<String>,
    pin_supported: bool,
    pin_enabled: bool,
    pin_change_forced: bool,
    pin_min_len: i64,
    pin: Option<String>,
    primary_enabled: bool,
    virtual_token_type: Option<String>,
    virtual_token: Option<VirtualToken>,
}

impl BlobState {
    fn from_profile(profile: &TokenProfile) -> Self {
        let virtual_token = profile.virtual_token_supported.then(|| VirtualToken {
            enabled: true,
            grace_period_days: 30,
            remain_use: 3,
        });
        Self {
            seed: profile.seed.clone(),
            model: profile.model.clone(),
            auth_mode: profile.auth_mode.clone(),
            code_word: profile.code_word.clone(),
            use_count: 0,
            last_time_used: 0,
            last_time_shift: 0,
            error_count: 0,
            event_value: 0,
            last_event_value: None,
            last_response_type: None,
            pin_supported: profile.pin_supported,
            pin_enabled: profile.pin_supported,
            pin_change_forced: false,
            pin_min_len: if profile.pin_supported {
                profile.pin_min_len
            } else {
                0
            },
            pin: profile.pin.clone(),
            primary_enabled: true,
            virtual_token_type: profile.virtual_token_type.clone(),
            virtual_token,
        }
    }

    fn load(record: &TokenRecord, method: &'static str) -> EngineResult<Self> {
        let bytes = Base64::decode_vec(&record.blob).map_err(|_| fault(method, CORRUPT_BLOB))?;
        serde_json::from_slice(&bytes).map_err(|_| fault(method, CORRUPT_BLOB))
    }

    fn store(&self, record: &mut TokenRecord, method: &'static str) -> EngineResult<()> {
        let bytes = serde_json::to_vec(self).map_err(|_| fault(method, CORRUPT_BLOB))?;
        record.blob = Base64::encode_string(&bytes);
        Ok(())
    }

    fn virtual_enabled(&self) -> bool {
        self.virtual_token.as_ref().is_some_and(|v| v.enabled)
    }

    fn active(&self) -> bool {
        self.primary_enabled || self.virtual_enabled()
    }

    fn otp(&self, counter: i64, method: &'static str) -> EngineResult<String> {
        let seed = Base64::decode_vec(&self.seed).map_err(|_| fault(method, CORRUPT_BLOB))?;
        let counter = u64::try_from(counter).map_err(|_| fault(method, CORRUPT_BLOB))?;
        let hotp = TOTP::new(Algorithm::SHA1, OTP_DIGITS, 0, 1, seed, None, String::new())
            .map_err(|_| fault(method, CORRUPT_BLOB))?;
        // With a one second step the "time" is the event counter.
        Ok(hotp.generate(counter))
    }

    fn property(&self, name: &str) -> Option<String> {
        let virtual_token = self.virtual_token.as_ref();
        let value = match name {
            "token_model" => self.model.clone(),
            "use_count" => self.use_count.to_string(),
            "last_time_used" => asctime(self.last_time_used),
            "last_time_shift" => self.last_time_shift.to_string(),
            "time_based_algo" | "unlock_supported" | "derivation_supported" => yes_no(false),
            "event_based_algo" | "sync_windows" | "use_3des" | "triple_des_used" => yes_no(true),
            "pin_supported" | "pin_ch_on" | "pin_change_enabled" => yes_no(self.pin_supported),
            "pin_len" | "pin_length" => self.pin.as_ref().map_or(0, String::len).to_string(),
            "pin_min_len" | "pin_minimum_length" => self.pin_min_len.to_string(),
            "pin_enabled" => yes_no(self.pin_supported && self.pin_enabled),
            "pin_ch_forced" | "pin_change_forced" => yes_no(self.pin_change_forced),
            "virtual_token_type" => self.virtual_token_type.clone().unwrap_or_else(na),
            "virtual_token_grace_period" => virtual_token.map_or_else(na, |v| {
                asctime(self.last_time_used + v.grace_period_days * SECONDS_PER_DAY)
            }),
            "virtual_token_remain_use" => {
                virtual_token.map_or_else(na, |v| v.remain_use.to_string())
            }
            "last_response_type" => self.last_response_type.clone().unwrap_or_else(na),
            "error_count" => self.error_count.to_string(),
            "event_value" => self.event_value.to_string(),
            "last_event_value" => self.last_event_value.map_or_else(na, |v| v.to_string()),
            "primary_token_enabled" => yes_no(self.primary_enabled),
            "virtual_token_supported" => yes_no(virtual_token.is_some()),
            "virtual_token_enabled" => yes_no(self.virtual_enabled()),
            "code_word" => self.code_word.clone(),
            "auth_mode" => self.auth_mode.clone(),
            "ocra_suite" | "max_dtf_number" | "time_step" => na(),
            "response_len" | "response_length" => OTP_DIGITS.to_string(),
            "response_format" => "DECIMAL".to_string(),
            "response_chk" | "response_checksum" => yes_no(false),
            _ => return None,
        };
        Some(value)
    }
}

/// Engine implementation backed by process memory and JSON batch files.
#[derive(Debug)]
pub struct MemoryEngine {
    params: RwLock<Vec<(String, i32)>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: RwLock::new(
                KERNEL_DEFAULTS
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), *value))
                    .collect(),
            ),
        }
    }

    fn param(&self, name: &str) -> Option<i32> {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    fn now(&self) -> i64 {
        Utc::now().timestamp() + i64::from(self.param("GMTAdjust").unwrap_or(0))
    }

    fn record(profile: &TokenProfile, static_vector: Option<&String>) -> EngineResult<TokenRecord> {
        let state = BlobState::from_profile(profile);
        let mut record = TokenRecord {
            serial: profile.serial.clone(),
            app_name: format!("{:<12}", profile.app_name),
            blob: String::new(),
            flags1: profile.flags1,
            flags2: profile.flags2,
            static_vector: static_vector.cloned(),
        };
        state.store(&mut record, "DPXGetToken")?;
        Ok(record)
    }

    /// Searches the event window for `otp`, returning the matching counter.
    fn find(&self, state: &BlobState, otp: &str) -> EngineResult<Option<i64>> {
        if otp.len() != OTP_DIGITS || !otp.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }
        let window = i64::from(self.param("EventWindow").unwrap_or(0).max(1));
        for counter in state.event_value..state.event_value + window {
            if state.otp(counter, "VerifyPassword")? == otp {
                return Ok(Some(counter));
            }
        }
        Ok(None)
    }
}

impl Engine for MemoryEngine {
    fn library_version(&self) -> EngineResult<LibraryVersion> {
        Ok(LibraryVersion {
            version: env!("CARGO_PKG_VERSION").to_string(),
            bitness: usize::BITS.to_string(),
            kind: "memory".to_string(),
        })
    }

    fn error_message(&self, code: i32) -> String {
        let message = match code {
            status::VALIDATION_FAILED => "Validation Failed",
            status::TOKEN_LOCKED => "Token locked, validation not performed",
            status::INVALID_TRANSPORT_KEY => "Invalid transport key",
            status::CANNOT_OPEN_FILE => "Cannot open import file",
            INVALID_IMPORT_FILE => "Invalid import file format",
            INVALID_PROPERTY => "Property not applicable to this operation",
            status::INVALID_VALUE => "Property value out of range",
            PIN_NOT_SUPPORTED => "Static password not supported",
            INVALID_PIN => "Invalid static password length",
            NOT_SUPPORTED => "Feature not supported by this token",
            GENERATION_DENIED => "Password generation not allowed for this application",
            TOKEN_DISABLED => "Token disabled",
            CORRUPT_BLOB => "Corrupted token data",
            _ => return format!("Unknown error {code}"),
        };
        message.to_string()
    }

    fn import(&self, path: &Path, transport_key: &str) -> EngineResult<Vec<TokenRecord>> {
        let contents =
            fs::read_to_string(path).map_err(|_| fault("DPXInit", status::CANNOT_OPEN_FILE))?;
        let batch: BatchFile = serde_json::from_str(&contents)
            .map_err(|_| fault("DPXInit", INVALID_IMPORT_FILE))?;
        if batch.key_check != key_check(transport_key) {
            return Err(fault("DPXInit", status::INVALID_TRANSPORT_KEY));
        }

        trace!(path = %path.display(), tokens = batch.tokens.len(), "batch decoded");

        batch
            .tokens
            .iter()
            .map(|profile| Self::record(profile, batch.static_vector.as_ref()))
            .collect()
    }

    fn kernel_property_names(&self) -> Vec<String> {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn get_kernel_param(&self, name: &str) -> EngineResult<i32> {
        self.param(name).ok_or_else(|| unknown(name))
    }

    fn set_kernel_param(&self, name: &str, value: i32) -> EngineResult<()> {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        let slot = params
            .iter_mut()
            .find(|(key, _)| key == name)
            .ok_or_else(|| unknown(name))?;
        slot.1 = value;
        Ok(())
    }

    fn token_property_names(&self) -> Vec<String> {
        TOKEN_PROPERTIES
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect()
    }

    fn get_token_property(&self, token: &TokenRecord, name: &str) -> EngineResult<String> {
        const METHOD: &str = "GetTokenProperty";
        let state = BlobState::load(token, METHOD)?;
        match state.property(name) {
            Some(value) => Ok(value),
            None if TOKEN_PROPERTIES.iter().any(|(known, _)| *known == name) => {
                Err(fault(METHOD, INVALID_PROPERTY))
            }
            None => Err(unknown(name)),
        }
    }

    fn set_token_property(
        &self,
        token: &mut TokenRecord,
        name: &str,
        value: i64,
    ) -> EngineResult<()> {
        const METHOD: &str = "SetTokenProperty";
        let mut state = BlobState::load(token, METHOD)?;

        let require_pin = |state: &BlobState| {
            if state.pin_supported {
                Ok(())
            } else {
                Err(fault(METHOD, PIN_NOT_SUPPORTED))
            }
        };

        match name {
            "last_time_used" => state.last_time_used = value,
            "last_time_shift" => state.last_time_shift = value,
            "error_count" => state.error_count = value,
            "event_value" => state.event_value = value,
            "pin_enabled" => {
                require_pin(&state)?;
                state.pin_enabled = match value {
                    1 => true,
                    2 => false,
                    _ => return Err(fault(METHOD, status::INVALID_VALUE)),
                };
            }
            "pin_ch_forced" | "pin_change_forced" => {
                require_pin(&state)?;
                state.pin_change_forced = true;
            }
            "pin_min_len" | "pin_minimum_length" => {
                require_pin(&state)?;
                state.pin_min_len = value;
            }
            "virtual_token_grace_period" | "virtual_token_remain_use" => {
                let virtual_token = state
                    .virtual_token
                    .as_mut()
                    .ok_or_else(|| fault(METHOD, NOT_SUPPORTED))?;
                if name == "virtual_token_remain_use" {
                    virtual_token.remain_use = value;
                } else {
                    virtual_token.grace_period_days = value;
                }
            }
            "token_status" => {
                let (primary, backup) = match value {
                    0 => (false, false),
                    1 => (true, false),
                    2 => (false, true),
                    3 => (true, true),
                    _ => return Err(fault(METHOD, status::INVALID_VALUE)),
                };
                match state.virtual_token.as_mut() {
                    Some(virtual_token) => virtual_token.enabled = backup,
                    None if value == 2 => return Err(fault(METHOD, NOT_SUPPORTED)),
                    None => {}
                }
                state.primary_enabled = primary;
            }
            _ if TOKEN_PROPERTIES.iter().any(|(known, _)| *known == name) => {
                return Err(fault(METHOD, INVALID_PROPERTY))
            }
            _ => return Err(unknown(name)),
        }

        state.store(token, METHOD)
    }

    fn set_token_pin(&self, token: &mut TokenRecord, pin: &str) -> EngineResult<()> {
        const METHOD: &str = "ChangeStaticPassword";
        let mut state = BlobState::load(token, METHOD)?;
        if !state.pin_supported {
            return Err(fault(METHOD, PIN_NOT_SUPPORTED));
        }
        let len = i64::try_from(pin.len()).unwrap_or(i64::MAX);
        if len < state.pin_min_len || len > 8 {
            return Err(fault(METHOD, INVALID_PIN));
        }
        state.pin = Some(pin.to_string());
        state.pin_enabled = true;
        state.pin_change_forced = false;
        state.store(token, METHOD)
    }

    fn reset_token_info(&self, token: &mut TokenRecord) -> EngineResult<()> {
        const METHOD: &str = "ResetTokenInfo";
        let mut state = BlobState::load(token, METHOD)?;
        state.error_count = 0;
        state.last_time_shift = 0;
        state.store(token, METHOD)
    }

    fn generate_otp(&self, token: &mut TokenRecord) -> EngineResult<String> {
        const METHOD: &str = "GenPassword";
        let state = BlobState::load(token, METHOD)?;
        if matches!(state.auth_mode.as_str(), "CR" | "SG") {
            return Err(fault(METHOD, GENERATION_DENIED));
        }
        if !state.active() {
            return Err(fault(METHOD, TOKEN_DISABLED));
        }
        state.otp(state.event_value, METHOD)
    }

    fn verify_otp(&self, token: &mut TokenRecord, candidate: &str) -> EngineResult<()> {
        const METHOD: &str = "VerifyPassword";
        let mut state = BlobState::load(token, METHOD)?;
        if !state.active() {
            return Err(fault(METHOD, TOKEN_DISABLED));
        }

        let threshold = i64::from(self.param("IThreshold").unwrap_or(0));
        if state.error_count >= threshold {
            state.error_count += 1;
            state.store(token, METHOD)?;
            return Err(fault(METHOD, status::TOKEN_LOCKED));
        }

        let otp = match (&state.pin, state.pin_supported && state.pin_enabled) {
            (Some(pin), true) => candidate.strip_prefix(pin.as_str()),
            _ => Some(candidate),
        };
        let matched = match otp {
            Some(otp) => self.find(&state, otp)?,
            None => None,
        };

        let Some(counter) = matched else {
            state.error_count += 1;
            debug!(serial = %token.serial, errors = state.error_count, "otp rejected");
            state.store(token, METHOD)?;
            return Err(fault(METHOD, status::VALIDATION_FAILED));
        };

        state.error_count = 0;
        state.use_count += 1;
        state.last_time_used = self.now();
        state.last_event_value = Some(counter);
        state.event_value = counter + 1;
        state.last_response_type = Some("RESPONSE".to_string());
        state.store(token, METHOD)
    }
}
