//! OTP generation, verification, lockout and activation.

use super::Token;
use crate::engine::{status, EngineFault};
use crate::error::{translate, Entity, Error, ErrorRecord, Feature, Result};
use crate::property::TokenStatus;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Outcome of checking a candidate OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Accepted,
    /// The candidate did not match.
    Rejected(ErrorRecord),
    /// The error counter is at the lockout threshold; the candidate was not
    /// checked.
    Locked(ErrorRecord),
}

impl Verification {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Lifecycle state derived from token properties and the kernel threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Active(TokenStatus),
    Disabled,
    Locked,
}

impl Token {
    /// Generates the current OTP for the token.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] if the token mode forbids local generation.
    #[instrument(skip(self), fields(serial = %self.record.serial))]
    pub fn generate(&mut self) -> Result<String> {
        let engine = self.controller.engine();
        engine
            .generate_otp(&mut self.record)
            .map_err(|fault| translate(engine, Entity::Token, fault))
    }

    /// Submits `candidate` to the engine and classifies the answer.
    ///
    /// Counters in the record change whatever the outcome.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] for failures other than a mismatch or a
    /// lockout.
    #[instrument(skip(self, candidate), fields(serial = %self.record.serial))]
    pub fn check(&mut self, candidate: &str) -> Result<Verification> {
        let engine = self.controller.engine();
        match engine.verify_otp(&mut self.record, candidate) {
            Ok(()) => {
                debug!("otp accepted");
                Ok(Verification::Accepted)
            }
            Err(EngineFault::Status { method, code }) if code == status::VALIDATION_FAILED => {
                debug!("otp rejected");
                Ok(Verification::Rejected(ErrorRecord::from_status(
                    engine, method, code,
                )))
            }
            Err(EngineFault::Status { method, code }) if code == status::TOKEN_LOCKED => {
                warn!("token locked, otp not checked");
                Ok(Verification::Locked(ErrorRecord::from_status(
                    engine, method, code,
                )))
            }
            Err(fault) => Err(translate(engine, Entity::Token, fault)),
        }
    }

    /// `true` if `candidate` is accepted. Mismatches and lockouts are `false`.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] for any other engine failure.
    pub fn verify(&mut self, candidate: &str) -> Result<bool> {
        Ok(self.check(candidate)?.is_accepted())
    }

    /// Like [`Token::verify`], but a rejection is an error.
    ///
    /// # Errors
    /// * [`Error::ValidationFailed`] when the candidate does not match.
    /// * [`Error::Locked`] when the token is locked out.
    /// * [`Error::Engine`] for any other engine failure.
    pub fn verify_strict(&mut self, candidate: &str) -> Result<()> {
        match self.check(candidate)? {
            Verification::Accepted => Ok(()),
            Verification::Rejected(record) => Err(Error::ValidationFailed(record)),
            Verification::Locked(record) => Err(Error::Locked {
                serial: self.record.serial.clone(),
                record,
            }),
        }
    }

    /// Clears the error counter and the time shift, unlocking the token.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] if the engine refuses.
    #[instrument(skip(self), fields(serial = %self.record.serial))]
    pub fn reset(&mut self) -> Result<()> {
        let engine = self.controller.engine();
        engine
            .reset_token_info(&mut self.record)
            .map_err(|fault| translate(engine, Entity::Token, fault))?;
        info!("token reset");
        Ok(())
    }

    /// Clears only the error counter.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] if the engine refuses.
    pub fn reset_error_count(&mut self) -> Result<()> {
        self.properties_mut().set_error_count(0)
    }

    /// # Errors
    /// Returns [`Error::Engine`] if the engine refuses.
    pub fn disable(&mut self) -> Result<()> {
        self.set_status(TokenStatus::Disabled)
    }

    /// # Errors
    /// Returns [`Error::Engine`] if the engine refuses.
    pub fn enable_primary_only(&mut self) -> Result<()> {
        self.set_status(TokenStatus::PrimaryOnly)
    }

    /// # Errors
    /// Returns [`Error::Engine`] if the token has no backup (virtual) token.
    pub fn enable_backup_only(&mut self) -> Result<()> {
        self.set_status(TokenStatus::BackupOnly)
    }

    /// # Errors
    /// Returns [`Error::Engine`] if the engine refuses.
    pub fn enable(&mut self) -> Result<()> {
        self.set_status(TokenStatus::Enabled)
    }

    fn set_status(&mut self, activation: TokenStatus) -> Result<()> {
        self.properties_mut().set_token_status(activation)?;
        info!(serial = %self.record.serial, %activation, "token status changed");
        Ok(())
    }

    /// Which of the primary and backup tokens currently accept OTPs.
    ///
    /// # Errors
    /// Returns an error if the activation properties cannot be read.
    pub fn activation(&self) -> Result<TokenStatus> {
        let props = self.properties();
        let primary = props.primary_token_enabled()?.unwrap_or(false);
        let backup = props.virtual_token_enabled()?.unwrap_or(false);
        Ok(match (primary, backup) {
            (false, false) => TokenStatus::Disabled,
            (true, false) => TokenStatus::PrimaryOnly,
            (false, true) => TokenStatus::BackupOnly,
            (true, true) => TokenStatus::Enabled,
        })
    }

    /// # Errors
    /// Returns an error if the properties or the kernel threshold cannot be
    /// read.
    pub fn state(&self) -> Result<TokenState> {
        let errors = self.properties().error_count()?.unwrap_or(0);
        if errors >= self.controller.kernel().lockout_threshold()? {
            return Ok(TokenState::Locked);
        }
        Ok(match self.activation()? {
            TokenStatus::Disabled => TokenState::Disabled,
            activation => TokenState::Active(activation),
        })
    }

    fn require_pin(&self) -> Result<()> {
        if self.properties().pin_supported()?.unwrap_or(false) {
            Ok(())
        } else {
            Err(Error::UnsupportedFeature {
                serial: self.record.serial.clone(),
                feature: Feature::Pin,
            })
        }
    }

    /// Changes the static password.
    ///
    /// # Errors
    /// * [`Error::UnsupportedFeature`] if the token has no PIN.
    /// * [`Error::InvalidWrite`] for empty or non-numeric PINs.
    /// * [`Error::Engine`] if the engine refuses the PIN.
    #[instrument(skip(self, pin), fields(serial = %self.record.serial))]
    pub fn set_pin(&mut self, pin: &str) -> Result<()> {
        self.require_pin()?;
        if pin.is_empty() || !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidWrite {
                entity: Entity::Token,
                name: "pin".to_string(),
                value: "*".repeat(pin.chars().count()),
                allowed: "a non-empty string of digits".to_string(),
            });
        }
        let engine = self.controller.engine();
        engine
            .set_token_pin(&mut self.record, pin)
            .map_err(|fault| translate(engine, Entity::Token, fault))
    }

    /// # Errors
    /// Returns [`Error::UnsupportedFeature`] if the token has no PIN.
    pub fn enable_pin(&mut self) -> Result<()> {
        self.require_pin()?;
        self.properties_mut().set_pin_enabled(true)
    }

    /// # Errors
    /// Returns [`Error::UnsupportedFeature`] if the token has no PIN.
    pub fn disable_pin(&mut self) -> Result<()> {
        self.require_pin()?;
        self.properties_mut().set_pin_enabled(false)
    }

    /// Makes the user change the PIN at the next login.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedFeature`] if the token has no PIN.
    pub fn force_pin_change(&mut self) -> Result<()> {
        self.require_pin()?;
        self.properties_mut().set_pin_change_forced(true)
    }
}
