//! Password reset keys.
//!
//! A key is `base64(json({username, email, expiryDate}))` using the standard
//! alphabet with padding. Keys carry no signature: anyone able to build the
//! JSON can build a key that parses. A successful [`ResetKeyCodec::parse`]
//! only means "well formed"; callers still check the expiry and match the
//! username/email against a stored user.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default lifetime of a reset key
pub const RESET_KEY_VALIDITY_HOURS: i64 = 24;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRequest {
    pub username: String,
    pub email: String,
    #[serde(rename = "expiryDate")]
    pub expiry: DateTime<Utc>,
}

impl ResetRequest {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

#[derive(Debug, Error)]
pub enum ResetKeyError {
    #[error("the reset key is not valid")]
    InvalidRequest,

    #[error("failed to encode reset key: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct ResetKeyCodec<C = SystemClock> {
    clock: C,
    validity: Duration,
}

impl ResetKeyCodec<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> ResetKeyCodec<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            validity: Duration::hours(RESET_KEY_VALIDITY_HOURS),
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn generate(&self, username: &str, email: &str) -> Result<String, ResetKeyError> {
        let request = ResetRequest {
            username: username.to_string(),
            email: email.to_string(),
            expiry: self.clock.now() + self.validity,
        };
        let json = serde_json::to_vec(&request)?;
        Ok(STANDARD.encode(json))
    }

    /// Decode a key without checking its expiry
    pub fn parse(&self, token: &str) -> Result<ResetRequest, ResetKeyError> {
        let bytes = STANDARD.decode(token).map_err(|e| {
            tracing::debug!("Reset key is not base64: {}", e);
            ResetKeyError::InvalidRequest
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!("Reset key payload is malformed: {}", e);
            ResetKeyError::InvalidRequest
        })
    }
}
