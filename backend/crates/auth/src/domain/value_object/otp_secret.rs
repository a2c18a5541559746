//! One-Time Code Secret
//!
//! Time-based one-time codes (RFC 6238) used to confirm email ownership.
//! A fresh secret is generated for every code that is sent; the code itself
//! is what gets stored and compared.

use std::fmt;

use totp_rs::{Algorithm, Secret, TOTP};

use crate::domain::value_object::{email::Email, otp_code::OtpCode};
use crate::error::{AuthError, AuthResult};

/// Code length
pub const OTP_DIGITS: usize = 6;
/// Seconds per time step
pub const OTP_STEP_SECS: u64 = 30;
/// Steps accepted on either side of the current one by [`OtpSecret::verify_at`]
pub const OTP_SKEW: u8 = 1;

/// TOTP secret bound to an issuer and an account (the email address)
pub struct OtpSecret {
    totp: TOTP,
}

impl OtpSecret {
    /// Generate a new random secret (160 bits) for `account`
    pub fn generate(issuer: &str, account: &Email) -> AuthResult<Self> {
        let bytes = Secret::generate_secret()
            .to_bytes()
            .map_err(|e| AuthError::Internal(format!("Invalid one-time code secret: {e}")))?;
        Self::from_bytes(bytes, issuer, account)
    }

    /// Build from raw secret bytes (at least 128 bits)
    pub fn from_bytes(bytes: Vec<u8>, issuer: &str, account: &Email) -> AuthResult<Self> {
        let totp = TOTP::new(
            Algorithm::SHA1,
            OTP_DIGITS,
            OTP_SKEW,
            OTP_STEP_SECS,
            bytes,
            Some(issuer.to_string()),
            account.as_str().to_string(),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to create one-time code generator: {e}")))?;

        Ok(Self { totp })
    }

    /// Code for the time step containing `unix_secs`
    ///
    /// Deterministic: two calls within the same 30-second window return the
    /// same code.
    pub fn code_at(&self, unix_secs: u64) -> OtpCode {
        OtpCode::from_generated(self.totp.generate(unix_secs))
    }

    /// Code for the current time step
    pub fn current_code(&self) -> AuthResult<OtpCode> {
        self.totp
            .generate_current()
            .map(OtpCode::from_generated)
            .map_err(|e| AuthError::Internal(format!("System clock before UNIX epoch: {e}")))
    }

    /// Check `code` against the window around `unix_secs` (±[`OTP_SKEW`] steps)
    pub fn verify_at(&self, code: &OtpCode, unix_secs: u64) -> bool {
        self.totp.check(code.as_str(), unix_secs)
    }

    /// otpauth:// URI, for authenticator apps
    pub fn otpauth_url(&self) -> String {
        self.totp.get_url()
    }
}

impl fmt::Debug for OtpSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpSecret")
            .field("issuer", &self.totp.issuer)
            .field("account", &self.totp.account_name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
