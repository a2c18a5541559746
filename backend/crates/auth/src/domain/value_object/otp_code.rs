//! One-Time Code Value Object

use std::fmt;

use platform::crypto::constant_time_eq;
use serde::{Deserialize, Serialize};

use crate::domain::value_object::otp_secret::OTP_DIGITS;
use crate::error::{AuthError, AuthResult};

/// Exactly six ASCII digits
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Parse user input (surrounding whitespace ignored)
    pub fn parse(raw: impl AsRef<str>) -> AuthResult<Self> {
        let code = raw.as_ref().trim();
        if code.len() != OTP_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::Validation(format!(
                "Confirmation code must be {OTP_DIGITS} digits"
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub(crate) fn from_generated(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison
    pub fn matches(&self, other: &OtpCode) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OtpCode").field(&"******").finish()
    }
}
