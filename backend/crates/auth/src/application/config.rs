//! Application Configuration
//!
//! Built once at startup and shared read-only as `Arc<AuthConfig>`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey};
use platform::rate_limit::RateLimitConfig;

use crate::error::{AuthError, AuthResult};

/// Default session lifetime (24 hours)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 3600);
/// Default one-time code lifetime (5 minutes)
pub const DEFAULT_OTP_TTL: Duration = Duration::from_secs(5 * 60);
/// Default deadline for a single session store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);
/// Issuer embedded in one-time code secrets
pub const DEFAULT_OTP_ISSUER: &str = "E-commercer.com";

/// P-256 key pair used to sign and verify session tokens
#[derive(Clone)]
pub struct TokenKeys {
    pub(crate) encoding: EncodingKey,
    pub(crate) decoding: DecodingKey,
}

impl TokenKeys {
    /// Parse PEM-encoded keys
    ///
    /// The private key must be PKCS#8 (`BEGIN PRIVATE KEY`); convert a SEC1
    /// key with `openssl pkcs8 -topk8 -nocrypt`. The public key is SPKI
    /// (`BEGIN PUBLIC KEY`).
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> AuthResult<Self> {
        let encoding = EncodingKey::from_ec_pem(private_pem)
            .map_err(|e| AuthError::Internal(format!("Invalid EC private key: {e}")))?;
        let decoding = DecodingKey::from_ec_pem(public_pem)
            .map_err(|e| AuthError::Internal(format!("Invalid EC public key: {e}")))?;
        Ok(Self { encoding, decoding })
    }

    /// Read and parse both PEM files
    pub fn from_pem_files(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> AuthResult<Self> {
        let read = |path: &Path| {
            std::fs::read(path)
                .map_err(|e| AuthError::Internal(format!("Cannot read {}: {e}", path.display())))
        };
        Self::from_pem(&read(private_path.as_ref())?, &read(public_path.as_ref())?)
    }
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("algorithm", &"ES256")
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Session lifetime, set on sign-in and preserved by renewal
    pub session_ttl: Duration,
    /// One-time code lifetime
    pub otp_ttl: Duration,
    /// Deadline for each session store call
    pub store_timeout: Duration,
    pub otp_issuer: String,
    /// Per-email budget for resending confirmation codes
    pub resend_limit: RateLimitConfig,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    pub keys: TokenKeys,
}

impl AuthConfig {
    /// Defaults for everything but the signing keys
    pub fn new(keys: TokenKeys) -> Self {
        Self {
            session_ttl: DEFAULT_SESSION_TTL,
            otp_ttl: DEFAULT_OTP_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            otp_issuer: DEFAULT_OTP_ISSUER.to_string(),
            resend_limit: RateLimitConfig::default(),
            password_pepper: None,
            keys,
        }
    }

    /// Session TTL from whole hours; zero is rejected
    pub fn with_session_hours(mut self, hours: u64) -> AuthResult<Self> {
        self.session_ttl = positive_ttl("session lifetime", hours, 3600)?;
        Ok(self)
    }

    /// One-time code TTL from whole minutes; zero is rejected
    pub fn with_otp_minutes(mut self, minutes: u64) -> AuthResult<Self> {
        self.otp_ttl = positive_ttl("one-time code lifetime", minutes, 60)?;
        Ok(self)
    }

    pub fn with_resend_limit(mut self, limit: RateLimitConfig) -> AuthResult<Self> {
        if limit.max_requests == 0 || limit.window.is_zero() {
            return Err(AuthError::Validation(
                "resend limit needs at least one request per non-empty window".to_string(),
            ));
        }
        self.resend_limit = limit;
        Ok(self)
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_pepper(mut self, pepper: Vec<u8>) -> Self {
        self.password_pepper = Some(pepper);
        self
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn positive_ttl(what: &str, units: u64, unit_secs: u64) -> AuthResult<Duration> {
    match units.checked_mul(unit_secs) {
        Some(0) => Err(AuthError::Validation(format!("{what} must be greater than zero"))),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Err(AuthError::Validation(format!("{what} is too large"))),
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_ttl", &self.session_ttl)
            .field("otp_ttl", &self.otp_ttl)
            .field("store_timeout", &self.store_timeout)
            .field("otp_issuer", &self.otp_issuer)
            .field("resend_limit", &self.resend_limit)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("keys", &self.keys)
            .finish()
    }
}
