//! Environment configuration
//!
//! Read once at startup; everything downstream receives typed values.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use auth::{AuthConfig, TokenKeys};
use platform::crypto::from_base64;
use platform::rate_limit::RateLimitConfig;

const DEFAULT_PORT: u16 = 31113;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

pub struct ApiConfig {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub frontend_origins: String,
    pub auth: AuthConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let redis_url = required("REDIS_URL")?;

        let private_key = PathBuf::from(
            env::var("EC_PRIVATE_KEY_PATH").unwrap_or_else(|_| "ec_private_key.pem".to_string()),
        );
        let public_key = PathBuf::from(
            env::var("EC_PUBLIC_KEY_PATH").unwrap_or_else(|_| "ec_public_key.pem".to_string()),
        );
        let keys = TokenKeys::from_pem_files(&private_key, &public_key).with_context(|| {
            format!(
                "failed to load signing keys from {} and {}",
                private_key.display(),
                public_key.display()
            )
        })?;

        let mut auth = AuthConfig::new(keys);
        if let Some(hours) = optional::<u64>("TOKEN_EXP")? {
            auth = auth
                .with_session_hours(hours)
                .context("TOKEN_EXP must be a positive number of hours")?;
        }
        if let Some(minutes) = optional::<u64>("OTP_EXP")? {
            auth = auth
                .with_otp_minutes(minutes)
                .context("OTP_EXP must be a positive number of minutes")?;
        }
        let max_requests = optional::<u32>("RESEND_LIMIT_MAX")?;
        let window_secs = optional::<u64>("RESEND_LIMIT_WINDOW_SECS")?;
        if max_requests.is_some() || window_secs.is_some() {
            let limit = RateLimitConfig {
                max_requests: max_requests.unwrap_or(auth.resend_limit.max_requests),
                window: window_secs
                    .map(Duration::from_secs)
                    .unwrap_or(auth.resend_limit.window),
            };
            auth = auth
                .with_resend_limit(limit)
                .context("RESEND_LIMIT_MAX and RESEND_LIMIT_WINDOW_SECS must be positive")?;
        }
        if let Some(ms) = optional::<u64>("STORE_TIMEOUT_MS")? {
            auth = auth.with_store_timeout(Duration::from_millis(ms));
        }
        if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
            let pepper = from_base64(&pepper).context("PASSWORD_PEPPER must be base64")?;
            auth = auth.with_pepper(pepper);
        }

        Ok(Self {
            database_url,
            redis_url,
            port: optional("API_PORT")?.unwrap_or(DEFAULT_PORT),
            frontend_origins: env::var("FRONTEND_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string()),
            auth,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set in environment"))
}

fn optional<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(None),
    }
}
