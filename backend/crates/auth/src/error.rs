//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordPolicyError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    // ------------------------------------------------------------------
    // Credentials and tokens
    // ------------------------------------------------------------------
    /// Unknown email or wrong password (never distinguished to the caller)
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Token signing failed: {0}")]
    SigningError(#[source] jsonwebtoken::errors::Error),

    /// Bad signature, corrupt payload, or a token that is no longer the
    /// stored one for its user
    #[error("Invalid token")]
    TokenInvalid,

    #[error("Unexpected signing method: {0}")]
    UnexpectedSigningMethod(String),

    // ------------------------------------------------------------------
    // Session and one-time codes
    // ------------------------------------------------------------------
    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("One-time code not found")]
    OtpNotFound,

    #[error("One-time code does not match")]
    OtpInvalid,

    #[error("One-time code expired")]
    OtpExpired,

    /// A handler asked for the principal on a route without the gate
    #[error("User not found in request context")]
    UserNotFoundInContext,

    // ------------------------------------------------------------------
    // Account flows
    // ------------------------------------------------------------------
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Email already confirmed")]
    EmailAlreadyConfirmed,

    #[error("New name is the same as the current name")]
    NameUnchanged,

    #[error("New password is the same as the current password")]
    PasswordUnchanged,

    #[error("Invalid old password")]
    InvalidOldPassword,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Password validation failed: {0}")]
    PasswordValidation(#[from] PasswordPolicyError),

    /// Per-key request budget used up for the current window
    #[error("Too many requests. Please try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    // ------------------------------------------------------------------
    // Infrastructure
    // ------------------------------------------------------------------
    #[error("Session store did not answer in time")]
    StoreTimeout,

    #[error("Session store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredential
            | AuthError::TokenInvalid
            | AuthError::UnexpectedSigningMethod(_)
            | AuthError::SessionNotFound
            | AuthError::UserNotFoundInContext
            | AuthError::InvalidOldPassword => ErrorKind::Unauthorized,
            AuthError::OtpNotFound | AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::OtpExpired => ErrorKind::Gone,
            AuthError::UserAlreadyExists
            | AuthError::EmailAlreadyConfirmed
            | AuthError::NameUnchanged
            | AuthError::PasswordUnchanged => ErrorKind::Conflict,
            AuthError::OtpInvalid
            | AuthError::Validation(_)
            | AuthError::PasswordValidation(_) => ErrorKind::BadRequest,
            AuthError::RateLimited { .. } => ErrorKind::TooManyRequests,
            AuthError::StoreTimeout | AuthError::Store(_) => ErrorKind::ServiceUnavailable,
            AuthError::HashingError(_)
            | AuthError::SigningError(_)
            | AuthError::Database(_)
            | AuthError::Serialization(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Caller-visible problem details; server-side causes stay in the logs
    pub fn to_app_error(&self) -> AppError {
        let kind = self.kind();
        match self {
            AuthError::SessionNotFound => {
                AppError::new(kind, "Your session has expired. Please sign in again.")
                    .with_title("Session Expired")
            }
            AuthError::TokenInvalid | AuthError::UnexpectedSigningMethod(_) => {
                AppError::new(kind, "The session token is invalid. Please sign in again.")
                    .with_title("Invalid Session")
            }
            AuthError::UserNotFoundInContext => {
                AppError::new(kind, "Authentication is required to access this resource.")
                    .with_title("Unauthorized Access")
            }
            AuthError::InvalidCredential => AppError::new(
                kind,
                "Invalid credentials. Please verify your email and password and try again.",
            ),
            AuthError::OtpNotFound | AuthError::OtpExpired => AppError::new(
                kind,
                "The confirmation code has expired. Please request a new one.",
            ),
            AuthError::Validation(msg) => AppError::new(kind, msg.clone()),
            AuthError::PasswordValidation(e) => AppError::new(kind, e.to_string()),
            AuthError::StoreTimeout | AuthError::Store(_) => AppError::new(
                kind,
                "The service is temporarily unavailable. Please try again later.",
            ),
            _ if kind.is_server_error() => AppError::new(
                kind,
                "Something went wrong while processing your request. Please try again later.",
            ),
            _ => AppError::new(kind, self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Session store error");
            }
            AuthError::StoreTimeout => {
                tracing::error!("Session store timed out");
            }
            AuthError::SigningError(e) => {
                tracing::error!(error = %e, "Token signing failed");
            }
            AuthError::HashingError(msg) | AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Serialization(e) => {
                tracing::error!(error = %e, "Session payload could not be (de)serialized");
            }
            AuthError::InvalidCredential => {
                tracing::warn!("Invalid sign-in attempt");
            }
            AuthError::UnexpectedSigningMethod(alg) => {
                tracing::warn!(alg = %alg, "Token signed with unexpected algorithm");
            }
            AuthError::RateLimited { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = self.to_app_error().into_response();
        match self {
            AuthError::SessionNotFound => {
                response
                    .headers_mut()
                    .insert(SESSION_EXPIRED_HEADER, axum::http::HeaderValue::from_static("true"));
            }
            AuthError::RateLimited { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, retry_after_secs.into());
            }
            _ => {}
        }
        response
    }
}

/// Set on responses that reject a request because its session is gone
pub const SESSION_EXPIRED_HEADER: &str = "x-session-expired";

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
