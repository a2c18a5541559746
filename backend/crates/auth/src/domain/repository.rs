//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use std::time::Duration;

use crate::domain::entity::{session::Session, user::User};
use crate::domain::value_object::{email::Email, otp_code::OtpCode, user_id::UserId};
use crate::error::AuthResult;

/// Store key prefix for sessions
pub const SESSION_KEY_PREFIX: &str = "session_";
/// Store key prefix for one-time codes
pub const OTP_KEY_PREFIX: &str = "session_otp_";
/// Store key prefix for resend-code counters
pub const RESEND_LIMIT_KEY_PREFIX: &str = "ratelimit_resend_";

/// `session_<userID>`
pub fn session_key(user_id: &UserId) -> String {
    format!("{SESSION_KEY_PREFIX}{user_id}")
}

/// `session_otp_<email>`
///
/// Cannot collide with [`session_key`]: a hyphenated UUID never starts
/// with `otp_`.
pub fn otp_key(email: &Email) -> String {
    format!("{OTP_KEY_PREFIX}{email}")
}

/// `ratelimit_resend_<email>`
pub fn resend_limit_key(email: &Email) -> String {
    format!("{RESEND_LIMIT_KEY_PREFIX}{email}")
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user; `UserAlreadyExists` if the email is taken
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Persist name, password, confirmation flag and avatar
    async fn update(&self, user: &User) -> AuthResult<()>;
}

/// TTL-capable key-value store holding sessions and one-time codes
///
/// Every call is awaitable I/O; implementations bound it with a deadline and
/// surface `StoreTimeout` instead of hanging.
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Store `session` under its user id for `ttl`, replacing any previous one
    async fn put_session(&self, session: &Session, ttl: Duration) -> AuthResult<()>;

    /// `SessionNotFound` if absent or expired
    async fn get_session(&self, user_id: &UserId) -> AuthResult<Session>;

    /// Re-store `session` keeping the remaining TTL of the existing entry
    ///
    /// The TTL read and the write are two calls. A concurrent renewal or
    /// sign-in in between is last-write-wins. If the entry vanished in
    /// between, `SessionNotFound`; the entry is never resurrected.
    async fn renew_session(&self, session: &Session) -> AuthResult<()>;

    /// Remaining lifetime; `None` if absent
    async fn session_ttl(&self, user_id: &UserId) -> AuthResult<Option<Duration>>;

    async fn delete_session(&self, user_id: &UserId) -> AuthResult<()>;

    /// Store `code` for `email` for `ttl`, replacing any previous code
    async fn put_otp(&self, email: &Email, code: &OtpCode, ttl: Duration) -> AuthResult<()>;

    /// `OtpNotFound` if absent or expired
    async fn get_otp(&self, email: &Email) -> AuthResult<OtpCode>;

    async fn delete_otp(&self, email: &Email) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespaces() {
        let user_id = UserId::new();
        let email = Email::new("alice@example.com").unwrap();

        assert_eq!(session_key(&user_id), format!("session_{user_id}"));
        assert_eq!(otp_key(&email), "session_otp_alice@example.com");
        assert!(!session_key(&user_id).starts_with(OTP_KEY_PREFIX));
        assert_eq!(
            resend_limit_key(&email),
            "ratelimit_resend_alice@example.com"
        );
        assert!(!resend_limit_key(&email).starts_with(SESSION_KEY_PREFIX));
    }
}
