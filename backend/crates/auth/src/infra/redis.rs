//! Redis Session Store
//!
//! Sessions are JSON under `session_<userID>`, one-time codes are plain
//! strings under `session_otp_<email>`. Both carry a millisecond TTL.
//! Rate limit counters live under their own prefix (`ratelimit_`).
//! Every command is bounded by the configured store timeout.

use std::future::Future;
use std::time::Duration;

use redis::AsyncCommands;
use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};
use redis::aio::MultiplexedConnection;

use crate::domain::entity::session::Session;
use crate::domain::repository::{SessionStore, otp_key, session_key};
use crate::domain::value_object::{email::Email, otp_code::OtpCode, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// PTTL reply for a missing key
const PTTL_MISSING: i64 = -2;

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    timeout: Duration,
}

impl RedisSessionStore {
    /// Open a multiplexed connection to `url`
    pub async fn connect(url: &str, timeout: Duration) -> AuthResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = match tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
        {
            Ok(conn) => conn?,
            Err(_) => return Err(AuthError::StoreTimeout),
        };

        tracing::info!("Connected to Redis session store");

        Ok(Self { conn, timeout })
    }

    /// Run one store call under the deadline
    async fn bounded<T, F>(&self, command: &'static str, fut: F) -> AuthResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => {
                tracing::warn!(
                    command,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Session store call timed out"
                );
                Err(AuthError::StoreTimeout)
            }
        }
    }

    /// Round-trip check for the health endpoint
    pub async fn ping(&self) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let _pong: String = self
            .bounded("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    async fn set_px(&self, key: String, value: String, ttl: Duration) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let ttl_ms = ttl.as_millis().max(1) as u64;
        self.bounded::<(), _>("SET", conn.pset_ex(key, value, ttl_ms))
            .await
    }

    async fn remaining_ms(&self, key: &str) -> AuthResult<i64> {
        let mut conn = self.conn.clone();
        self.bounded("PTTL", conn.pttl(key)).await
    }

    async fn del(&self, key: String) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        self.bounded::<(), _>("DEL", conn.del(key)).await
    }
}

impl SessionStore for RedisSessionStore {
    async fn put_session(&self, session: &Session, ttl: Duration) -> AuthResult<()> {
        let value = serde_json::to_string(session)?;
        self.set_px(session_key(&session.user_id), value, ttl).await
    }

    async fn get_session(&self, user_id: &UserId) -> AuthResult<Session> {
        let mut conn = self.conn.clone();
        let value: Option<String> = self
            .bounded("GET", conn.get(session_key(user_id)))
            .await?;
        let value = value.ok_or(AuthError::SessionNotFound)?;
        Ok(serde_json::from_str(&value)?)
    }

    async fn renew_session(&self, session: &Session) -> AuthResult<()> {
        let key = session_key(&session.user_id);
        let value = serde_json::to_string(session)?;

        let remaining_ms = self.remaining_ms(&key).await?;

        // XX: never recreate a key that expired after the PTTL read
        let mut set = redis::cmd("SET");
        set.arg(&key).arg(value).arg("XX");
        match remaining_ms {
            ms if ms > 0 => {
                set.arg("PX").arg(ms);
            }
            PTTL_MISSING => return Err(AuthError::SessionNotFound),
            // -1: no expiry, keep it that way; 0: expiring right now
            -1 => {}
            _ => return Err(AuthError::SessionNotFound),
        }

        let mut conn = self.conn.clone();
        let reply: Option<String> = self.bounded("SET", set.query_async(&mut conn)).await?;
        reply.map(|_| ()).ok_or(AuthError::SessionNotFound)
    }

    async fn session_ttl(&self, user_id: &UserId) -> AuthResult<Option<Duration>> {
        let remaining_ms = self.remaining_ms(&session_key(user_id)).await?;
        Ok((remaining_ms > 0).then(|| Duration::from_millis(remaining_ms as u64)))
    }

    async fn delete_session(&self, user_id: &UserId) -> AuthResult<()> {
        self.del(session_key(user_id)).await
    }

    async fn put_otp(&self, email: &Email, code: &OtpCode, ttl: Duration) -> AuthResult<()> {
        self.set_px(otp_key(email), code.as_str().to_string(), ttl)
            .await
    }

    async fn get_otp(&self, email: &Email) -> AuthResult<OtpCode> {
        let mut conn = self.conn.clone();
        let value: Option<String> = self.bounded("GET", conn.get(otp_key(email))).await?;
        OtpCode::parse(value.ok_or(AuthError::OtpNotFound)?)
    }

    async fn delete_otp(&self, email: &Email) -> AuthResult<()> {
        self.del(otp_key(email)).await
    }
}

impl RateLimitStore for RedisSessionStore {
    type Error = AuthError;

    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> AuthResult<RateLimitResult> {
        let mut conn = self.conn.clone();
        let count: u64 = self.bounded("INCR", conn.incr(key, 1)).await?;
        if count == 1 {
            self.bounded::<(), _>("PEXPIRE", conn.pexpire(key, config.window_ms()))
                .await?;
        }

        let reset_after = match self.remaining_ms(key).await? {
            ms if ms > 0 => Duration::from_millis(ms as u64),
            // -1: the first hit's PEXPIRE never landed; give the key a window
            -1 => {
                self.bounded::<(), _>("PEXPIRE", conn.pexpire(key, config.window_ms()))
                    .await?;
                config.window
            }
            _ => config.window,
        };

        Ok(config.evaluate(count, reset_after))
    }
}
