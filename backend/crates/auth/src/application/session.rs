//! Session Service
//!
//! Single entry point for session and one-time code state. Per user:
//!
//! ```text
//! Anonymous --create_session--> Authenticated --renew_current_session--> Renewed
//!     ^                               |                                     |
//!     +--------- TTL lapse / eviction / end_session / newer sign-in -------+
//! ```

use std::sync::Arc;
use std::time::Duration;

use platform::crypto::fingerprint;
use platform::rate_limit::RateLimitStore;

use crate::application::config::AuthConfig;
use crate::application::token::{Claims, TokenCodec};
use crate::domain::entity::{principal::Principal, session::Session, user::User};
use crate::domain::repository::{SessionStore, UserRepository, resend_limit_key};
use crate::domain::value_object::{email::Email, otp_code::OtpCode, user_id::UserId};
use crate::error::{AuthError, AuthResult};

pub struct SessionService<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    store: Arc<S>,
    users: Arc<U>,
    codec: TokenCodec,
    config: Arc<AuthConfig>,
}

impl<S, U> SessionService<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    pub fn new(store: Arc<S>, users: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            users,
            codec: TokenCodec::new(config.keys.clone()),
            config,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Sign a token for `user` and store the session with the full TTL
    ///
    /// Replaces any existing session of the user, so previously issued
    /// tokens stop resolving.
    pub async fn create_session(&self, user: &User) -> AuthResult<String> {
        let token = self.codec.sign(&Claims::for_user(user))?;
        let session = Session::for_user(user, token);

        self.store
            .put_session(&session, self.config.session_ttl)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            token = %fingerprint(&session.token),
            "Session created"
        );

        Ok(session.token)
    }

    /// Find the stored session a token belongs to
    ///
    /// The signature is verified before the user id claim is used as the
    /// store key.
    ///
    /// - bad signature or algorithm: `TokenInvalid` / `UnexpectedSigningMethod`
    /// - no stored session: `SessionNotFound`
    /// - stored token differs (a newer sign-in replaced it): `TokenInvalid`
    pub async fn resolve_session(&self, token: &str) -> AuthResult<Session> {
        let claims = self.codec.verify(token)?;
        self.resolve_verified(&claims, token).await
    }

    /// Lookup half of [`Self::resolve_session`]
    ///
    /// `claims` must come from [`TokenCodec::verify`] on this same `token`.
    pub(crate) async fn resolve_verified(
        &self,
        claims: &Claims,
        token: &str,
    ) -> AuthResult<Session> {
        let session = self.store.get_session(&claims.id).await?;

        if !session.is_token(token) {
            tracing::debug!(
                user_id = %claims.id,
                token = %fingerprint(token),
                "Stale session token"
            );
            return Err(AuthError::TokenInvalid);
        }

        Ok(session)
    }

    /// Refresh the stored identity fields after a profile change
    ///
    /// Token and remaining TTL are unchanged. Refuses with `TokenInvalid` if
    /// the stored session no longer carries the principal's token, so a
    /// renewal never brings back a replaced token.
    pub async fn renew_current_session(&self, principal: &Principal) -> AuthResult<Session> {
        let user = self
            .users
            .find_by_id(principal.user_id())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let stored = self.store.get_session(principal.user_id()).await?;
        if !stored.is_token(principal.token()) {
            return Err(AuthError::TokenInvalid);
        }

        let renewed = stored.refreshed(&user);
        self.store.renew_session(&renewed).await?;

        tracing::info!(user_id = %user.user_id, "Session renewed");

        Ok(renewed)
    }

    /// Remove the principal's session (sign-out)
    ///
    /// Only deletes if the stored session is still the principal's, so a
    /// stale token cannot sign out a newer session.
    pub async fn end_session(&self, principal: &Principal) -> AuthResult<()> {
        match self.store.get_session(principal.user_id()).await {
            Ok(stored) if stored.is_token(principal.token()) => {
                self.store.delete_session(principal.user_id()).await?;
                tracing::info!(user_id = %principal.user_id(), "Session ended");
                Ok(())
            }
            Ok(_) | Err(AuthError::SessionNotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Remaining session lifetime; `None` if there is no session
    pub async fn remaining_ttl(&self, user_id: &UserId) -> AuthResult<Option<Duration>> {
        self.store.session_ttl(user_id).await
    }

    /// Store `code` for `email` with the configured one-time code TTL
    pub async fn save_otp(&self, email: &Email, code: &OtpCode) -> AuthResult<()> {
        self.store.put_otp(email, code, self.config.otp_ttl).await?;
        tracing::info!(email = %email, "Confirmation code stored");
        Ok(())
    }

    /// The pending code for `email`, `None` if never issued or expired
    pub async fn get_otp(&self, email: &Email) -> AuthResult<Option<OtpCode>> {
        match self.store.get_otp(email).await {
            Ok(code) => Ok(Some(code)),
            Err(AuthError::OtpNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Drop the pending code so it cannot be matched again
    pub async fn consume_otp(&self, email: &Email) -> AuthResult<()> {
        self.store.delete_otp(email).await
    }
}

impl<S, U> SessionService<S, U>
where
    S: SessionStore + RateLimitStore<Error = AuthError>,
    U: UserRepository,
{
    /// Count one resend for `email`; `RateLimited` once the window's budget is spent
    pub async fn check_resend_limit(&self, email: &Email) -> AuthResult<()> {
        let result = self
            .store
            .check_and_increment(&resend_limit_key(email), &self.config.resend_limit)
            .await?;

        if !result.allowed {
            tracing::warn!(email = %email, "Resend limit reached");
            return Err(AuthError::RateLimited {
                retry_after_secs: result.retry_after_secs(),
            });
        }
        Ok(())
    }
}
