//! Email Confirmation Use Case
//!
//! Issues one-time codes and checks them against the stored value.

use std::sync::Arc;

use platform::rate_limit::RateLimitStore;

use crate::application::session::SessionService;
use crate::domain::entity::{principal::Principal, user::User};
use crate::domain::mailer::CodeMailer;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{email::Email, otp_code::OtpCode, otp_secret::OtpSecret};
use crate::error::{AuthError, AuthResult};

pub struct ConfirmationUseCase<S, U, M>
where
    S: SessionStore,
    U: UserRepository,
    M: CodeMailer,
{
    sessions: Arc<SessionService<S, U>>,
    user_repo: Arc<U>,
    mailer: Arc<M>,
}

impl<S, U, M> ConfirmationUseCase<S, U, M>
where
    S: SessionStore,
    U: UserRepository,
    M: CodeMailer,
{
    pub fn new(sessions: Arc<SessionService<S, U>>, user_repo: Arc<U>, mailer: Arc<M>) -> Self {
        Self {
            sessions,
            user_repo,
            mailer,
        }
    }

    /// Generate a fresh code for `user`, store it and hand it to the mailer
    ///
    /// Overwrites any pending code for the same email.
    pub async fn send_code(&self, user: &User) -> AuthResult<()> {
        if user.email_confirmed {
            return Err(AuthError::EmailAlreadyConfirmed);
        }

        let secret = OtpSecret::generate(&self.sessions.config().otp_issuer, &user.email)?;
        let code = secret.current_code()?;

        self.sessions.save_otp(&user.email, &code).await?;
        self.mailer
            .send_confirmation_code(&user.email, &user.name, &code)
            .await?;

        tracing::info!(user_id = %user.user_id, "Confirmation code sent");
        Ok(())
    }

    /// Match `code` against the pending one and mark the email confirmed
    ///
    /// - nothing pending (never sent, expired or consumed): `OtpExpired`
    /// - different code: `OtpInvalid`, the pending code stays usable
    pub async fn confirm(&self, principal: &Principal, code: &OtpCode) -> AuthResult<()> {
        let mut user = self
            .user_repo
            .find_by_id(principal.user_id())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_confirmed {
            return Err(AuthError::EmailAlreadyConfirmed);
        }

        let Some(expected) = self.sessions.get_otp(&user.email).await? else {
            return Err(AuthError::OtpExpired);
        };
        if !expected.matches(code) {
            tracing::warn!(user_id = %user.user_id, "Confirmation code mismatch");
            return Err(AuthError::OtpInvalid);
        }

        user.confirm_email();
        self.user_repo.update(&user).await?;
        self.sessions.consume_otp(&user.email).await?;

        tracing::info!(user_id = %user.user_id, "Email confirmed");
        Ok(())
    }
}

impl<S, U, M> ConfirmationUseCase<S, U, M>
where
    S: SessionStore + RateLimitStore<Error = AuthError>,
    U: UserRepository,
    M: CodeMailer,
{
    /// Resend for the signed-in principal, or for `email` when anonymous
    ///
    /// Counted against the target address before any lookup, so unknown
    /// addresses spend the budget too.
    pub async fn resend(
        &self,
        principal: Option<&Principal>,
        email: Option<&str>,
    ) -> AuthResult<()> {
        let target = match principal {
            Some(principal) => Email::new(principal.email())?,
            None => Email::new(email.ok_or_else(|| {
                AuthError::Validation("An email address is required".to_string())
            })?)?,
        };
        self.sessions.check_resend_limit(&target).await?;

        let user = match principal {
            Some(principal) => self.user_repo.find_by_id(principal.user_id()).await?,
            None => self.user_repo.find_by_email(&target).await?,
        };
        let user = user.ok_or(AuthError::UserNotFound)?;

        self.send_code(&user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::{InMemoryMailer, InMemorySessionStore, InMemoryUserRepository};
    use crate::tests::fixtures;

    struct Harness {
        use_case: ConfirmationUseCase<InMemorySessionStore, InMemoryUserRepository, InMemoryMailer>,
        sessions: Arc<SessionService<InMemorySessionStore, InMemoryUserRepository>>,
        users: Arc<InMemoryUserRepository>,
        mailer: Arc<InMemoryMailer>,
        user: User,
        principal: Principal,
    }

    async fn harness() -> Harness {
        let store = Arc::new(InMemorySessionStore::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(InMemoryMailer::new());
        let user = fixtures::user("alice@example.com", "correct-password");
        users.create(&user).await.unwrap();

        let sessions = Arc::new(SessionService::new(store, users.clone(), fixtures::config()));
        let token = sessions.create_session(&user).await.unwrap();
        let principal = Principal::new(sessions.resolve_session(&token).await.unwrap());

        Harness {
            use_case: ConfirmationUseCase::new(sessions.clone(), users.clone(), mailer.clone()),
            sessions,
            users,
            mailer,
            user,
            principal,
        }
    }

    #[tokio::test]
    async fn test_send_code_stores_and_mails_same_code() {
        let h = harness().await;

        h.use_case.send_code(&h.user).await.unwrap();

        let mailed = h.mailer.last_code_for(&h.user.email).await.unwrap();
        let stored = h.sessions.get_otp(&h.user.email).await.unwrap().unwrap();
        assert_eq!(mailed, stored);
        assert_eq!(mailed.as_str().len(), 6);
    }

    #[tokio::test]
    async fn test_confirm_with_matching_code() {
        let h = harness().await;
        h.use_case.send_code(&h.user).await.unwrap();
        let code = h.mailer.last_code_for(&h.user.email).await.unwrap();

        h.use_case.confirm(&h.principal, &code).await.unwrap();

        let user = h.users.find_by_id(&h.user.user_id).await.unwrap().unwrap();
        assert!(user.email_confirmed);
        assert_eq!(h.sessions.get_otp(&h.user.email).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_pending_code() {
        let h = harness().await;
        h.use_case.send_code(&h.user).await.unwrap();
        let code = h.mailer.last_code_for(&h.user.email).await.unwrap();
        let wrong = if code.as_str() == "000000" { "111111" } else { "000000" };

        assert!(matches!(
            h.use_case
                .confirm(&h.principal, &OtpCode::parse(wrong).unwrap())
                .await,
            Err(AuthError::OtpInvalid)
        ));
        h.use_case.confirm(&h.principal, &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_confirm_without_pending_code() {
        let h = harness().await;

        assert!(matches!(
            h.use_case
                .confirm(&h.principal, &OtpCode::parse("123456").unwrap())
                .await,
            Err(AuthError::OtpExpired)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_code_expires() {
        let h = harness().await;
        h.use_case.send_code(&h.user).await.unwrap();
        let code = h.mailer.last_code_for(&h.user.email).await.unwrap();

        tokio::time::advance(h.sessions.config().otp_ttl + std::time::Duration::from_secs(1))
            .await;

        assert!(matches!(
            h.use_case.confirm(&h.principal, &code).await,
            Err(AuthError::OtpExpired)
        ));
    }

    #[tokio::test]
    async fn test_consumed_code_cannot_be_replayed() {
        let h = harness().await;
        h.use_case.send_code(&h.user).await.unwrap();
        let code = h.mailer.last_code_for(&h.user.email).await.unwrap();
        h.use_case.confirm(&h.principal, &code).await.unwrap();

        assert!(matches!(
            h.use_case.confirm(&h.principal, &code).await,
            Err(AuthError::EmailAlreadyConfirmed)
        ));
        assert!(matches!(
            h.use_case.resend(Some(&h.principal), None).await,
            Err(AuthError::EmailAlreadyConfirmed)
        ));
    }

    #[tokio::test]
    async fn test_anonymous_resend_by_email() {
        let h = harness().await;

        h.use_case
            .resend(None, Some(" Alice@Example.com "))
            .await
            .unwrap();
        assert_eq!(h.mailer.sent_count().await, 1);

        assert!(matches!(
            h.use_case.resend(None, Some("nobody@example.com")).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            h.use_case.resend(None, None).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_resend_budget_is_shared_by_both_paths() {
        let h = harness().await;
        let budget = h.sessions.config().resend_limit.max_requests as usize;

        h.use_case.resend(Some(&h.principal), None).await.unwrap();
        for _ in 1..budget {
            h.use_case
                .resend(None, Some("alice@example.com"))
                .await
                .unwrap();
        }
        assert_eq!(h.mailer.sent_count().await, budget);

        assert!(matches!(
            h.use_case.resend(Some(&h.principal), None).await,
            Err(AuthError::RateLimited { .. })
        ));
        assert_eq!(h.mailer.sent_count().await, budget);
    }
}
