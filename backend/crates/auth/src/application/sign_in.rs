//! Sign In Use Case
//!
//! Authenticates a user by email and password and creates a session.

use std::sync::Arc;

use crate::application::confirmation::ConfirmationUseCase;
use crate::application::session::SessionService;
use crate::domain::mailer::CodeMailer;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    /// Bearer token for the new session
    pub token: String,
    /// False when a confirmation code was just sent instead
    pub email_confirmed: bool,
}

/// Sign in use case
pub struct SignInUseCase<S, U, M>
where
    S: SessionStore,
    U: UserRepository,
    M: CodeMailer,
{
    sessions: Arc<SessionService<S, U>>,
    user_repo: Arc<U>,
    mailer: Arc<M>,
}

impl<S, U, M> SignInUseCase<S, U, M>
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

    /// Unknown email and wrong password both yield `InvalidCredential`.
    /// An unconfirmed account still gets a session, plus a fresh code.
    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let email = Email::new(&input.email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        let password = RawPassword::presented(input.password);
        user.password
            .verify(&password, self.sessions.config().pepper())?;

        let token = self.sessions.create_session(&user).await?;

        if !user.email_confirmed {
            ConfirmationUseCase::new(
                self.sessions.clone(),
                self.user_repo.clone(),
                self.mailer.clone(),
            )
            .send_code(&user)
            .await?;

            tracing::info!(user_id = %user.user_id, "Signed in with unconfirmed email");
            return Ok(SignInOutput {
                token,
                email_confirmed: false,
            });
        }

        tracing::info!(user_id = %user.user_id, "User signed in");

        Ok(SignInOutput {
            token,
            email_confirmed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::User;
    use crate::infra::memory::{InMemoryMailer, InMemorySessionStore, InMemoryUserRepository};
    use crate::tests::fixtures;

    type UseCase = SignInUseCase<InMemorySessionStore, InMemoryUserRepository, InMemoryMailer>;

    async fn setup(
        confirmed: bool,
    ) -> (
        UseCase,
        Arc<SessionService<InMemorySessionStore, InMemoryUserRepository>>,
        Arc<InMemoryMailer>,
        User,
    ) {
        let store = Arc::new(InMemorySessionStore::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(InMemoryMailer::new());
        let mut user = fixtures::user("alice@example.com", "correct-password");
        if confirmed {
            user.confirm_email();
        }
        users.create(&user).await.unwrap();

        let sessions = Arc::new(SessionService::new(store, users.clone(), fixtures::config()));
        let use_case = SignInUseCase::new(sessions.clone(), users, mailer.clone());
        (use_case, sessions, mailer, user)
    }

    fn input(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_issues_resolvable_token() {
        let (use_case, sessions, mailer, user) = setup(true).await;

        let output = use_case
            .execute(input("alice@example.com", "correct-password"))
            .await
            .unwrap();

        assert!(output.email_confirmed);
        let session = sessions.resolve_session(&output.token).await.unwrap();
        assert_eq!(session.user_id, user.user_id);
        assert_eq!(mailer.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_the_same() {
        let (use_case, _, _, _) = setup(true).await;

        assert!(matches!(
            use_case.execute(input("bob@example.com", "correct-password")).await,
            Err(AuthError::InvalidCredential)
        ));
        assert!(matches!(
            use_case.execute(input("alice@example.com", "wrong-password")).await,
            Err(AuthError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn test_unconfirmed_email_gets_token_and_code() {
        let (use_case, sessions, mailer, user) = setup(false).await;

        let output = use_case
            .execute(input("alice@example.com", "correct-password"))
            .await
            .unwrap();

        assert!(!output.email_confirmed);
        assert!(sessions.resolve_session(&output.token).await.is_ok());
        let mailed = mailer.last_code_for(&user.email).await.unwrap();
        assert_eq!(sessions.get_otp(&user.email).await.unwrap(), Some(mailed));
    }
}
