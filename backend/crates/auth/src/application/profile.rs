//! Profile Use Case
//!
//! Name and password changes for the signed-in user. Each change is
//! persisted first, then copied into the live session.

use std::sync::Arc;

use crate::application::session::SessionService;
use crate::domain::entity::{principal::Principal, session::Session, user::User};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Password change input
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub struct ProfileUseCase<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    sessions: Arc<SessionService<S, U>>,
    user_repo: Arc<U>,
}

impl<S, U> ProfileUseCase<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    pub fn new(sessions: Arc<SessionService<S, U>>, user_repo: Arc<U>) -> Self {
        Self {
            sessions,
            user_repo,
        }
    }

    pub async fn update_name(&self, principal: &Principal, name: &str) -> AuthResult<Session> {
        let name = UserName::new(name)?;
        let mut user = self.load(principal).await?;

        if user.name == name {
            return Err(AuthError::NameUnchanged);
        }

        user.set_name(name);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "User name updated");

        self.sessions.renew_current_session(principal).await
    }

    pub async fn update_password(
        &self,
        principal: &Principal,
        input: ChangePasswordInput,
    ) -> AuthResult<Session> {
        if input.new_password != input.confirm_password {
            return Err(AuthError::Validation(
                "Password confirmation does not match".to_string(),
            ));
        }
        let new_password = RawPassword::new(input.new_password)?;

        let mut user = self.load(principal).await?;
        let pepper = self.sessions.config().pepper();

        user.password
            .verify(&RawPassword::presented(input.old_password), pepper)
            .map_err(|e| match e {
                AuthError::InvalidCredential => AuthError::InvalidOldPassword,
                other => other,
            })?;

        if user.password.verify(&new_password, pepper).is_ok() {
            return Err(AuthError::PasswordUnchanged);
        }

        user.set_password(UserPassword::from_raw(&new_password, pepper)?);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "User password updated");

        self.sessions.renew_current_session(principal).await
    }

    async fn load(&self, principal: &Principal) -> AuthResult<User> {
        self.user_repo
            .find_by_id(principal.user_id())
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::{InMemorySessionStore, InMemoryUserRepository};
    use crate::tests::fixtures;

    struct Harness {
        use_case: ProfileUseCase<InMemorySessionStore, InMemoryUserRepository>,
        sessions: Arc<SessionService<InMemorySessionStore, InMemoryUserRepository>>,
        users: Arc<InMemoryUserRepository>,
        user: User,
        principal: Principal,
    }

    async fn harness() -> Harness {
        let store = Arc::new(InMemorySessionStore::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let user = fixtures::user("alice@example.com", "Wonderland#1");
        users.create(&user).await.unwrap();

        let sessions = Arc::new(SessionService::new(store, users.clone(), fixtures::config()));
        let token = sessions.create_session(&user).await.unwrap();
        let principal = Principal::new(sessions.resolve_session(&token).await.unwrap());

        Harness {
            use_case: ProfileUseCase::new(sessions.clone(), users.clone()),
            sessions,
            users,
            user,
            principal,
        }
    }

    fn change(old: &str, new: &str) -> ChangePasswordInput {
        ChangePasswordInput {
            old_password: old.to_string(),
            new_password: new.to_string(),
            confirm_password: new.to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_name_renews_session() {
        let h = harness().await;

        let session = h
            .use_case
            .update_name(&h.principal, "  Alice Liddell ")
            .await
            .unwrap();

        assert_eq!(session.name, "Alice Liddell");
        assert_eq!(session.token, h.principal.token());
        let resolved = h.sessions.resolve_session(h.principal.token()).await.unwrap();
        assert_eq!(resolved.name, "Alice Liddell");
        let user = h.users.find_by_id(&h.user.user_id).await.unwrap().unwrap();
        assert_eq!(user.name.as_str(), "Alice Liddell");
    }

    #[tokio::test]
    async fn test_same_name_is_rejected() {
        let h = harness().await;
        let current = h.user.name.as_str().to_string();

        assert!(matches!(
            h.use_case.update_name(&h.principal, &current).await,
            Err(AuthError::NameUnchanged)
        ));
    }

    #[tokio::test]
    async fn test_update_name_uses_sign_up_length_limit() {
        use crate::domain::value_object::user_name::USER_NAME_MAX_LENGTH;

        let h = harness().await;

        let too_long = "a".repeat(USER_NAME_MAX_LENGTH + 1);
        assert!(matches!(
            h.use_case.update_name(&h.principal, &too_long).await,
            Err(AuthError::Validation(_))
        ));
        let user = h.users.find_by_id(&h.user.user_id).await.unwrap().unwrap();
        assert_eq!(user.name, h.user.name);

        let longest = "a".repeat(USER_NAME_MAX_LENGTH);
        let session = h.use_case.update_name(&h.principal, &longest).await.unwrap();
        assert_eq!(session.name.chars().count(), 75);
    }

    #[tokio::test]
    async fn test_update_password() {
        let h = harness().await;

        h.use_case
            .update_password(&h.principal, change("Wonderland#1", "Looking-Glass?2"))
            .await
            .unwrap();

        let user = h.users.find_by_id(&h.user.user_id).await.unwrap().unwrap();
        let pepper = h.sessions.config().pepper();
        assert!(user
            .password
            .verify(&RawPassword::presented("Looking-Glass?2".to_string()), pepper)
            .is_ok());
        assert!(h.sessions.resolve_session(h.principal.token()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_password_failures() {
        let h = harness().await;

        assert!(matches!(
            h.use_case
                .update_password(&h.principal, change("Wrong#pass1", "Looking-Glass?2"))
                .await,
            Err(AuthError::InvalidOldPassword)
        ));
        assert!(matches!(
            h.use_case
                .update_password(&h.principal, change("Wonderland#1", "Wonderland#1"))
                .await,
            Err(AuthError::PasswordUnchanged)
        ));
        assert!(matches!(
            h.use_case
                .update_password(&h.principal, change("Wonderland#1", "no-special-char"))
                .await,
            Err(AuthError::PasswordValidation(_))
        ));

        let mut mismatched = change("Wonderland#1", "Looking-Glass?2");
        mismatched.confirm_password = "Looking-Glass?3".to_string();
        assert!(matches!(
            h.use_case.update_password(&h.principal, mismatched).await,
            Err(AuthError::Validation(_))
        ));
    }
}
