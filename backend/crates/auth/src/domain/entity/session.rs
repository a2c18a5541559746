//! Session Entity
//!
//! Server-side record binding the one valid bearer token of a user to that
//! user's denormalized identity fields. One per user; a new sign-in
//! overwrites it. Lifetime is the store TTL, not a field.

use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;
use crate::domain::value_object::user_id::UserId;

/// Stored session, serialized as JSON under `session_<userID>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl Session {
    /// Session for `user` carrying `token`
    pub fn for_user(user: &User, token: String) -> Self {
        Self {
            token,
            user_id: user.user_id,
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            avatar_url: user.avatar_url.clone(),
        }
    }

    /// Same token, identity fields refreshed from `user`
    pub fn refreshed(&self, user: &User) -> Self {
        Self::for_user(user, self.token.clone())
    }

    /// Exact byte comparison against the presented bearer token
    pub fn is_token(&self, presented: &str) -> bool {
        platform::crypto::constant_time_eq(self.token.as_bytes(), presented.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{
        email::Email,
        user_name::UserName,
        user_password::{RawPassword, UserPassword},
    };

    fn user() -> User {
        let raw = RawPassword::new("correct-password!".to_string()).unwrap();
        User::new(
            UserName::new("Alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
    }

    #[test]
    fn test_refreshed_keeps_token() {
        let mut user = user();
        let session = Session::for_user(&user, "t1".to_string());

        user.set_name(UserName::new("Alice L.").unwrap());
        let refreshed = session.refreshed(&user);

        assert_eq!(refreshed.token, "t1");
        assert_eq!(refreshed.name, "Alice L.");
        assert_eq!(refreshed.user_id, session.user_id);
    }

    #[test]
    fn test_is_token_is_exact() {
        let session = Session::for_user(&user(), "abc.def.ghi".to_string());
        assert!(session.is_token("abc.def.ghi"));
        assert!(!session.is_token("abc.def.gh"));
        assert!(!session.is_token("abc.def.ghj"));
    }

    #[test]
    fn test_json_shape() {
        let session = Session::for_user(&user(), "t".to_string());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["userId"], session.user_id.to_string());
        assert_eq!(json["email"], "alice@example.com");
        assert!(json["avatarUrl"].is_null());
    }
}
