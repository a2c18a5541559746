//! User Name Value Object
//!
//! Display name shown on the account. Not unique, not used for sign-in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Maximum name length in characters
pub const USER_NAME_MAX_LENGTH: usize = 75;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    /// Trim and validate: 1..=75 characters, no control characters
    pub fn new(raw: impl AsRef<str>) -> AuthResult<Self> {
        let name = raw.as_ref().trim();

        if name.is_empty() {
            return Err(AuthError::Validation("Name cannot be empty".to_string()));
        }

        let char_count = name.chars().count();
        if char_count > USER_NAME_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "Name must be at most {USER_NAME_MAX_LENGTH} characters (got {char_count})"
            )));
        }

        if name.chars().any(char::is_control) {
            return Err(AuthError::Validation(
                "Name contains invalid control characters".to_string(),
            ));
        }

        Ok(Self(name.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
