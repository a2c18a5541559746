//! User Password Value Object
//!
//! Domain wrapper over `platform::password`: maps platform errors into
//! [`AuthError`] and keeps the "set" and "verify" paths apart.
//!
//! ```rust
//! use auth::domain::value_object::user_password::{RawPassword, UserPassword};
//!
//! let raw = RawPassword::new("correct-password!".to_string()).unwrap();
//! let hashed = UserPassword::from_raw(&raw, None).unwrap();
//! assert!(hashed.verify(&raw, None).is_ok());
//! ```

use std::fmt;

use platform::password::{ClearTextPassword, HashedPassword};

use crate::error::{AuthError, AuthResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Password being set (sign-up, password change): policy enforced
    pub fn new(raw: String) -> AuthResult<Self> {
        Ok(Self(ClearTextPassword::new(raw)?))
    }

    /// Password being checked (sign-in, old password): normalized only
    pub fn presented(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }

    fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id PHC string, safe to store
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a raw password; [`AuthError::HashingError`] on failure
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        raw.inner()
            .hash(pepper)
            .map(Self)
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| AuthError::Internal("Invalid password hash in database".to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// [`AuthError::InvalidCredential`] unless `raw` matches
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<()> {
        if self.0.verify(raw.inner(), pepper) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredential)
        }
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_password_policy() {
        assert!(RawPassword::new("ValidPass123!".to_string()).is_ok());
        assert!(matches!(
            RawPassword::new("short!".to_string()),
            Err(AuthError::PasswordValidation(_))
        ));
        assert!(matches!(
            RawPassword::new("nospecialchars".to_string()),
            Err(AuthError::PasswordValidation(_))
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("correct-password!".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();

        let presented = RawPassword::presented("correct-password!".to_string());
        assert!(hashed.verify(&presented, None).is_ok());

        let wrong = RawPassword::presented("wrong-password".to_string());
        assert!(matches!(
            hashed.verify(&wrong, None),
            Err(AuthError::InvalidCredential)
        ));
    }

    #[test]
    fn test_pepper_must_match() {
        let raw = RawPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, Some(b"pepper")).unwrap();

        assert!(hashed.verify(&raw, Some(b"pepper")).is_ok());
        assert!(hashed.verify(&raw, None).is_err());
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let raw = RawPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();

        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, None).is_ok());
        assert!(UserPassword::from_phc_string("plaintext").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::presented("SecretPassword123!".to_string());
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("Secret"));
    }
}
