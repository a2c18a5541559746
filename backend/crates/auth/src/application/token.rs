//! Session Token Codec
//!
//! Compact JWS (`header.payload.signature`) signed with ES256. Tokens carry
//! no `exp`: lifetime is the session store TTL plus the equality check
//! against the stored token.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};

use crate::application::config::TokenKeys;
use crate::domain::entity::user::User;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Signed identity claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: Option<String>,
}

impl Claims {
    pub fn for_user(user: &User) -> Self {
        Self {
            id: user.user_id,
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    keys: TokenKeys,
}

impl TokenCodec {
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys }
    }

    /// Sign `claims` with the private key
    ///
    /// ECDSA signatures are randomized: signing the same claims twice gives
    /// two different tokens.
    pub fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::new(Algorithm::ES256), claims, &self.keys.encoding)
            .map_err(AuthError::SigningError)
    }

    /// Verify the signature and return the claims
    ///
    /// Non-ECDSA header algorithms fail with `UnexpectedSigningMethod`;
    /// anything else wrong with the token is `TokenInvalid`.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let header = decode_header(token).map_err(|_| AuthError::TokenInvalid)?;
        if !matches!(header.alg, Algorithm::ES256 | Algorithm::ES384) {
            return Err(AuthError::UnexpectedSigningMethod(format!("{:?}", header.alg)));
        }

        decode::<Claims>(token, &self.keys.decoding, &es256_validation())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                AuthError::TokenInvalid
            })
    }
}

/// Signature only: tokens have no registered claims
fn es256_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures;
    use jsonwebtoken::EncodingKey;

    fn claims() -> Claims {
        Claims::for_user(&fixtures::user("alice@example.com", "correct-password"))
    }

    #[test]
    fn test_sign_then_verify() {
        let codec = fixtures::codec();
        let claims = claims();

        let token = codec.sign(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify(&token).unwrap(), claims);
    }

    #[test]
    fn test_claim_names_on_the_wire() {
        let codec = fixtures::codec();
        let token = codec.sign(&claims()).unwrap();
        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);

        let json = serde_json::to_value(claims()).unwrap();
        for key in ["id", "name", "email", "avatarURL"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_signing_is_randomized() {
        let codec = fixtures::codec();
        let claims = claims();
        assert_ne!(codec.sign(&claims).unwrap(), codec.sign(&claims).unwrap());
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let other = TokenCodec::new(fixtures::other_keys());
        let token = other.sign(&claims()).unwrap();

        assert!(matches!(
            fixtures::codec().verify(&token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_hmac_token_is_unexpected_method() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims(),
            &EncodingKey::from_secret(b"guessable"),
        )
        .unwrap();

        assert!(matches!(
            fixtures::codec().verify(&token),
            Err(AuthError::UnexpectedSigningMethod(alg)) if alg == "HS256"
        ));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let codec = fixtures::codec();
        let token = codec.sign(&claims()).unwrap();
        let forged_claims = Claims {
            name: "Mallory".to_string(),
            ..claims()
        };
        let forged_payload = codec
            .sign(&forged_claims)
            .unwrap()
            .split('.')
            .nth(1)
            .unwrap()
            .to_string();

        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(matches!(codec.verify(&tampered), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let codec = fixtures::codec();
        for token in ["", "abc", "a.b.c", "a.b"] {
            assert!(matches!(codec.verify(token), Err(AuthError::TokenInvalid)));
        }
    }
}
