//! Bearer Credential Extraction
//!
//! Reads `Authorization: Bearer <token>` from request headers.

use axum::http::{HeaderMap, header};

/// Authentication scheme accepted in the `Authorization` header
pub const BEARER_SCHEME: &str = "Bearer";

/// Why a bearer credential could not be extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    /// Header absent or empty
    #[error("Authorization header is missing")]
    Missing,

    /// Header present but not visible ASCII, or not exactly `<scheme> <token>`
    #[error("Authorization header is malformed")]
    Malformed,
}

/// Extract the bearer token from headers
///
/// The header value must split on single spaces into exactly two parts, the
/// first being the `Bearer` scheme (case-insensitive) and the second a
/// non-empty token. Anything else is [`BearerError::Malformed`].
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?;

    if value.is_empty() {
        return Err(BearerError::Missing);
    }

    parse_bearer(value.to_str().map_err(|_| BearerError::Malformed)?)
}

/// Parse a raw `Authorization` header value
pub fn parse_bearer(value: &str) -> Result<&str, BearerError> {
    let mut parts = value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(BearerError::Malformed);
    };

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        return Err(BearerError::Malformed);
    }

    Ok(token)
}
