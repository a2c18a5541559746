//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Password hashing (Argon2id) and password policy
//! - Cryptographic helpers (SHA-256, log-safe fingerprints, constant-time compare)
//! - Bearer credential extraction from the `Authorization` header
//! - Fixed-window rate limiting abstractions

pub mod bearer;
pub mod crypto;
pub mod password;
pub mod rate_limit;
