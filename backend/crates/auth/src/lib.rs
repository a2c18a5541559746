//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store and repository traits
//! - `application/` - Session service, token codec and use cases
//! - `infra/` - Redis, PostgreSQL and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router and the auth gate
//!
//! ## Features
//! - Sign-up / sign-in with email + password
//! - Bearer session tokens (ES256 JWT) backed by a server-side session
//! - Email confirmation with 6-digit one-time codes
//! - Name and password changes that refresh the live session
//! - Per-address rate limit on resending confirmation codes
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - A token is honoured only if its signature verifies AND it is the one
//!   currently stored for its user; a new sign-in replaces the old token
//! - Sessions and one-time codes expire with the store TTL

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::{AuthConfig, TokenKeys};
pub use application::session::SessionService;
pub use domain::entity::principal::Principal;
pub use error::{AuthError, AuthResult};
pub use infra::{LogMailer, PgUserRepository, RedisSessionStore};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
