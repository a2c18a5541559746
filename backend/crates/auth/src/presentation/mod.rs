//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and the auth gate.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod principal;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{GateRejection, authenticate, optional_auth_session, require_auth_session};
pub use router::auth_router;
