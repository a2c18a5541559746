//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod mailer;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{principal::Principal, session::Session, user::User};
pub use mailer::CodeMailer;
pub use repository::{SessionStore, UserRepository};
