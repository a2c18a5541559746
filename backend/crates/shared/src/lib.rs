//! Shared Kernel
//!
//! Vocabulary shared by every backend crate:
//! - [`error::app_error::AppError`] - problem-details error rendered at the HTTP edge
//! - [`error::kind::ErrorKind`] - error classification mapped to HTTP status codes
//! - [`id::Id`] - typed UUID identifiers
//!
//! Keep this crate small. Anything that belongs to a single bounded context
//! lives in that context's crate.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
