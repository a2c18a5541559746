//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod confirmation;
pub mod profile;
pub mod session;
pub mod sign_in;
pub mod sign_up;
pub mod token;

// Re-exports
pub use config::{AuthConfig, TokenKeys};
pub use confirmation::ConfirmationUseCase;
pub use profile::{ChangePasswordInput, ProfileUseCase};
pub use session::SessionService;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use token::{Claims, TokenCodec};
