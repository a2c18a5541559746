//! Outbound confirmation code delivery

use crate::domain::value_object::{email::Email, otp_code::OtpCode, user_name::UserName};
use crate::error::AuthResult;

#[trait_variant::make(CodeMailer: Send)]
pub trait LocalCodeMailer {
    /// Deliver `code` to `email`
    async fn send_confirmation_code(
        &self,
        email: &Email,
        name: &UserName,
        code: &OtpCode,
    ) -> AuthResult<()>;
}
