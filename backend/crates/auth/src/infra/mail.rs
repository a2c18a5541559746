//! Confirmation code delivery
//!
//! Real delivery is an external collaborator. [`LogMailer`] hands the code to
//! the log pipeline so local setups can complete the confirmation flow.

use platform::crypto::fingerprint;

use crate::domain::mailer::CodeMailer;
use crate::domain::value_object::{email::Email, otp_code::OtpCode, user_name::UserName};
use crate::error::AuthResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl CodeMailer for LogMailer {
    async fn send_confirmation_code(
        &self,
        email: &Email,
        name: &UserName,
        code: &OtpCode,
    ) -> AuthResult<()> {
        tracing::info!(
            to = %email,
            name = %name,
            code = %fingerprint(code.as_str()),
            "Confirmation code queued for delivery"
        );
        tracing::debug!(to = %email, code = code.as_str(), "Confirmation code");
        Ok(())
    }
}
