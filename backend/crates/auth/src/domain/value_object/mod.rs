//! Value Object Module

pub mod email;
pub mod otp_code;
pub mod otp_secret;
pub mod user_id;
pub mod user_name;
pub mod user_password;
