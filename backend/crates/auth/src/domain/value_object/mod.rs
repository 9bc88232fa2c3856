//! Value Object Module

pub mod email;
pub mod kyc_status;
pub mod permission_type;
pub mod referral_code;
pub mod totp_secret;
pub mod user_group;
pub mod user_id;
pub mod user_password;
