//! Verification mail delivery seam
//!
//! Actual email delivery is handled outside this service; the default
//! implementation writes the link to the log.

use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

#[trait_variant::make(VerificationMailer: Send)]
pub trait LocalVerificationMailer {
    async fn send_verification(&self, to: &Email, link: &str) -> AuthResult<()>;
}

/// Writes verification links to the log
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl VerificationMailer for LogMailer {
    async fn send_verification(&self, to: &Email, link: &str) -> AuthResult<()> {
        tracing::info!(to = %to.masked(), link = %link, "Email verification link issued");
        Ok(())
    }
}
