//! TOTP Secret Value Object
//!
//! RFC 6238 secret for two-factor authentication (SHA-1, 6 digits, 30 s
//! step), compatible with Google Authenticator and similar apps.

use kernel::error::app_error::{AppError, AppResult};
use totp_rs::{Algorithm, Secret, TOTP};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;

/// Accepted clock drift in steps on each side (10 steps = 5 minutes)
pub const TOTP_SKEW: u8 = 10;

/// Issuer shown in authenticator apps
pub const TOTP_ISSUER: &str = "Exchange";

/// Base32-encoded TOTP secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpSecret {
    secret_base32: String,
}

impl TotpSecret {
    /// Generate a new random secret (160 bits)
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        Self {
            secret_base32: secret.to_encoded().to_string(),
        }
    }

    /// Create from a base32-encoded string (from database)
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_base32 = secret.into();
        Secret::Encoded(secret_base32.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(Self { secret_base32 })
    }

    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    fn to_totp(&self, account_name: &str) -> AppResult<TOTP> {
        let bytes = Secret::Encoded(self.secret_base32.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            bytes,
            Some(TOTP_ISSUER.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Verify a code against the current time
    pub fn verify(&self, code: &str, account_name: &str) -> AppResult<bool> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.check_current(code.trim()).unwrap_or(false))
    }

    /// Verify a code against an explicit Unix time
    pub fn verify_at(&self, code: &str, account_name: &str, unix_time: u64) -> AppResult<bool> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.check(code.trim(), unix_time))
    }

    /// Code for an explicit Unix time
    pub fn generate_at(&self, account_name: &str, unix_time: u64) -> AppResult<String> {
        Ok(self.to_totp(account_name)?.generate(unix_time))
    }

    /// QR code as base64-encoded PNG
    pub fn generate_qr_code(&self, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(account_name)?;
        totp.get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to generate QR code: {}", e)))
    }

    /// otpauth:// URL for manual entry
    pub fn get_otpauth_url(&self, account_name: &str) -> AppResult<String> {
        Ok(self.to_totp(account_name)?.get_url())
    }
}
