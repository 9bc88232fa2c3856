//! Referral Code Value Object
//!
//! Owned by exactly one contractor. Customers enter it at registration to
//! attach their deposits to that contractor.

use kernel::error::app_error::{AppError, AppResult};
use platform::crypto::random_bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

const REFERRAL_CODE_MIN_LENGTH: usize = 3;
const REFERRAL_CODE_MAX_LENGTH: usize = 32;
const GENERATED_LENGTH: usize = 8;

/// Unambiguous alphabet for generated codes (no 0/O, 1/I)
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Upper-case referral code (`TEST2`, `PARTNER-7`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    pub fn new(code: impl AsRef<str>) -> AppResult<Self> {
        let code = code.as_ref().trim().to_ascii_uppercase();

        let len_ok = (REFERRAL_CODE_MIN_LENGTH..=REFERRAL_CODE_MAX_LENGTH).contains(&code.len());
        let chars_ok = code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !len_ok || !chars_ok {
            return Err(AppError::bad_request("Invalid referral code format")
                .with_code("INVALID_REFERRAL_CODE")
                .with_action("Check the referral code and try again"));
        }

        Ok(Self(code))
    }

    /// Random 8-character code
    pub fn generate() -> Self {
        let code = random_bytes(GENERATED_LENGTH)
            .into_iter()
            .map(|b| ALPHABET[b as usize % ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_code_normalized() {
        assert_eq!(ReferralCode::new(" test2 ").unwrap().as_str(), "TEST2");
        assert_eq!(ReferralCode::new("partner-7").unwrap().as_str(), "PARTNER-7");
    }

    #[test]
    fn test_referral_code_invalid() {
        assert!(ReferralCode::new("AB").is_err());
        assert!(ReferralCode::new("HAS SPACE").is_err());
        assert!(ReferralCode::new("x".repeat(33)).is_err());

        let err = ReferralCode::new("??").unwrap_err();
        assert_eq!(err.code(), "INVALID_REFERRAL_CODE");
    }

    #[test]
    fn test_generated_code_is_valid() {
        let code = ReferralCode::generate();
        assert_eq!(code.as_str().len(), GENERATED_LENGTH);
        assert_eq!(ReferralCode::new(code.as_str()).unwrap(), code);
    }
}
