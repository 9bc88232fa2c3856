//! Permission Type Value Object
//!
//! Names a capability that admins grant to employees individually.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PERMISSION_TYPE_MAX_LENGTH: usize = 64;

/// Snake-case permission name (`kyc_review`, `manage_deposits`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionType(String);

impl PermissionType {
    /// Review and decide customer KYC
    pub const KYC_REVIEW: &'static str = "kyc_review";
    /// Settle pending deposits from the backoffice
    pub const MANAGE_DEPOSITS: &'static str = "manage_deposits";

    pub fn new(name: impl AsRef<str>) -> AppResult<Self> {
        let name = name.as_ref().trim();

        let valid = !name.is_empty()
            && name.len() <= PERMISSION_TYPE_MAX_LENGTH
            && name.starts_with(|c: char| c.is_ascii_lowercase())
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if !valid {
            return Err(AppError::bad_request(format!(
                "Invalid permission type: '{name}'"
            ))
            .with_action("Use a lower-case snake_case name such as kyc_review"));
        }

        Ok(Self(name.to_string()))
    }

    pub fn kyc_review() -> Self {
        Self(Self::KYC_REVIEW.to_string())
    }

    pub fn manage_deposits() -> Self {
        Self(Self::MANAGE_DEPOSITS.to_string())
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PermissionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PermissionType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionType> for String {
    fn from(value: PermissionType) -> Self {
        value.0
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
