//! User Group Value Object
//!
//! Free-text role tag assigned by admins (`emp_support`, `kyc_employee`,
//! `second_admin`, `vip`, ...). Some tags grant access to the employee area
//! even when the `is_employee` flag is off.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const USER_GROUP_MAX_LENGTH: usize = 64;

/// Prefix marking a group as an employee group
pub const EMPLOYEE_GROUP_PREFIX: &str = "emp_";

/// Exact group names treated as employees
pub const EMPLOYEE_GROUPS: &[&str] = &["kyc_employee", "second_admin"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserGroup(String);

impl UserGroup {
    pub fn new(group: impl AsRef<str>) -> AppResult<Self> {
        let group = group.as_ref().trim();

        if group.is_empty() {
            return Err(AppError::bad_request("User group cannot be empty"));
        }
        if group.chars().count() > USER_GROUP_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "User group must be at most {} characters",
                USER_GROUP_MAX_LENGTH
            )));
        }
        if group.chars().any(char::is_control) {
            return Err(AppError::bad_request("User group contains invalid characters"));
        }

        Ok(Self(group.to_string()))
    }

    pub fn from_db(group: impl Into<String>) -> Self {
        Self(group.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `emp_*`, `kyc_employee` or `second_admin`
    pub fn is_employee_like(&self) -> bool {
        self.0.starts_with(EMPLOYEE_GROUP_PREFIX) || EMPLOYEE_GROUPS.contains(&self.0.as_str())
    }
}

impl fmt::Display for UserGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_like_groups() {
        for group in ["emp_support", "emp_", "kyc_employee", "second_admin"] {
            assert!(UserGroup::new(group).unwrap().is_employee_like(), "{group}");
        }
    }

    #[test]
    fn test_non_employee_groups() {
        for group in ["customer", "vip", "employee", "EMP_support", "kyc_employee_2", "admin"] {
            assert!(!UserGroup::new(group).unwrap().is_employee_like(), "{group}");
        }
    }

    #[test]
    fn test_user_group_validation() {
        assert!(UserGroup::new("   ").is_err());
        assert!(UserGroup::new("a".repeat(65)).is_err());
        assert_eq!(UserGroup::new("  emp_ops ").unwrap().as_str(), "emp_ops");
    }
}
