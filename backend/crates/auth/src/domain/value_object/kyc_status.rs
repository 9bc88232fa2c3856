use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use kernel::error::app_error::AppError;

/// KYC verification state of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum KycStatus {
    #[default]
    NotStarted = 0,
    Pending = 1,
    Approved = 2,
    Rejected = 3,
}

impl KycStatus {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use KycStatus::*;
        match self {
            NotStarted => "not_started",
            Pending => "pending",
            Approved => "approved",
            Rejected => "rejected",
        }
    }

    #[inline]
    pub const fn from_id(id: i16) -> Option<Self> {
        use KycStatus::*;
        match id {
            0 => Some(NotStarted),
            1 => Some(Pending),
            2 => Some(Approved),
            3 => Some(Rejected),
            _ => None,
        }
    }

    /// Statuses an employee may set during review
    #[inline]
    pub const fn is_review_outcome(&self) -> bool {
        matches!(self, KycStatus::Pending | KycStatus::Approved | KycStatus::Rejected)
    }
}

impl FromStr for KycStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use KycStatus::*;
        match s.trim() {
            "not_started" => Ok(NotStarted),
            "pending" => Ok(Pending),
            "approved" => Ok(Approved),
            "rejected" => Ok(Rejected),
            other => Err(AppError::bad_request(format!("Unknown KYC status: {other}"))),
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
