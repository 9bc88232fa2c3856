//! Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use kernel::id::UserId;
use platform::crypto::random_bytes;
use rust_decimal::Decimal;

use crate::error::LedgerError;

/// Lifecycle of a deposit; leaves `Pending` exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum DepositStatus {
    #[default]
    Pending = 0,
    Completed = 1,
    Failed = 2,
    Cancelled = 3,
}

impl DepositStatus {
    pub const ALL: [DepositStatus; 4] = [
        DepositStatus::Pending,
        DepositStatus::Completed,
        DepositStatus::Failed,
        DepositStatus::Cancelled,
    ];

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use DepositStatus::*;
        match self {
            Pending => "pending",
            Completed => "completed",
            Failed => "failed",
            Cancelled => "cancelled",
        }
    }

    #[inline]
    pub const fn from_id(id: i16) -> Option<Self> {
        use DepositStatus::*;
        match id {
            0 => Some(Pending),
            1 => Some(Completed),
            2 => Some(Failed),
            3 => Some(Cancelled),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, DepositStatus::Pending)
    }
}

impl FromStr for DepositStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use DepositStatus::*;
        match s.trim() {
            "pending" => Ok(Pending),
            "completed" => Ok(Completed),
            "failed" => Ok(Failed),
            "cancelled" => Ok(Cancelled),
            other => Err(LedgerError::Validation(format!(
                "Unknown deposit status: {other}"
            ))),
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Bank transfer reference the customer puts on the SEPA payment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SepaReference(String);

/// No 0/O, 1/I: references get typed into banking apps
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERENCE_SUFFIX_LENGTH: usize = 8;

impl SepaReference {
    /// `DEP-<user id>-<8 random characters>`
    pub fn generate(user_id: UserId) -> Self {
        let suffix: String = random_bytes(REFERENCE_SUFFIX_LENGTH)
            .into_iter()
            .map(|b| REFERENCE_ALPHABET[b as usize % REFERENCE_ALPHABET.len()] as char)
            .collect();
        Self(format!("DEP-{user_id}-{suffix}"))
    }

    pub fn from_db(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SepaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maximum fractional digits accepted for a deposit amount
pub const MAX_AMOUNT_SCALE: u32 = 8;

/// Positive amount with at most [`MAX_AMOUNT_SCALE`] fractional digits
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(LedgerError::Validation(format!(
            "amount has more than {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    Ok(amount)
}
