//! Domain Entities

use auth::domain::value_object::referral_code::ReferralCode;
use chrono::{DateTime, Utc};
use kernel::currency::Currency;
use kernel::id::{DepositId, UserId};
use rust_decimal::Decimal;

use crate::domain::value_objects::{DepositStatus, SepaReference};

/// Incoming SEPA deposit of a customer
#[derive(Debug, Clone)]
pub struct Deposit {
    pub deposit_id: DepositId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: DepositStatus,
    pub reference: SepaReference,
    /// Code the depositor registered with
    pub referral_code: Option<ReferralCode>,
    /// Referring contractor, fixed at settlement
    pub contractor_id: Option<UserId>,
    /// Set only on completion with a resolved contractor
    pub contractor_commission: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Deposit before the database assigns its id
#[derive(Debug, Clone)]
pub struct NewDeposit {
    pub user_id: UserId,
    pub amount: Decimal,
    pub currency: Currency,
    pub reference: SepaReference,
    pub referral_code: Option<ReferralCode>,
    pub contractor_id: Option<UserId>,
}

impl NewDeposit {
    pub fn into_deposit(self, deposit_id: DepositId, now: DateTime<Utc>) -> Deposit {
        Deposit {
            deposit_id,
            user_id: self.user_id,
            amount: self.amount,
            currency: self.currency,
            status: DepositStatus::Pending,
            reference: self.reference,
            referral_code: self.referral_code,
            contractor_id: self.contractor_id,
            contractor_commission: None,
            created_at: now,
            settled_at: None,
        }
    }
}

/// Contractor resolved for a deposit at settlement time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractorTerms {
    pub contractor_id: UserId,
    pub commission_rate: Decimal,
}

/// Result of a settlement request
#[derive(Debug, Clone)]
pub struct Settlement {
    pub deposit: Deposit,
    /// False when the deposit had already left `pending`
    pub transitioned: bool,
    /// Owner balance credited with the amount
    pub balance_credited: bool,
}

/// Per-currency sum over completed deposits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyTotal {
    pub currency: Currency,
    pub volume: Decimal,
    pub commission: Decimal,
}

/// What a contractor sees about the customers it referred
#[derive(Debug, Clone, Default)]
pub struct ContractorStats {
    pub referred_users: i64,
    pub pending_deposits: i64,
    pub completed_deposits: i64,
    pub totals: Vec<CurrencyTotal>,
}

/// Backoffice overview
#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    pub total_users: i64,
    pub pending_kyc: i64,
    pub contractors: i64,
    /// One entry per status, zero counts included
    pub deposits_by_status: Vec<(DepositStatus, i64)>,
    pub completed_volume: Vec<CurrencyTotal>,
}
