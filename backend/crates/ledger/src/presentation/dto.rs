//! API DTOs (Data Transfer Objects)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ContractorAnalyticsOutput;
use crate::domain::entities::{CurrencyTotal, DashboardStats, Deposit, Settlement};
use crate::domain::value_objects::DepositStatus;

// ============================================================================
// Deposits
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDepositRequest {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub deposit_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub status: DepositStatus,
    /// Put this on the SEPA transfer
    pub reference: String,
    pub referral_code: Option<String>,
    pub contractor_id: Option<i64>,
    pub contractor_commission: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<&Deposit> for DepositResponse {
    fn from(deposit: &Deposit) -> Self {
        Self {
            deposit_id: deposit.deposit_id.as_i64(),
            user_id: deposit.user_id.as_i64(),
            amount: deposit.amount,
            currency: deposit.currency.to_string(),
            status: deposit.status,
            reference: deposit.reference.to_string(),
            referral_code: deposit.referral_code.as_ref().map(|c| c.to_string()),
            contractor_id: deposit.contractor_id.map(|id| id.as_i64()),
            contractor_commission: deposit.contractor_commission,
            created_at: deposit.created_at,
            settled_at: deposit.settled_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettleDepositRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleDepositResponse {
    #[serde(flatten)]
    pub deposit: DepositResponse,
    /// The deposit had left `pending` before this request
    pub already_settled: bool,
    pub balance_credited: bool,
}

impl From<Settlement> for SettleDepositResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            deposit: DepositResponse::from(&settlement.deposit),
            already_settled: !settlement.transitioned,
            balance_credited: settlement.balance_credited,
        }
    }
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyTotalResponse {
    pub currency: String,
    pub volume: Decimal,
    pub commission: Decimal,
}

impl From<CurrencyTotal> for CurrencyTotalResponse {
    fn from(total: CurrencyTotal) -> Self {
        Self {
            currency: total.currency.to_string(),
            volume: total.volume,
            commission: total.commission,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorAnalyticsResponse {
    pub referral_code: Option<String>,
    pub commission_rate: Option<Decimal>,
    pub referred_users: i64,
    pub pending_deposits: i64,
    pub completed_deposits: i64,
    pub totals: Vec<CurrencyTotalResponse>,
}

impl From<ContractorAnalyticsOutput> for ContractorAnalyticsResponse {
    fn from(output: ContractorAnalyticsOutput) -> Self {
        Self {
            referral_code: output.referral_code.map(|c| c.to_string()),
            commission_rate: output.commission_rate,
            referred_users: output.stats.referred_users,
            pending_deposits: output.stats.pending_deposits,
            completed_deposits: output.stats.completed_deposits,
            totals: output.stats.totals.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_users: i64,
    pub pending_kyc: i64,
    pub contractors: i64,
    /// Deposit count per status code
    pub deposits: BTreeMap<&'static str, i64>,
    pub completed_volume: Vec<CurrencyTotalResponse>,
}

impl From<DashboardStats> for DashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_users: stats.total_users,
            pending_kyc: stats.pending_kyc,
            contractors: stats.contractors,
            deposits: stats
                .deposits_by_status
                .into_iter()
                .map(|(status, count)| (status.code(), count))
                .collect(),
            completed_volume: stats.completed_volume.into_iter().map(Into::into).collect(),
        }
    }
}
