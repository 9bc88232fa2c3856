//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{DepositId, UserId};

use crate::domain::entities::{ContractorStats, DashboardStats, Deposit, NewDeposit, Settlement};
use crate::domain::value_objects::DepositStatus;
use crate::error::LedgerResult;

/// Deposit repository trait
#[trait_variant::make(DepositRepository: Send)]
pub trait LocalDepositRepository {
    async fn create_deposit(&self, deposit: &NewDeposit) -> LedgerResult<Deposit>;

    async fn find_deposit(&self, deposit_id: DepositId) -> LedgerResult<Option<Deposit>>;

    /// Newest first
    async fn list_user_deposits(&self, user_id: UserId) -> LedgerResult<Vec<Deposit>>;

    /// Newest first, optionally filtered by status
    async fn list_deposits(
        &self,
        status: Option<DepositStatus>,
        limit: i64,
    ) -> LedgerResult<Vec<Deposit>>;

    /// Settle atomically with the deposit row locked: resolve the contractor,
    /// apply `commission::settle`, credit the owner's balance on completion
    /// when the currencies match. `None` if the deposit does not exist.
    async fn settle_deposit(
        &self,
        deposit_id: DepositId,
        target: DepositStatus,
    ) -> LedgerResult<Option<Settlement>>;
}

/// Read-only aggregates
#[trait_variant::make(LedgerStatsRepository: Send)]
pub trait LocalLedgerStatsRepository {
    async fn contractor_stats(&self, contractor_id: UserId) -> LedgerResult<ContractorStats>;

    async fn dashboard_stats(&self) -> LedgerResult<DashboardStats>;
}

/// Everything the HTTP layer needs from a single backing store
pub trait LedgerStore:
    DepositRepository + LedgerStatsRepository + Clone + Send + Sync + 'static
{
}

impl<T> LedgerStore for T where
    T: DepositRepository + LedgerStatsRepository + Clone + Send + Sync + 'static
{
}
