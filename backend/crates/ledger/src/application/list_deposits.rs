//! Deposit listings for customers and the backoffice

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::Deposit;
use crate::domain::repository::DepositRepository;
use crate::domain::value_objects::DepositStatus;
use crate::error::LedgerResult;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

pub struct ListDepositsUseCase<D>
where
    D: DepositRepository,
{
    repo: Arc<D>,
}

impl<D> ListDepositsUseCase<D>
where
    D: DepositRepository,
{
    pub fn new(repo: Arc<D>) -> Self {
        Self { repo }
    }

    pub async fn own(&self, user_id: UserId) -> LedgerResult<Vec<Deposit>> {
        self.repo.list_user_deposits(user_id).await
    }

    /// All customers' deposits; `status` is a status code such as `pending`
    pub async fn backoffice(
        &self,
        status: Option<&str>,
        limit: Option<i64>,
    ) -> LedgerResult<Vec<Deposit>> {
        let status = status
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<DepositStatus>)
            .transpose()?;
        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);

        self.repo.list_deposits(status, limit).await
    }
}
