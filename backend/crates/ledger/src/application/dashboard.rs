//! Employee Dashboard Use Case

use std::sync::Arc;

use crate::domain::entities::DashboardStats;
use crate::domain::repository::LedgerStatsRepository;
use crate::error::LedgerResult;

pub struct DashboardUseCase<A>
where
    A: LedgerStatsRepository,
{
    repo: Arc<A>,
}

impl<A> DashboardUseCase<A>
where
    A: LedgerStatsRepository,
{
    pub fn new(repo: Arc<A>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> LedgerResult<DashboardStats> {
        self.repo.dashboard_stats().await
    }
}
