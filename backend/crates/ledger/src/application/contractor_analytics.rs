//! Contractor Analytics Use Case

use std::sync::Arc;

use auth::domain::entity::user::User;
use auth::domain::value_object::referral_code::ReferralCode;
use rust_decimal::Decimal;

use crate::domain::entities::ContractorStats;
use crate::domain::repository::LedgerStatsRepository;
use crate::error::LedgerResult;

#[derive(Debug, Clone)]
pub struct ContractorAnalyticsOutput {
    pub referral_code: Option<ReferralCode>,
    pub commission_rate: Option<Decimal>,
    pub stats: ContractorStats,
}

pub struct ContractorAnalyticsUseCase<A>
where
    A: LedgerStatsRepository,
{
    repo: Arc<A>,
}

impl<A> ContractorAnalyticsUseCase<A>
where
    A: LedgerStatsRepository,
{
    pub fn new(repo: Arc<A>) -> Self {
        Self { repo }
    }

    /// Summary for the signed-in contractor
    pub async fn execute(&self, contractor: &User) -> LedgerResult<ContractorAnalyticsOutput> {
        let stats = self.repo.contractor_stats(contractor.user_id).await?;

        Ok(ContractorAnalyticsOutput {
            referral_code: contractor.referral_code.clone(),
            commission_rate: contractor.contractor_commission_rate,
            stats,
        })
    }
}
