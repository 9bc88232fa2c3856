//! In-memory repository
//!
//! Deposits live here; users and balances are read from and written to the
//! wrapped `MemoryAuthRepository`, so both routers see the same accounts.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use auth::domain::entity::user::User;
use auth::domain::value_object::kyc_status::KycStatus;
use auth::infra::memory::MemoryAuthRepository;
use chrono::Utc;
use kernel::id::{DepositId, UserId};
use rust_decimal::Decimal;

use crate::domain::commission;
use crate::domain::entities::{
    ContractorStats, ContractorTerms, CurrencyTotal, DashboardStats, Deposit, NewDeposit,
    Settlement,
};
use crate::domain::repository::{DepositRepository, LedgerStatsRepository};
use crate::domain::value_objects::DepositStatus;
use crate::error::LedgerResult;

#[derive(Clone, Default)]
pub struct MemoryLedgerRepository {
    auth: MemoryAuthRepository,
    deposits: Arc<Mutex<BTreeMap<DepositId, Deposit>>>,
}

impl MemoryLedgerRepository {
    pub fn new(auth: MemoryAuthRepository) -> Self {
        Self {
            auth,
            deposits: Arc::default(),
        }
    }

    fn deposits(&self) -> MutexGuard<'_, BTreeMap<DepositId, Deposit>> {
        self.deposits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn deposit(&self, deposit_id: DepositId) -> Option<Deposit> {
        self.deposits().get(&deposit_id).cloned()
    }
}

fn contractor_terms(user: &User) -> Option<ContractorTerms> {
    let rate = user.contractor_commission_rate?;
    user.is_contractor.then_some(ContractorTerms {
        contractor_id: user.user_id,
        commission_rate: rate,
    })
}

fn newest_first(mut deposits: Vec<Deposit>) -> Vec<Deposit> {
    deposits.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.deposit_id.cmp(&a.deposit_id))
    });
    deposits
}

/// Completed deposits summed per currency, ordered by currency code
fn completed_totals<'a>(deposits: impl Iterator<Item = &'a Deposit>) -> Vec<CurrencyTotal> {
    let mut totals: BTreeMap<String, CurrencyTotal> = BTreeMap::new();
    for deposit in deposits.filter(|d| d.status == DepositStatus::Completed) {
        let entry = totals
            .entry(deposit.currency.to_string())
            .or_insert_with(|| CurrencyTotal {
                currency: deposit.currency.clone(),
                volume: Decimal::ZERO,
                commission: Decimal::ZERO,
            });
        entry.volume += deposit.amount;
        entry.commission += deposit.contractor_commission.unwrap_or_default();
    }
    totals.into_values().collect()
}

impl DepositRepository for MemoryLedgerRepository {
    async fn create_deposit(&self, deposit: &NewDeposit) -> LedgerResult<Deposit> {
        let mut deposits = self.deposits();
        let next = deposits
            .keys()
            .next_back()
            .map_or(1, |id| id.as_i64() + 1);
        let created = deposit
            .clone()
            .into_deposit(DepositId::from_i64(next), Utc::now());
        deposits.insert(created.deposit_id, created.clone());
        Ok(created)
    }

    async fn find_deposit(&self, deposit_id: DepositId) -> LedgerResult<Option<Deposit>> {
        Ok(self.deposit(deposit_id))
    }

    async fn list_user_deposits(&self, user_id: UserId) -> LedgerResult<Vec<Deposit>> {
        let own = self
            .deposits()
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(own))
    }

    async fn list_deposits(
        &self,
        status: Option<DepositStatus>,
        limit: i64,
    ) -> LedgerResult<Vec<Deposit>> {
        let matching = self
            .deposits()
            .values()
            .filter(|d| status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(newest_first(matching).into_iter().take(limit).collect())
    }

    async fn settle_deposit(
        &self,
        deposit_id: DepositId,
        target: DepositStatus,
    ) -> LedgerResult<Option<Settlement>> {
        // Deposit map first, then auth state; the lock pair stands in for FOR UPDATE
        let mut deposits = self.deposits();
        let Some(stored) = deposits.get_mut(&deposit_id) else {
            return Ok(None);
        };
        let mut auth = self.auth.state();

        let contractor = stored
            .contractor_id
            .and_then(|id| auth.users.get(&id))
            .and_then(contractor_terms)
            .or_else(|| {
                let code = stored.referral_code.as_ref()?;
                auth.users
                    .values()
                    .find(|u| u.referral_code.as_ref() == Some(code))
                    .and_then(contractor_terms)
            });

        let mut deposit = stored.clone();
        let transitioned = commission::settle(&mut deposit, target, contractor, Utc::now())?;
        if !transitioned {
            return Ok(Some(Settlement {
                deposit,
                transitioned: false,
                balance_credited: false,
            }));
        }

        let mut balance_credited = false;
        let owner = auth
            .users
            .get_mut(&deposit.user_id)
            .filter(|owner| owner.currency == deposit.currency);
        if let (DepositStatus::Completed, Some(owner)) = (deposit.status, owner) {
            owner.balance += deposit.amount;
            balance_credited = true;
        }

        *stored = deposit.clone();

        Ok(Some(Settlement {
            deposit,
            transitioned: true,
            balance_credited,
        }))
    }
}

impl LedgerStatsRepository for MemoryLedgerRepository {
    async fn contractor_stats(&self, contractor_id: UserId) -> LedgerResult<ContractorStats> {
        let referred_users = self
            .auth
            .state()
            .users
            .values()
            .filter(|u| u.contractor_id == Some(contractor_id))
            .count() as i64;

        let deposits = self.deposits();
        let attributed: Vec<&Deposit> = deposits
            .values()
            .filter(|d| d.contractor_id == Some(contractor_id))
            .collect();
        let count = |status: DepositStatus| {
            attributed.iter().filter(|d| d.status == status).count() as i64
        };

        Ok(ContractorStats {
            referred_users,
            pending_deposits: count(DepositStatus::Pending),
            completed_deposits: count(DepositStatus::Completed),
            totals: completed_totals(attributed.iter().copied()),
        })
    }

    async fn dashboard_stats(&self) -> LedgerResult<DashboardStats> {
        let (total_users, pending_kyc, contractors) = {
            let auth = self.auth.state();
            let count = |pred: fn(&User) -> bool| auth.users.values().filter(|u| pred(u)).count();
            (
                auth.users.len() as i64,
                count(|u| u.kyc_status == KycStatus::Pending) as i64,
                count(|u| u.is_contractor) as i64,
            )
        };

        let deposits = self.deposits();
        let deposits_by_status = DepositStatus::ALL
            .into_iter()
            .map(|status| {
                let count = deposits.values().filter(|d| d.status == status).count();
                (status, count as i64)
            })
            .collect();

        Ok(DashboardStats {
            total_users,
            pending_kyc,
            contractors,
            deposits_by_status,
            completed_volume: completed_totals(deposits.values()),
        })
    }
}
