//! Settle Deposit Use Case
//!
//! Moves a pending deposit to `completed`, `failed` or `cancelled`. Repeated
//! calls return the deposit as it already is.

use std::sync::Arc;

use auth::domain::entity::user::User;
use kernel::id::DepositId;

use crate::domain::entities::Settlement;
use crate::domain::repository::DepositRepository;
use crate::domain::value_objects::DepositStatus;
use crate::error::{LedgerError, LedgerResult};

pub struct SettleDepositUseCase<D>
where
    D: DepositRepository,
{
    repo: Arc<D>,
}

impl<D> SettleDepositUseCase<D>
where
    D: DepositRepository,
{
    pub fn new(repo: Arc<D>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        actor: &User,
        deposit_id: DepositId,
        status: &str,
    ) -> LedgerResult<Settlement> {
        let target: DepositStatus = status.parse()?;
        if !target.is_terminal() {
            return Err(LedgerError::InvalidSettlementStatus(target.to_string()));
        }

        let settlement = self
            .repo
            .settle_deposit(deposit_id, target)
            .await?
            .ok_or(LedgerError::DepositNotFound)?;

        let deposit = &settlement.deposit;
        if settlement.transitioned {
            tracing::info!(
                actor_id = %actor.user_id,
                deposit_id = %deposit_id,
                status = %deposit.status,
                contractor_id = ?deposit.contractor_id.map(|id| id.as_i64()),
                commission = ?deposit.contractor_commission,
                balance_credited = settlement.balance_credited,
                "Deposit settled"
            );
        } else {
            tracing::info!(
                actor_id = %actor.user_id,
                deposit_id = %deposit_id,
                requested = %target,
                status = %deposit.status,
                "Deposit already settled"
            );
        }

        Ok(settlement)
    }
}
