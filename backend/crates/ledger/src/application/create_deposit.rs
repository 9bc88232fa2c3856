//! Create Deposit Use Case
//!
//! A customer announces a SEPA transfer. The deposit carries the customer's
//! referral linkage so settlement can attribute commission later.

use std::sync::Arc;

use auth::domain::entity::user::User;
use kernel::currency::Currency;
use rust_decimal::Decimal;

use crate::domain::entities::{Deposit, NewDeposit};
use crate::domain::repository::DepositRepository;
use crate::domain::value_objects::{SepaReference, validate_amount};
use crate::error::LedgerResult;

#[derive(Debug, Clone)]
pub struct CreateDepositInput {
    pub amount: Decimal,
    pub currency: String,
}

pub struct CreateDepositUseCase<D>
where
    D: DepositRepository,
{
    repo: Arc<D>,
}

impl<D> CreateDepositUseCase<D>
where
    D: DepositRepository,
{
    pub fn new(repo: Arc<D>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user: &User, input: CreateDepositInput) -> LedgerResult<Deposit> {
        let amount = validate_amount(input.amount)?;
        let currency = Currency::new(&input.currency)?;

        let new_deposit = NewDeposit {
            user_id: user.user_id,
            amount,
            currency,
            reference: SepaReference::generate(user.user_id),
            referral_code: user.referred_by.clone(),
            contractor_id: user.contractor_id,
        };

        let deposit = self.repo.create_deposit(&new_deposit).await?;

        tracing::info!(
            deposit_id = %deposit.deposit_id,
            user_id = %user.user_id,
            amount = %deposit.amount,
            currency = %deposit.currency,
            reference = %deposit.reference,
            "Deposit created"
        );

        Ok(deposit)
    }
}
