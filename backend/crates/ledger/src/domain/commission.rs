//! Commission and settlement rules
//!
//! Pure functions; repositories call them inside their own transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::entities::{ContractorTerms, Deposit};
use crate::domain::value_objects::DepositStatus;
use crate::error::{LedgerError, LedgerResult};

/// `amount * rate`, exact, in the deposit's currency
pub fn compute(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate
}

/// Apply a settlement to a deposit.
///
/// Returns whether the deposit changed. A deposit that already left
/// `pending` is left untouched, which makes repeated callbacks harmless.
/// `contractor` is only consulted on completion.
pub fn settle(
    deposit: &mut Deposit,
    target: DepositStatus,
    contractor: Option<ContractorTerms>,
    now: DateTime<Utc>,
) -> LedgerResult<bool> {
    if !target.is_terminal() {
        return Err(LedgerError::InvalidSettlementStatus(target.to_string()));
    }

    if deposit.status.is_terminal() {
        return Ok(false);
    }

    deposit.status = target;
    deposit.settled_at = Some(now);

    if let (DepositStatus::Completed, Some(terms)) = (target, contractor) {
        deposit.contractor_id = Some(terms.contractor_id);
        deposit.contractor_commission = Some(compute(deposit.amount, terms.commission_rate));
    }

    Ok(true)
}
