//! Contractor Promotion Use Case
//!
//! Admins turn the contractor role on or off. A contractor owns exactly one
//! referral code and a commission rate in `[0, 1]`.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{referral_code::ReferralCode, user_id::UserId};
use crate::error::{AuthError, AuthResult};

const CODE_GENERATION_ATTEMPTS: usize = 5;

pub struct SetContractorInput {
    pub is_contractor: bool,
    pub referral_code: Option<String>,
    pub commission_rate: Option<Decimal>,
}

pub struct SetContractorUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> SetContractorUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(
        &self,
        admin: &User,
        user_id: UserId,
        input: SetContractorInput,
    ) -> AuthResult<User> {
        let mut user = self
            .user_repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !input.is_contractor {
            user.revoke_contractor();
            self.user_repo.update_user(&user).await?;
            tracing::info!(admin_id = %admin.user_id, user_id = %user_id, "Contractor role revoked");
            return Ok(user);
        }

        let rate = input
            .commission_rate
            .or(user.contractor_commission_rate)
            .ok_or_else(|| AuthError::Validation("commissionRate is required".to_string()))?;
        validate_rate(rate)?;

        let code = match input.referral_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => {
                let code = ReferralCode::new(&code)?;
                if !self.code_available(&code, user_id).await? {
                    return Err(AuthError::ReferralCodeTaken);
                }
                code
            }
            None => match user.referral_code.clone() {
                Some(existing) => existing,
                None => self.generate_code(user_id).await?,
            },
        };

        user.promote_to_contractor(code, rate);
        self.user_repo.update_user(&user).await?;

        tracing::info!(
            admin_id = %admin.user_id,
            user_id = %user_id,
            referral_code = ?user.referral_code.as_ref().map(ReferralCode::as_str),
            commission_rate = %rate,
            "Contractor role granted"
        );

        Ok(user)
    }

    async fn code_available(&self, code: &ReferralCode, owner: UserId) -> AuthResult<bool> {
        Ok(self
            .user_repo
            .find_user_by_referral_code(code)
            .await?
            .is_none_or(|existing| existing.user_id == owner))
    }

    async fn generate_code(&self, owner: UserId) -> AuthResult<ReferralCode> {
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = ReferralCode::generate();
            if self.code_available(&code, owner).await? {
                return Ok(code);
            }
        }
        Err(AuthError::Internal(
            "Could not generate a unique referral code".to_string(),
        ))
    }
}

/// Fractional digits the `contractor_commission_rate` column stores
pub const MAX_RATE_SCALE: u32 = 8;

fn validate_rate(rate: Decimal) -> AuthResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(AuthError::Validation(
            "commissionRate must be between 0 and 1".to_string(),
        ));
    }
    if rate.normalize().scale() > MAX_RATE_SCALE {
        return Err(AuthError::Validation(format!(
            "commissionRate has more than {MAX_RATE_SCALE} decimal places"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate(Decimal::new(85, 4)).is_ok());
        assert!(validate_rate(Decimal::ZERO).is_ok());
        assert!(validate_rate(Decimal::ONE).is_ok());
        assert!(validate_rate(Decimal::new(-1, 2)).is_err());
        assert!(validate_rate(Decimal::new(101, 2)).is_err());
    }

    #[test]
    fn test_validate_rate_rejects_digits_the_column_would_round() {
        assert!(validate_rate(Decimal::new(1, 8)).is_ok());
        // Trailing zeros do not count
        assert!(validate_rate(Decimal::new(8_500_000_000, 12)).is_ok());
        assert!(matches!(
            validate_rate(Decimal::new(15, 9)),
            Err(AuthError::Validation(_))
        ));
    }
}
