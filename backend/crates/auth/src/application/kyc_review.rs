//! KYC Review Use Case
//!
//! Employees move a customer's KYC status after checking documents.

use std::sync::Arc;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{kyc_status::KycStatus, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Upper bound for the pending queue
pub const MAX_QUEUE_LIMIT: i64 = 200;

pub struct KycReviewUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> KycReviewUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Users waiting for review, oldest first
    pub async fn pending(&self, limit: i64) -> AuthResult<Vec<User>> {
        self.user_repo
            .list_users_by_kyc_status(KycStatus::Pending, limit.clamp(1, MAX_QUEUE_LIMIT))
            .await
    }

    pub async fn set_status(
        &self,
        reviewer: &User,
        user_id: UserId,
        status: &str,
    ) -> AuthResult<User> {
        let status: KycStatus = status.parse()?;
        if !status.is_review_outcome() {
            return Err(AuthError::Validation(format!(
                "KYC status '{status}' cannot be set by a reviewer"
            )));
        }

        let mut user = self
            .user_repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let previous = user.kyc_status;
        user.set_kyc_status(status);
        self.user_repo.update_user(&user).await?;

        tracing::info!(
            reviewer_id = %reviewer.user_id,
            user_id = %user_id,
            from = %previous,
            to = %status,
            "KYC status changed"
        );

        Ok(user)
    }
}
