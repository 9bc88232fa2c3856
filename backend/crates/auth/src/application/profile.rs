//! Profile of the signed-in user

use std::sync::Arc;

use crate::domain::entity::user::User;
use crate::domain::repository::AuthRepository;
use crate::error::AuthResult;

pub struct ProfileOutput {
    pub user: User,
    pub totp_enabled: bool,
}

pub struct ProfileUseCase<A>
where
    A: AuthRepository,
{
    auth_repo: Arc<A>,
}

impl<A> ProfileUseCase<A>
where
    A: AuthRepository,
{
    pub fn new(auth_repo: Arc<A>) -> Self {
        Self { auth_repo }
    }

    pub async fn execute(&self, user: User) -> AuthResult<ProfileOutput> {
        let totp_enabled = self
            .auth_repo
            .find_credentials(user.user_id)
            .await?
            .is_some_and(|auth| auth.totp_enabled);

        Ok(ProfileOutput { user, totp_enabled })
    }
}
