//! Sign Up Use Case
//!
//! Registers a customer account, resolving an optional referral code to the
//! contractor that owns it.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::email_verification::EmailTokenService;
use crate::application::mailer::VerificationMailer;
use crate::domain::entity::user::NewUser;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    referral_code::ReferralCode,
    user_id::UserId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

const NAME_MAX_LENGTH: usize = 100;

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub referral_code: Option<String>,
}

/// Sign up output
pub struct SignUpOutput {
    pub user_id: UserId,
    pub email_verification_sent: bool,
}

/// Sign up use case
pub struct SignUpUseCase<U, M>
where
    U: UserRepository,
    M: VerificationMailer,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, M> SignUpUseCase<U, M>
where
    U: UserRepository,
    M: VerificationMailer,
{
    pub fn new(user_repo: Arc<U>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(&input.email)?;
        let first_name = normalize_name(input.first_name)?;
        let last_name = normalize_name(input.last_name)?;

        let raw_password = RawPassword::new(input.password)?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let mut new_user = NewUser::customer(email).with_names(first_name, last_name);

        if let Some(code) = input.referral_code.filter(|c| !c.trim().is_empty()) {
            let code = ReferralCode::new(&code).map_err(|_| AuthError::InvalidReferralCode)?;
            let contractor = self
                .user_repo
                .find_user_by_referral_code(&code)
                .await?
                .filter(|owner| owner.is_contractor)
                .ok_or(AuthError::InvalidReferralCode)?;

            new_user = new_user.referred(code, contractor.user_id);
        }

        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let user = self.user_repo.create_user(&new_user, &password_hash).await?;

        tracing::info!(
            user_id = %user.user_id,
            email = %user.email.masked(),
            contractor_id = ?user.contractor_id.map(|id| id.as_i64()),
            "User registered"
        );

        let email_verification_sent = self.send_verification(&user.email, user.user_id).await;

        Ok(SignUpOutput {
            user_id: user.user_id,
            email_verification_sent,
        })
    }

    /// Registration succeeds even when the mail cannot be sent
    async fn send_verification(&self, email: &Email, user_id: UserId) -> bool {
        let tokens = EmailTokenService::new(
            &self.config.email_token_secret,
            self.config.email_token_ttl,
        );

        let result = match tokens.generate(user_id, email) {
            Ok(token) => {
                let link = self.config.verification_link(&token, user_id.as_i64());
                self.mailer.send_verification(email, &link).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Verification email not sent");
                false
            }
        }
    }
}

pub(crate) fn normalize_name(name: Option<String>) -> AuthResult<Option<String>> {
    let Some(name) = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if name.chars().count() > NAME_MAX_LENGTH || name.chars().any(char::is_control) {
        return Err(AuthError::Validation(format!(
            "Names must be at most {NAME_MAX_LENGTH} printable characters"
        )));
    }

    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(None).unwrap(), None);
        assert_eq!(normalize_name(Some("   ".into())).unwrap(), None);
        assert_eq!(
            normalize_name(Some(" Ada ".into())).unwrap().as_deref(),
            Some("Ada")
        );
        assert!(normalize_name(Some("x".repeat(101))).is_err());
    }
}
