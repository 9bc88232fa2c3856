//! TOTP Setup Use Case
//!
//! Set up, verify and disable TOTP for two-factor authentication. The
//! account name shown in authenticator apps is the user's email.

use std::sync::Arc;

use crate::domain::entity::{auth::Auth, user::User};
use crate::domain::repository::{AuthRepository, UserRepository};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// TOTP setup output
pub struct TotpSetupOutput {
    /// QR code as base64-encoded PNG
    pub qr_code_base64: String,
    /// Secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

/// TOTP setup use case
pub struct TotpSetupUseCase<U, A>
where
    U: UserRepository,
    A: AuthRepository,
{
    user_repo: Arc<U>,
    auth_repo: Arc<A>,
}

impl<U, A> TotpSetupUseCase<U, A>
where
    U: UserRepository,
    A: AuthRepository,
{
    pub fn new(user_repo: Arc<U>, auth_repo: Arc<A>) -> Self {
        Self {
            user_repo,
            auth_repo,
        }
    }

    /// Store a fresh secret; 2FA stays disabled until `verify` succeeds.
    /// Calling it again replaces a secret that was never confirmed.
    pub async fn setup(&self, user_id: UserId) -> AuthResult<TotpSetupOutput> {
        let (user, mut auth) = self.load(user_id).await?;

        if auth.totp_enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let secret = auth.setup_totp();
        self.auth_repo.update_credentials(&auth).await?;

        let account_name = user.email.as_str();
        let qr_code_base64 = secret.generate_qr_code(account_name)?;
        let otpauth_url = secret.get_otpauth_url(account_name)?;

        tracing::info!(user_id = %user_id, "TOTP setup initiated");

        Ok(TotpSetupOutput {
            qr_code_base64,
            secret: secret.as_base32().to_string(),
            otpauth_url,
        })
    }

    /// Verify TOTP code and enable 2FA
    pub async fn verify(&self, user_id: UserId, code: &str) -> AuthResult<()> {
        let (user, mut auth) = self.load(user_id).await?;

        if auth.totp_enabled {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let secret = auth
            .totp_secret
            .as_ref()
            .ok_or(AuthError::TwoFactorNotSetup)?;

        if !secret.verify(code, user.email.as_str())? {
            return Err(AuthError::InvalidTwoFactorCode);
        }

        auth.enable_totp();
        self.auth_repo.update_credentials(&auth).await?;

        tracing::info!(user_id = %user_id, "TOTP enabled");
        Ok(())
    }

    /// Disable TOTP; requires a valid current code
    pub async fn disable(&self, user_id: UserId, code: &str) -> AuthResult<()> {
        let (user, mut auth) = self.load(user_id).await?;

        let secret = auth
            .totp_secret
            .as_ref()
            .filter(|_| auth.totp_enabled)
            .ok_or(AuthError::TwoFactorNotSetup)?;

        if !secret.verify(code, user.email.as_str())? {
            return Err(AuthError::InvalidTwoFactorCode);
        }

        auth.disable_totp();
        self.auth_repo.update_credentials(&auth).await?;

        tracing::info!(user_id = %user_id, "TOTP disabled");
        Ok(())
    }

    async fn load(&self, user_id: UserId) -> AuthResult<(User, Auth)> {
        let user = self
            .user_repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let auth = self
            .auth_repo
            .find_credentials(user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials missing for user".to_string()))?;

        Ok((user, auth))
    }
}
