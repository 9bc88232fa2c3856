//! Sign In Use Case
//!
//! Authenticates a user and creates a session. With 2FA enabled the password
//! step returns a short-lived pending token instead, and the session is only
//! created once a valid code is submitted with it.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_token::{
    issue_pending_login, issue_session_token, parse_pending_login,
};
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthRepository, AuthSessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Re-export ClientFingerprint from platform
pub use platform::client::ClientFingerprint;

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

/// Second login step
pub struct CompleteTwoFactorInput {
    pub pending_token: String,
    pub code: String,
    pub remember_me: bool,
}

/// Sign in output
pub enum SignInOutput {
    /// Session created; the token goes into the cookie
    Session {
        session_token: String,
        user: User,
        remember_me: bool,
    },
    /// Password accepted, TOTP code still required
    TwoFactorRequired { pending_token: String },
}

/// Sign in use case
pub struct SignInUseCase<U, A, S>
where
    U: UserRepository,
    A: AuthRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    auth_repo: Arc<A>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, A, S> SignInUseCase<U, A, S>
where
    U: UserRepository,
    A: AuthRepository,
    S: AuthSessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        auth_repo: Arc<A>,
        session_repo: Arc<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            auth_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .user_repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let auth = self
            .auth_repo
            .find_credentials(user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials missing for user".to_string()))?;

        let raw_password = RawPassword::for_login(input.password);
        if !auth.password_hash.verify(&raw_password, self.config.pepper()) {
            tracing::warn!(user_id = %user.user_id, "Wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if auth.requires_2fa() {
            tracing::info!(user_id = %user.user_id, "Password accepted, awaiting 2FA code");
            return Ok(SignInOutput::TwoFactorRequired {
                pending_token: issue_pending_login(&self.config, user.user_id),
            });
        }

        self.start_session(user, input.remember_me, fingerprint).await
    }

    /// Exchange a pending token and a TOTP code for a session
    pub async fn complete_two_factor(
        &self,
        input: CompleteTwoFactorInput,
        fingerprint: ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let user_id = parse_pending_login(&self.config, &input.pending_token)?;

        let user = self
            .user_repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::PendingLoginInvalid)?;

        let auth = self
            .auth_repo
            .find_credentials(user_id)
            .await?
            .ok_or(AuthError::PendingLoginInvalid)?;

        let secret = auth
            .totp_secret
            .as_ref()
            .filter(|_| auth.totp_enabled)
            .ok_or(AuthError::TwoFactorNotSetup)?;

        if !secret.verify(&input.code, user.email.as_str())? {
            tracing::warn!(user_id = %user_id, "Invalid 2FA code at login");
            return Err(AuthError::InvalidTwoFactorCode);
        }

        self.start_session(user, input.remember_me, fingerprint).await
    }

    async fn start_session(
        &self,
        mut user: User,
        remember_me: bool,
        fingerprint: ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        user.record_login();
        self.user_repo.update_user(&user).await?;

        let ttl = chrono::Duration::from_std(self.config.session_ttl(remember_me))
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;

        let session = AuthSession::new(
            user.user_id,
            remember_me,
            fingerprint.hash_vec(),
            fingerprint.ip_string(),
            fingerprint.user_agent.clone(),
            ttl,
        );
        self.session_repo.create_session(&session).await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            remember_me = remember_me,
            "User signed in"
        );

        Ok(SignInOutput::Session {
            session_token: issue_session_token(&self.config, session.session_id),
            user,
            remember_me,
        })
    }
}
