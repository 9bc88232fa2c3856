//! Check Session Use Case
//!
//! Verifies and retrieves session information.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_token::parse_session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Session info output
pub struct SessionInfoOutput {
    pub user_id: i64,
    pub is_admin: bool,
    pub is_employee: bool,
    pub is_contractor: bool,
    pub expires_at_ms: i64,
    pub remember_me: bool,
}

/// Check session use case
pub struct CheckSessionUseCase<S, U>
where
    S: AuthSessionRepository + Clone + Send + Sync + 'static,
    U: UserRepository,
{
    session_repo: Arc<S>,
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<S, U> CheckSessionUseCase<S, U>
where
    S: AuthSessionRepository + Clone + Send + Sync + 'static,
    U: UserRepository,
{
    pub fn new(session_repo: Arc<S>, user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self {
            session_repo,
            user_repo,
            config,
        }
    }

    /// Check if session is valid and return session info
    pub async fn execute(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<SessionInfoOutput> {
        let (session, user) = self.resolve(session_token, fingerprint_hash).await?;

        Ok(SessionInfoOutput {
            user_id: user.user_id.as_i64(),
            is_admin: user.is_admin,
            is_employee: user.is_employee_like(),
            is_contractor: user.is_contractor,
            expires_at_ms: session.expires_at_ms,
            remember_me: session.remember_me,
        })
    }

    /// Resolve the user behind a session cookie
    pub async fn authenticate(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<User> {
        self.resolve(session_token, fingerprint_hash)
            .await
            .map(|(_, user)| user)
    }

    async fn resolve(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<(AuthSession, User)> {
        let session = self.get_session(session_token, fingerprint_hash).await?;

        // A session can outlive its user row only through manual deletion
        let user = self
            .user_repo
            .find_user(session.user_id)
            .await?
            .ok_or(AuthError::AuthRequired)?;

        Ok((session, user))
    }

    /// Get session and update last activity
    pub async fn get_session(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<AuthSession> {
        let session_id = parse_session_token(&self.config, session_token)?;

        let mut session = self
            .session_repo
            .find_session(session_id, fingerprint_hash)
            .await?
            .ok_or(AuthError::AuthRequired)?;

        if session.is_expired() {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::AuthRequired);
        }

        session.touch();

        let ttl_long = chrono::Duration::from_std(self.config.session_ttl_long)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;
        session.extend_if_needed(ttl_long);

        // Fire and forget
        let session_clone = session.clone();
        let repo = self.session_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update_session(&session_clone).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(session)
    }
}
