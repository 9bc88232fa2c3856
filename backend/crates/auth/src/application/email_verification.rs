//! Email Verification
//!
//! HS256 JWT tokens proving ownership of an email address, and the use case
//! that consumes them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use platform::crypto::random_token;
use serde::{Deserialize, Serialize};

use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Value of the `purpose` claim
pub const EMAIL_VERIFICATION_PURPOSE: &str = "email_verification";

/// Email verification claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerificationClaims {
    pub user_id: i64,
    pub email: String,
    pub purpose: String,
    /// Makes every issued token unique
    pub nonce: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks verification tokens
#[derive(Clone)]
pub struct EmailTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl EmailTokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn generate(&self, user_id: UserId, email: &Email) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = EmailVerificationClaims {
            user_id: user_id.as_i64(),
            email: email.as_str().to_string(),
            purpose: EMAIL_VERIFICATION_PURPOSE.to_string(),
            nonce: random_token(16),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {e}")))
    }

    /// `None` unless the signature is valid, the token is unexpired and the
    /// purpose matches. The caller compares `user_id` with its own input.
    pub fn verify(&self, token: &str) -> Option<EmailVerificationClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        match decode::<EmailVerificationClaims>(token, &self.decoding_key, &validation) {
            Ok(data) if data.claims.purpose == EMAIL_VERIFICATION_PURPOSE => Some(data.claims),
            Ok(_) => {
                tracing::debug!("Verification token with foreign purpose");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "Verification token rejected");
                None
            }
        }
    }
}

/// Verify email use case
pub struct VerifyEmailUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: EmailTokenService,
}

impl<U> VerifyEmailUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, tokens: EmailTokenService) -> Self {
        Self { user_repo, tokens }
    }

    /// Mark the email verified; `user_id` comes from the link's query string
    /// and must match the token. Verifying twice is not an error.
    pub async fn execute(&self, token: &str, user_id: UserId) -> AuthResult<()> {
        let claims = self
            .tokens
            .verify(token)
            .ok_or(AuthError::InvalidVerificationToken)?;

        if claims.user_id != user_id.as_i64() {
            tracing::warn!(
                token_user_id = claims.user_id,
                user_id = %user_id,
                "Verification token does not belong to user"
            );
            return Err(AuthError::InvalidVerificationToken);
        }

        let mut user = self
            .user_repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::InvalidVerificationToken)?;

        if user.email.as_str() != claims.email {
            // Email changed after the link was sent
            return Err(AuthError::InvalidVerificationToken);
        }

        if !user.email_verified {
            user.verify_email();
            self.user_repo.update_user(&user).await?;
            tracing::info!(user_id = %user_id, "Email verified");
        }

        Ok(())
    }
}
