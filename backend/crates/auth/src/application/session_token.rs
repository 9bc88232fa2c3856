//! Signed tokens carried by cookies and the 2FA login step
//!
//! Session cookie: `<session uuid>.<hmac>`.
//! Pending login: `p2fa:<user id>:<expires ms>:<nonce>.<hmac>`, handed to the
//! client after a correct password when 2FA is on.

use chrono::Utc;
use platform::crypto::{random_token, sign_token, verify_signed_token};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

const PENDING_LOGIN_PREFIX: &str = "p2fa";

pub fn issue_session_token(config: &AuthConfig, session_id: Uuid) -> String {
    sign_token(&config.session_secret, &session_id.to_string())
}

pub fn parse_session_token(config: &AuthConfig, token: &str) -> AuthResult<Uuid> {
    verify_signed_token(&config.session_secret, token)
        .and_then(|payload| payload.parse().ok())
        .ok_or(AuthError::AuthRequired)
}

pub fn issue_pending_login(config: &AuthConfig, user_id: UserId) -> String {
    let ttl_ms = config.pending_login_ttl.as_millis() as i64;
    let expires_at_ms = Utc::now().timestamp_millis() + ttl_ms;
    let payload = format!(
        "{PENDING_LOGIN_PREFIX}:{}:{}:{}",
        user_id,
        expires_at_ms,
        random_token(12)
    );
    sign_token(&config.session_secret, &payload)
}

pub fn parse_pending_login(config: &AuthConfig, token: &str) -> AuthResult<UserId> {
    let payload =
        verify_signed_token(&config.session_secret, token).ok_or(AuthError::PendingLoginInvalid)?;

    let mut parts = payload.split(':');
    let (Some(PENDING_LOGIN_PREFIX), Some(user_id), Some(expires_at_ms), Some(_nonce), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(AuthError::PendingLoginInvalid);
    };

    let expires_at_ms: i64 = expires_at_ms
        .parse()
        .map_err(|_| AuthError::PendingLoginInvalid)?;
    if Utc::now().timestamp_millis() > expires_at_ms {
        return Err(AuthError::PendingLoginInvalid);
    }

    user_id.parse().map_err(|_| AuthError::PendingLoginInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_session_token_roundtrip() {
        let config = AuthConfig::with_random_secret();
        let id = Uuid::new_v4();
        let token = issue_session_token(&config, id);
        assert_eq!(parse_session_token(&config, &token).unwrap(), id);
    }

    #[test]
    fn test_session_token_foreign_key_rejected() {
        let token = issue_session_token(&AuthConfig::with_random_secret(), Uuid::new_v4());
        let result = parse_session_token(&AuthConfig::with_random_secret(), &token);
        assert!(matches!(result, Err(AuthError::AuthRequired)));
    }

    #[test]
    fn test_pending_login_roundtrip() {
        let config = AuthConfig::with_random_secret();
        let token = issue_pending_login(&config, UserId::from_i64(55));
        assert_eq!(parse_pending_login(&config, &token).unwrap().as_i64(), 55);
    }

    #[test]
    fn test_pending_login_expired() {
        let config = AuthConfig {
            pending_login_ttl: Duration::ZERO,
            ..AuthConfig::with_random_secret()
        };
        let token = issue_pending_login(&config, UserId::from_i64(55));
        std::thread::sleep(Duration::from_millis(5));
        assert!(matches!(
            parse_pending_login(&config, &token),
            Err(AuthError::PendingLoginInvalid)
        ));
    }

    #[test]
    fn test_session_token_is_not_a_pending_login() {
        let config = AuthConfig::with_random_secret();
        let token = issue_session_token(&config, Uuid::new_v4());
        assert!(parse_pending_login(&config, &token).is_err());
    }
}
