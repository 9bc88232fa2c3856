//! Auth Entity
//!
//! Authentication credentials for a user, kept apart from the profile so
//! that profile queries never load secrets.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    totp_secret::TotpSecret, user_id::UserId, user_password::UserPassword,
};

/// Auth credentials entity
#[derive(Debug, Clone)]
pub struct Auth {
    pub user_id: UserId,
    pub password_hash: UserPassword,
    /// Present from setup on; only enforced once `totp_enabled`
    pub totp_secret: Option<TotpSecret>,
    pub totp_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auth {
    pub fn new(user_id: UserId, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            totp_secret: None,
            totp_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Store a fresh secret; 2FA stays off until the first code is verified
    pub fn setup_totp(&mut self) -> TotpSecret {
        let secret = TotpSecret::generate();
        self.totp_secret = Some(secret.clone());
        self.totp_enabled = false;
        self.updated_at = Utc::now();
        secret
    }

    pub fn enable_totp(&mut self) {
        if self.totp_secret.is_some() {
            self.totp_enabled = true;
            self.updated_at = Utc::now();
        }
    }

    pub fn disable_totp(&mut self) {
        self.totp_secret = None;
        self.totp_enabled = false;
        self.updated_at = Utc::now();
    }

    pub fn requires_2fa(&self) -> bool {
        self.totp_enabled && self.totp_secret.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn credentials() -> Auth {
        let raw = RawPassword::for_login("irrelevant".to_string());
        Auth::new(
            UserId::from_i64(1),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
    }

    #[test]
    fn test_totp_lifecycle() {
        let mut auth = credentials();
        assert!(!auth.requires_2fa());

        auth.setup_totp();
        assert!(auth.totp_secret.is_some());
        assert!(!auth.requires_2fa());

        auth.enable_totp();
        assert!(auth.requires_2fa());

        auth.disable_totp();
        assert!(auth.totp_secret.is_none());
        assert!(!auth.requires_2fa());
    }

    #[test]
    fn test_enable_without_secret_is_noop() {
        let mut auth = credentials();
        auth.enable_totp();
        assert!(!auth.totp_enabled);
    }
}
