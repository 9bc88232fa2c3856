//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::random_secret;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie attributes (name, Secure, SameSite, Path)
    pub cookie: CookieConfig,
    /// HMAC key signing session and pending-2FA tokens (32 bytes)
    pub session_secret: [u8; 32],
    /// Session TTL without "Remember Me" (12 hours)
    pub session_ttl_short: Duration,
    /// Session TTL with "Remember Me" (1 week)
    pub session_ttl_long: Duration,
    /// Window between password check and 2FA code submission
    pub pending_login_ttl: Duration,
    /// HS256 key for email verification tokens
    pub email_token_secret: Vec<u8>,
    /// Email verification token lifetime (7 days)
    pub email_token_ttl: Duration,
    /// Public URL of the frontend, used in verification links
    pub app_base_url: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie: CookieConfig {
                name: "auth_session".to_string(),
                ..CookieConfig::default()
            },
            session_secret: [0u8; 32],
            session_ttl_short: Duration::from_secs(12 * 3600),
            session_ttl_long: Duration::from_secs(7 * 24 * 3600),
            pending_login_ttl: Duration::from_secs(5 * 60),
            email_token_secret: vec![0u8; 32],
            email_token_ttl: Duration::from_secs(7 * 24 * 3600),
            app_base_url: "http://localhost:40922".to_string(),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Random signing keys (for development)
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: random_secret(),
            email_token_secret: random_secret().to_vec(),
            ..Default::default()
        }
    }

    /// Development config (insecure cookie)
    pub fn development() -> Self {
        let mut config = Self::with_random_secret();
        config.cookie.secure = false;
        config
    }

    pub fn session_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.session_ttl_long
        } else {
            self.session_ttl_short
        }
    }

    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Link mailed to the user; the frontend calls `GET /api/verify-email`
    pub fn verification_link(&self, token: &str, user_id: i64) -> String {
        format!(
            "{}/verify-email?token={}&userId={}",
            self.app_base_url.trim_end_matches('/'),
            token,
            user_id
        )
    }
}
