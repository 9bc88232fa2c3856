//! Auth Session Entity
//!
//! Server-side session referenced by a signed cookie token.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

/// Auth session entity
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    /// Unix timestamp in milliseconds
    pub expires_at_ms: i64,
    pub remember_me: bool,
    /// SHA-256 of the User-Agent the session was created with
    pub client_fingerprint_hash: Vec<u8>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// TTL comes from configuration (short vs. remember-me)
    pub fn new(
        user_id: UserId,
        remember_me: bool,
        fingerprint_hash: Vec<u8>,
        client_ip: Option<String>,
        user_agent: Option<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at_ms: (now + ttl).timestamp_millis(),
            remember_me,
            client_fingerprint_hash: fingerprint_hash,
            client_ip,
            user_agent,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    pub fn remaining_ms(&self) -> i64 {
        (self.expires_at_ms - Utc::now().timestamp_millis()).max(0)
    }

    /// Sliding expiry for remember-me sessions: once less than half of
    /// `ttl_long` remains, push expiry to `now + ttl_long`.
    pub fn extend_if_needed(&mut self, ttl_long: Duration) {
        if !self.remember_me {
            return;
        }

        let now = Utc::now();
        if self.expires_at_ms < (now + (ttl_long / 2)).timestamp_millis() {
            self.expires_at_ms = (now + ttl_long).timestamp_millis();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(remember_me: bool, ttl: Duration) -> AuthSession {
        AuthSession::new(UserId::from_i64(7), remember_me, vec![1; 32], None, None, ttl)
    }

    #[test]
    fn test_new_session_not_expired() {
        let s = session(false, Duration::hours(12));
        assert!(!s.is_expired());
        assert!(s.remaining_ms() > 0);
    }

    #[test]
    fn test_expired_session() {
        let s = session(false, Duration::milliseconds(-1));
        assert!(s.is_expired());
        assert_eq!(s.remaining_ms(), 0);
    }

    #[test]
    fn test_extend_only_remember_me() {
        let week = Duration::days(7);

        let mut short = session(false, Duration::hours(1));
        let before = short.expires_at_ms;
        short.extend_if_needed(week);
        assert_eq!(short.expires_at_ms, before);

        let mut long = session(true, Duration::hours(1));
        long.extend_if_needed(week);
        assert!(long.expires_at_ms > before + Duration::days(6).num_milliseconds());
    }
}
