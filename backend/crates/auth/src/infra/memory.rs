//! In-memory repository
//!
//! Implements every auth repository trait over a shared map. Used by router
//! and use-case tests here and in dependent crates (feature `memory`).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entity::{
    auth::Auth,
    auth_session::AuthSession,
    permission_grant::PermissionGrant,
    user::{NewUser, User},
};
use crate::domain::repository::{
    AuthRepository, AuthSessionRepository, PermissionRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    kyc_status::KycStatus,
    permission_type::PermissionType,
    referral_code::ReferralCode,
    totp_secret::TotpSecret,
    user_id::UserId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
pub struct MemoryState {
    pub users: BTreeMap<UserId, User>,
    pub credentials: HashMap<UserId, Auth>,
    pub sessions: HashMap<Uuid, AuthSession>,
    pub grants: HashMap<(UserId, String), PermissionGrant>,
    /// `find_grant` calls served so far
    pub grant_lookups: usize,
    /// Make `find_grant` fail like an unreachable database
    pub fail_grant_lookups: bool,
    next_user_id: i64,
}

impl MemoryState {
    fn allocate_id(&mut self) -> UserId {
        let next = self
            .users
            .keys()
            .next_back()
            .map_or(1, |id| id.as_i64() + 1)
            .max(self.next_user_id + 1);
        self.next_user_id = next;
        UserId::from_i64(next)
    }
}

/// Cloning shares the same state
#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access for seeding and assertions
    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a user with the next free id and a password
    pub fn seed(&self, new_user: NewUser, password: &str) -> AuthResult<User> {
        let hash = UserPassword::from_raw(&RawPassword::for_login(password.to_string()), None)?;
        let mut state = self.state();
        let user_id = state.allocate_id();
        let user = new_user.into_user(user_id, Utc::now());
        state.credentials.insert(user_id, Auth::new(user_id, hash));
        state.users.insert(user_id, user.clone());
        Ok(user)
    }

    /// Insert or replace a fully formed user, keeping its id
    pub fn put_user(&self, user: User) {
        self.state().users.insert(user.user_id, user);
    }

    pub fn user(&self, user_id: UserId) -> Option<User> {
        self.state().users.get(&user_id).cloned()
    }

    /// Store an enabled TOTP secret for the user
    pub fn enable_totp(&self, user_id: UserId) -> Option<TotpSecret> {
        let mut state = self.state();
        let auth = state.credentials.get_mut(&user_id)?;
        let secret = auth.setup_totp();
        auth.enable_totp();
        Some(secret)
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn create_user(&self, user: &NewUser, password: &UserPassword) -> AuthResult<User> {
        let mut state = self.state();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }

        let user_id = state.allocate_id();
        let created = user.clone().into_user(user_id, Utc::now());
        state
            .credentials
            .insert(user_id, Auth::new(user_id, password.clone()));
        state.users.insert(user_id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.user(user_id))
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_user_by_referral_code(&self, code: &ReferralCode) -> AuthResult<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.referral_code.as_ref() == Some(code))
            .cloned())
    }

    async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.state().users.values().any(|u| &u.email == email))
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state();
        let code_taken = user.referral_code.as_ref().is_some_and(|code| {
            state
                .users
                .values()
                .any(|u| u.user_id != user.user_id && u.referral_code.as_ref() == Some(code))
        });
        if code_taken {
            return Err(AuthError::ReferralCodeTaken);
        }

        // Balance is owned by deposit settlement
        let balance = state
            .users
            .get(&user.user_id)
            .map_or(user.balance, |existing| existing.balance);
        let mut stored = user.clone();
        stored.balance = balance;
        state.users.insert(user.user_id, stored);
        Ok(())
    }

    async fn list_employees(&self) -> AuthResult<Vec<User>> {
        Ok(self
            .state()
            .users
            .values()
            .filter(|u| u.is_employee_like())
            .cloned()
            .collect())
    }

    async fn list_users_by_kyc_status(
        &self,
        status: KycStatus,
        limit: i64,
    ) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self
            .state()
            .users
            .values()
            .filter(|u| u.kyc_status == status)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.updated_at);
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }
}

impl AuthRepository for MemoryAuthRepository {
    async fn find_credentials(&self, user_id: UserId) -> AuthResult<Option<Auth>> {
        Ok(self.state().credentials.get(&user_id).cloned())
    }

    async fn update_credentials(&self, auth: &Auth) -> AuthResult<()> {
        self.state().credentials.insert(auth.user_id, auth.clone());
        Ok(())
    }
}

impl AuthSessionRepository for MemoryAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.state()
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>> {
        let state = self.state();
        match state.sessions.get(&session_id) {
            Some(s) if s.is_expired() => Ok(None),
            Some(s) if s.client_fingerprint_hash != fingerprint_hash => {
                Err(AuthError::SessionFingerprintMismatch)
            }
            Some(s) => Ok(Some(s.clone())),
            None => Ok(None),
        }
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(stored) = self.state().sessions.get_mut(&session.session_id) {
            stored.expires_at_ms = session.expires_at_ms;
            stored.last_activity_at = session.last_activity_at;
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        self.state().sessions.remove(&session_id);
        Ok(())
    }

    async fn delete_user_sessions(
        &self,
        user_id: UserId,
        except: Option<Uuid>,
    ) -> AuthResult<u64> {
        let mut state = self.state();
        let before = state.sessions.len();
        state
            .sessions
            .retain(|id, s| s.user_id != user_id || Some(*id) == except);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let mut state = self.state();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired());
        Ok((before - state.sessions.len()) as u64)
    }
}

impl PermissionRepository for MemoryAuthRepository {
    async fn find_grant(
        &self,
        user_id: UserId,
        permission_type: &PermissionType,
    ) -> AuthResult<Option<PermissionGrant>> {
        let mut state = self.state();
        state.grant_lookups += 1;
        if state.fail_grant_lookups {
            return Err(AuthError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(state
            .grants
            .get(&(user_id, permission_type.as_str().to_string()))
            .cloned())
    }

    async fn list_grants(&self, user_id: UserId) -> AuthResult<Vec<PermissionGrant>> {
        let mut grants: Vec<PermissionGrant> = self
            .state()
            .grants
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        grants.sort_by(|a, b| a.permission_type.as_str().cmp(b.permission_type.as_str()));
        Ok(grants)
    }

    async fn upsert_grant(&self, grant: &PermissionGrant) -> AuthResult<()> {
        let key = (grant.user_id, grant.permission_type.as_str().to_string());
        let mut state = self.state();
        let created_at = state.grants.get(&key).map(|g| g.created_at);
        let mut stored = grant.clone();
        if let Some(created_at) = created_at {
            stored.created_at = created_at;
        }
        state.grants.insert(key, stored);
        Ok(())
    }

    async fn delete_grant(
        &self,
        user_id: UserId,
        permission_type: &PermissionType,
    ) -> AuthResult<bool> {
        Ok(self
            .state()
            .grants
            .remove(&(user_id, permission_type.as_str().to_string()))
            .is_some())
    }
}
