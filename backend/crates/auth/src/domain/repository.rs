//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer (PostgreSQL, and an in-memory one for tests).
//!
//! Method names are unique across traits so that a single store type can
//! implement all of them without ambiguous calls.

use crate::domain::entity::{
    auth::Auth, auth_session::AuthSession, permission_grant::PermissionGrant,
    user::{NewUser, User},
};
use crate::domain::value_object::{
    email::Email, kyc_status::KycStatus, permission_type::PermissionType,
    referral_code::ReferralCode, user_id::UserId, user_password::UserPassword,
};
use crate::error::AuthResult;
use uuid::Uuid;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert the user and its credentials atomically, returning the stored user
    async fn create_user(&self, user: &NewUser, password: &UserPassword) -> AuthResult<User>;

    async fn find_user(&self, user_id: UserId) -> AuthResult<Option<User>>;

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Owner of a referral code, contractor or not
    async fn find_user_by_referral_code(&self, code: &ReferralCode) -> AuthResult<Option<User>>;

    async fn email_exists(&self, email: &Email) -> AuthResult<bool>;

    /// Persist every mutable profile column
    async fn update_user(&self, user: &User) -> AuthResult<()>;

    /// Users with `is_employee` or an employee-like group
    async fn list_employees(&self) -> AuthResult<Vec<User>>;

    async fn list_users_by_kyc_status(
        &self,
        status: KycStatus,
        limit: i64,
    ) -> AuthResult<Vec<User>>;
}

/// Auth credentials repository trait
#[trait_variant::make(AuthRepository: Send)]
pub trait LocalAuthRepository {
    async fn find_credentials(&self, user_id: UserId) -> AuthResult<Option<Auth>>;

    async fn update_credentials(&self, auth: &Auth) -> AuthResult<()>;
}

/// Auth session repository trait
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()>;

    /// Find an unexpired session; a fingerprint mismatch is an error
    async fn find_session(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>>;

    /// Persist expiry and last activity
    async fn update_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()>;

    /// Delete all sessions for a user, optionally keeping one
    async fn delete_user_sessions(&self, user_id: UserId, except: Option<Uuid>)
    -> AuthResult<u64>;

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64>;
}

/// Permission grant repository trait
#[trait_variant::make(PermissionRepository: Send)]
pub trait LocalPermissionRepository {
    /// Single `(user, permission)` lookup
    async fn find_grant(
        &self,
        user_id: UserId,
        permission_type: &PermissionType,
    ) -> AuthResult<Option<PermissionGrant>>;

    async fn list_grants(&self, user_id: UserId) -> AuthResult<Vec<PermissionGrant>>;

    /// Insert or overwrite the grant for `(user, permission)`
    async fn upsert_grant(&self, grant: &PermissionGrant) -> AuthResult<()>;

    /// Returns whether a row was removed
    async fn delete_grant(
        &self,
        user_id: UserId,
        permission_type: &PermissionType,
    ) -> AuthResult<bool>;
}

/// Everything the HTTP layer needs from a single backing store
pub trait AuthStore:
    UserRepository
    + AuthRepository
    + AuthSessionRepository
    + PermissionRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + AuthRepository
        + AuthSessionRepository
        + PermissionRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
