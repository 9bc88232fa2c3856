//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::currency::Currency;
use rust_decimal::Decimal;
use sqlx::PgPool;
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
    email::Email, kyc_status::KycStatus, permission_type::PermissionType,
    referral_code::ReferralCode, totp_secret::TotpSecret, user_group::UserGroup, user_id::UserId,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    email_verified,
    first_name,
    last_name,
    is_admin,
    is_employee,
    is_contractor,
    user_group,
    referral_code,
    referred_by,
    contractor_id,
    contractor_commission_rate,
    kyc_status,
    balance,
    currency,
    last_login_at,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    session_id,
    user_id,
    expires_at_ms,
    remember_me,
    client_fingerprint_hash,
    client_ip,
    user_agent,
    created_at,
    last_activity_at
"#;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }

    async fn fetch_user(&self, filter: &str, bind: UserFilter<'_>) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
        let query = sqlx::query_as::<_, UserRow>(&sql);
        let query = match bind {
            UserFilter::Id(id) => query.bind(id),
            UserFilter::Text(text) => query.bind(text),
        };

        let row = query.fetch_optional(&self.pool).await?;
        row.map(UserRow::into_user).transpose()
    }
}

enum UserFilter<'a> {
    Id(i64),
    Text(&'a str),
}

/// Unique violations become domain errors; the constraint name says which
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    let constraint = err
        .as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .and_then(|db_err| db_err.constraint());

    match constraint {
        Some("users_email_key") => AuthError::EmailTaken,
        Some("users_referral_code_key") => AuthError::ReferralCodeTaken,
        _ => AuthError::Database(err),
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &NewUser, password: &UserPassword) -> AuthResult<User> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (
                email,
                email_verified,
                first_name,
                last_name,
                is_employee,
                user_group,
                referred_by,
                contractor_id,
                currency,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING user_id
            "#,
        )
        .bind(user.email.as_str())
        .bind(user.email_verified)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_employee)
        .bind(user.user_group.as_ref().map(UserGroup::as_str))
        .bind(user.referred_by.as_ref().map(ReferralCode::as_str))
        .bind(user.contractor_id.map(|id| id.as_i64()))
        .bind(user.currency.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            r#"
            INSERT INTO auth_credentials (
                user_id,
                password_hash,
                totp_enabled,
                created_at,
                updated_at
            ) VALUES ($1, $2, FALSE, $3, $3)
            "#,
        )
        .bind(user_id)
        .bind(password.as_phc_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user.clone().into_user(UserId::from_i64(user_id), now))
    }

    async fn find_user(&self, user_id: UserId) -> AuthResult<Option<User>> {
        self.fetch_user("user_id = $1", UserFilter::Id(user_id.as_i64()))
            .await
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.fetch_user("email = $1", UserFilter::Text(email.as_str()))
            .await
    }

    async fn find_user_by_referral_code(&self, code: &ReferralCode) -> AuthResult<Option<User>> {
        self.fetch_user("referral_code = $1", UserFilter::Text(code.as_str()))
            .await
    }

    async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                email_verified = $3,
                first_name = $4,
                last_name = $5,
                is_admin = $6,
                is_employee = $7,
                is_contractor = $8,
                user_group = $9,
                referral_code = $10,
                contractor_commission_rate = $11,
                kyc_status = $12,
                last_login_at = $13,
                updated_at = $14
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_i64())
        .bind(user.email.as_str())
        .bind(user.email_verified)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_admin)
        .bind(user.is_employee)
        .bind(user.is_contractor)
        .bind(user.user_group.as_ref().map(UserGroup::as_str))
        .bind(user.referral_code.as_ref().map(ReferralCode::as_str))
        .bind(user.contractor_commission_rate)
        .bind(user.kyc_status.id())
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    async fn list_employees(&self) -> AuthResult<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE is_employee
               OR user_group LIKE 'emp\_%'
               OR user_group IN ('kyc_employee', 'second_admin')
            ORDER BY user_id
            "#
        );

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn list_users_by_kyc_status(
        &self,
        status: KycStatus,
        limit: i64,
    ) -> AuthResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE kyc_status = $1 ORDER BY updated_at LIMIT $2"
        );

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(status.id())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }
}

// ============================================================================
// Auth Repository Implementation
// ============================================================================

impl AuthRepository for PgAuthRepository {
    async fn find_credentials(&self, user_id: UserId) -> AuthResult<Option<Auth>> {
        let row = sqlx::query_as::<_, AuthRow>(
            r#"
            SELECT
                user_id,
                password_hash,
                totp_secret,
                totp_enabled,
                created_at,
                updated_at
            FROM auth_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AuthRow::into_auth).transpose()
    }

    async fn update_credentials(&self, auth: &Auth) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_credentials SET
                password_hash = $2,
                totp_secret = $3,
                totp_enabled = $4,
                updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(auth.user_id.as_i64())
        .bind(auth.password_hash.as_phc_string())
        .bind(auth.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(auth.totp_enabled)
        .bind(auth.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                expires_at_ms,
                remember_me,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_i64())
        .bind(session.expires_at_ms)
        .bind(session.remember_me)
        .bind(&session.client_fingerprint_hash)
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>> {
        let now_ms = Utc::now().timestamp_millis();
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE session_id = $1 AND expires_at_ms > $2"
        );

        let row = sqlx::query_as::<_, AuthSessionRow>(&sql)
            .bind(session_id)
            .bind(now_ms)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                if r.client_fingerprint_hash != fingerprint_hash {
                    tracing::warn!(
                        session_id = %session_id,
                        "Auth session fingerprint mismatch"
                    );
                    return Err(AuthError::SessionFingerprintMismatch);
                }
                Ok(Some(r.into_session()))
            }
            None => Ok(None),
        }
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id)
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_user_sessions(
        &self,
        user_id: UserId,
        except: Option<Uuid>,
    ) -> AuthResult<u64> {
        let deleted = match except {
            Some(except_id) => {
                sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1 AND session_id != $2")
                    .bind(user_id.as_i64())
                    .bind(except_id)
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
            None => sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
                .bind(user_id.as_i64())
                .execute(&self.pool)
                .await?
                .rows_affected(),
        };

        Ok(deleted)
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        self.cleanup_expired().await
    }
}

// ============================================================================
// Permission Repository Implementation
// ============================================================================

impl PermissionRepository for PgAuthRepository {
    async fn find_grant(
        &self,
        user_id: UserId,
        permission_type: &PermissionType,
    ) -> AuthResult<Option<PermissionGrant>> {
        let row = sqlx::query_as::<_, PermissionGrantRow>(
            r#"
            SELECT user_id, permission_type, granted, granted_by, created_at, updated_at
            FROM permission_grants
            WHERE user_id = $1 AND permission_type = $2
            "#,
        )
        .bind(user_id.as_i64())
        .bind(permission_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PermissionGrantRow::into_grant))
    }

    async fn list_grants(&self, user_id: UserId) -> AuthResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, PermissionGrantRow>(
            r#"
            SELECT user_id, permission_type, granted, granted_by, created_at, updated_at
            FROM permission_grants
            WHERE user_id = $1
            ORDER BY permission_type
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PermissionGrantRow::into_grant).collect())
    }

    async fn upsert_grant(&self, grant: &PermissionGrant) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_grants (
                user_id,
                permission_type,
                granted,
                granted_by,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, permission_type) DO UPDATE SET
                granted = EXCLUDED.granted,
                granted_by = EXCLUDED.granted_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(grant.user_id.as_i64())
        .bind(grant.permission_type.as_str())
        .bind(grant.granted)
        .bind(grant.granted_by.map(|id| id.as_i64()))
        .bind(grant.created_at)
        .bind(grant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_grant(
        &self,
        user_id: UserId,
        permission_type: &PermissionType,
    ) -> AuthResult<bool> {
        let deleted = sqlx::query(
            "DELETE FROM permission_grants WHERE user_id = $1 AND permission_type = $2",
        )
        .bind(user_id.as_i64())
        .bind(permission_type.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted > 0)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    email: String,
    email_verified: bool,
    first_name: Option<String>,
    last_name: Option<String>,
    is_admin: bool,
    is_employee: bool,
    is_contractor: bool,
    user_group: Option<String>,
    referral_code: Option<String>,
    referred_by: Option<String>,
    contractor_id: Option<i64>,
    contractor_commission_rate: Option<Decimal>,
    kyc_status: i16,
    balance: Decimal,
    currency: String,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let kyc_status = KycStatus::from_id(self.kyc_status).ok_or_else(|| {
            AuthError::Internal(format!("Invalid kyc_status: {}", self.kyc_status))
        })?;

        let currency = Currency::new(&self.currency)
            .map_err(|e| AuthError::Internal(format!("Invalid currency: {e}")))?;

        Ok(User {
            user_id: UserId::from_i64(self.user_id),
            email: Email::from_db(self.email),
            email_verified: self.email_verified,
            first_name: self.first_name,
            last_name: self.last_name,
            is_admin: self.is_admin,
            is_employee: self.is_employee,
            is_contractor: self.is_contractor,
            user_group: self.user_group.map(UserGroup::from_db),
            referral_code: self.referral_code.map(ReferralCode::from_db),
            referred_by: self.referred_by.map(ReferralCode::from_db),
            contractor_id: self.contractor_id.map(UserId::from_i64),
            contractor_commission_rate: self.contractor_commission_rate,
            kyc_status,
            balance: self.balance,
            currency,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthRow {
    user_id: i64,
    password_hash: String,
    totp_secret: Option<String>,
    totp_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AuthRow {
    fn into_auth(self) -> AuthResult<Auth> {
        let totp_secret = self
            .totp_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {e}")))?;

        let password_hash = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {e}")))?;

        Ok(Auth {
            user_id: UserId::from_i64(self.user_id),
            password_hash,
            totp_secret,
            totp_enabled: self.totp_enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: i64,
    expires_at_ms: i64,
    remember_me: bool,
    client_fingerprint_hash: Vec<u8>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: self.session_id,
            user_id: UserId::from_i64(self.user_id),
            expires_at_ms: self.expires_at_ms,
            remember_me: self.remember_me,
            client_fingerprint_hash: self.client_fingerprint_hash,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionGrantRow {
    user_id: i64,
    permission_type: String,
    granted: bool,
    granted_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionGrantRow {
    fn into_grant(self) -> PermissionGrant {
        PermissionGrant {
            user_id: UserId::from_i64(self.user_id),
            permission_type: PermissionType::from_db(self.permission_type),
            granted: self.granted,
            granted_by: self.granted_by.map(UserId::from_i64),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
