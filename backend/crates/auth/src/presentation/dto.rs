//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::{ProfileOutput, SessionInfoOutput, TotpSetupOutput};
use crate::domain::entity::{permission_grant::PermissionGrant, user::User};
use crate::domain::value_object::kyc_status::KycStatus;

// ============================================================================
// Registration
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub referral_code: Option<String>,
}

/// Register response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: i64,
    pub email_verification_sent: bool,
}

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Second login step with a TOTP code
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLoginRequest {
    pub pending_token: String,
    pub code: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Login response; exactly one of `user` and `pending_token` is set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(rename = "requires2fa")]
    pub requires_2fa: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

// ============================================================================
// Session Status
// ============================================================================

/// Session status response
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub user_id: Option<i64>,
    pub is_admin: bool,
    pub is_employee: bool,
    pub is_contractor: bool,
    pub expires_at_ms: Option<i64>,
    pub remember_me: bool,
}

impl From<SessionInfoOutput> for SessionStatusResponse {
    fn from(info: SessionInfoOutput) -> Self {
        Self {
            authenticated: true,
            user_id: Some(info.user_id),
            is_admin: info.is_admin,
            is_employee: info.is_employee,
            is_contractor: info.is_contractor,
            expires_at_ms: Some(info.expires_at_ms),
            remember_me: info.remember_me,
        }
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: i64,
    pub email: String,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub is_employee: bool,
    pub is_contractor: bool,
    pub user_group: Option<String>,
    pub referral_code: Option<String>,
    pub referred_by: Option<String>,
    pub contractor_id: Option<i64>,
    pub contractor_commission_rate: Option<Decimal>,
    pub kyc_status: KycStatus,
    pub balance: Decimal,
    pub currency: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.as_i64(),
            email: user.email.to_string(),
            email_verified: user.email_verified,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
            is_employee: user.is_employee_like(),
            is_contractor: user.is_contractor,
            user_group: user.user_group.as_ref().map(|g| g.to_string()),
            referral_code: user.referral_code.as_ref().map(|c| c.to_string()),
            referred_by: user.referred_by.as_ref().map(|c| c.to_string()),
            contractor_id: user.contractor_id.map(|id| id.as_i64()),
            contractor_commission_rate: user.contractor_commission_rate,
            kyc_status: user.kyc_status,
            balance: user.balance,
            currency: user.currency.to_string(),
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Current user info response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(rename = "is2faEnabled")]
    pub is_2fa_enabled: bool,
}

impl From<ProfileOutput> for ProfileResponse {
    fn from(output: ProfileOutput) -> Self {
        Self {
            user: UserResponse::from(&output.user),
            is_2fa_enabled: output.totp_enabled,
        }
    }
}

// ============================================================================
// Email Verification
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailQuery {
    pub token: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyEmailResponse {
    pub verified: bool,
}

// ============================================================================
// TOTP Setup
// ============================================================================

/// TOTP setup response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpSetupResponse {
    /// QR code as base64-encoded PNG
    pub qr_code: String,
    /// Secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

impl From<TotpSetupOutput> for TotpSetupResponse {
    fn from(output: TotpSetupOutput) -> Self {
        Self {
            qr_code: output.qr_code_base64,
            secret: output.secret,
            otpauth_url: output.otpauth_url,
        }
    }
}

/// Body of verify and disable
#[derive(Debug, Clone, Deserialize)]
pub struct TotpCodeRequest {
    pub code: String,
}

// ============================================================================
// Admin: employees and permissions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_group: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    pub is_employee: Option<bool>,
    pub user_group: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPermissionRequest {
    pub permission_type: String,
    pub granted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrantResponse {
    pub user_id: i64,
    pub permission_type: String,
    pub granted: bool,
    pub granted_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PermissionGrant> for PermissionGrantResponse {
    fn from(grant: &PermissionGrant) -> Self {
        Self {
            user_id: grant.user_id.as_i64(),
            permission_type: grant.permission_type.to_string(),
            granted: grant.granted,
            granted_by: grant.granted_by.map(|id| id.as_i64()),
            updated_at: grant.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetContractorRequest {
    pub is_contractor: bool,
    pub referral_code: Option<String>,
    pub commission_rate: Option<Decimal>,
}

// ============================================================================
// Employee: KYC
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct KycQueueQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateKycRequest {
    pub status: String,
}
