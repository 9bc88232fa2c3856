//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::access::AccessDenied;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session, bad signature, expired or unknown session
    #[error("Authentication required")]
    AuthRequired,

    /// Session cookie replayed from a different client
    #[error("Authentication required")]
    SessionFingerprintMismatch,

    #[error("Admin access required")]
    AdminRequired,

    #[error("Employee access required")]
    EmployeeRequired,

    #[error("Contractor access required")]
    ContractorRequired,

    #[error("Permission '{0}' required")]
    PermissionDenied(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Unknown referral code")]
    InvalidReferralCode,

    #[error("Referral code is already in use")]
    ReferralCodeTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid two-factor authentication code")]
    InvalidTwoFactorCode,

    #[error("Two-factor authentication is not set up")]
    TwoFactorNotSetup,

    #[error("Two-factor authentication is already enabled")]
    TwoFactorAlreadyEnabled,

    /// Pending 2FA login token invalid or expired
    #[error("Login attempt expired, please sign in again")]
    PendingLoginInvalid,

    #[error("Invalid or expired verification link")]
    InvalidVerificationToken,

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("{0}")]
    Validation(String),

    /// Error raised by a value object, kind and code preserved
    #[error(transparent)]
    App(AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AuthRequired
            | AuthError::SessionFingerprintMismatch
            | AuthError::InvalidCredentials
            | AuthError::InvalidTwoFactorCode
            | AuthError::PendingLoginInvalid => ErrorKind::Unauthorized,
            AuthError::AdminRequired
            | AuthError::EmployeeRequired
            | AuthError::ContractorRequired
            | AuthError::PermissionDenied(_) => ErrorKind::Forbidden,
            AuthError::EmailTaken
            | AuthError::ReferralCodeTaken
            | AuthError::TwoFactorAlreadyEnabled => ErrorKind::Conflict,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::TwoFactorNotSetup => ErrorKind::UnprocessableEntity,
            AuthError::InvalidReferralCode
            | AuthError::InvalidVerificationToken
            | AuthError::MissingHeader(_)
            | AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::App(e) => e.kind(),
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Machine-readable code sent to clients
    pub fn code(&self) -> &str {
        match self {
            AuthError::AuthRequired | AuthError::SessionFingerprintMismatch => "AUTH_REQUIRED",
            AuthError::AdminRequired => "ADMIN_REQUIRED",
            AuthError::EmployeeRequired => "EMPLOYEE_REQUIRED",
            AuthError::ContractorRequired => "CONTRACTOR_REQUIRED",
            AuthError::PermissionDenied(_) => "PERMISSION_DENIED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::EmailTaken => "EMAIL_TAKEN",
            AuthError::InvalidReferralCode => "INVALID_REFERRAL_CODE",
            AuthError::ReferralCodeTaken => "REFERRAL_CODE_TAKEN",
            AuthError::InvalidTwoFactorCode => "INVALID_2FA_CODE",
            AuthError::TwoFactorNotSetup => "2FA_NOT_SETUP",
            AuthError::TwoFactorAlreadyEnabled => "2FA_ALREADY_ENABLED",
            AuthError::PendingLoginInvalid => "LOGIN_EXPIRED",
            AuthError::InvalidVerificationToken => "INVALID_TOKEN",
            AuthError::App(e) => e.code(),
            other => other.kind().code(),
        }
    }

    fn action(&self) -> Option<&'static str> {
        match self {
            AuthError::AuthRequired | AuthError::SessionFingerprintMismatch => {
                Some("Please sign in")
            }
            AuthError::InvalidTwoFactorCode => {
                Some("Enter the current code from your authenticator app")
            }
            AuthError::InvalidVerificationToken => Some("Request a new verification email"),
            _ => None,
        }
    }

    pub fn into_app_error(self) -> AppError {
        if let AuthError::App(e) = self {
            return e;
        }

        let mut err = AppError::new(self.kind(), self.to_string()).with_code(self.code().to_string());
        if let Some(action) = self.action() {
            err = err.with_action(action);
        }
        err
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::SessionFingerprintMismatch => {
                tracing::warn!("Session fingerprint mismatch detected");
            }
            AuthError::AdminRequired
            | AuthError::EmployeeRequired
            | AuthError::ContractorRequired
            | AuthError::PermissionDenied(_) => {
                tracing::warn!(code = self.code(), "Access denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::App(err)
    }
}

impl From<AccessDenied> for AuthError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::AdminRequired => AuthError::AdminRequired,
            AccessDenied::EmployeeRequired => AuthError::EmployeeRequired,
            AccessDenied::ContractorRequired => AuthError::ContractorRequired,
            AccessDenied::PermissionDenied => AuthError::PermissionDenied(String::new()),
        }
    }
}

impl From<platform::client::FingerprintError> for AuthError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                AuthError::MissingHeader(header)
            }
        }
    }
}
