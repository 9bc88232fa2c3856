//! Ledger Error Types
//!
//! Ledger-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Ledger-specific result type alias
pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Deposit not found")]
    DepositNotFound,

    /// Settlement target is not a terminal status
    #[error("Deposit cannot be settled as '{0}'")]
    InvalidSettlementStatus(String),

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

impl LedgerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::DepositNotFound => ErrorKind::NotFound,
            LedgerError::InvalidSettlementStatus(_) | LedgerError::Validation(_) => {
                ErrorKind::BadRequest
            }
            LedgerError::App(e) => e.kind(),
            LedgerError::Database(_) | LedgerError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn code(&self) -> &str {
        match self {
            LedgerError::DepositNotFound => "DEPOSIT_NOT_FOUND",
            LedgerError::InvalidSettlementStatus(_) => "INVALID_SETTLEMENT_STATUS",
            LedgerError::App(e) => e.code(),
            other => other.kind().code(),
        }
    }

    pub fn into_app_error(self) -> AppError {
        if let LedgerError::App(e) = self {
            return e;
        }
        AppError::new(self.kind(), self.to_string()).with_code(self.code().to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            LedgerError::Database(e) => {
                tracing::error!(error = %e, "Ledger database error");
            }
            LedgerError::Internal(msg) => {
                tracing::error!(message = %msg, "Ledger internal error");
            }
            LedgerError::App(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Ledger internal error");
            }
            _ => {
                tracing::debug!(error = %self, "Ledger error");
            }
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for LedgerError {
    fn from(err: AppError) -> Self {
        LedgerError::App(err)
    }
}

impl From<kernel::currency::CurrencyParseError> for LedgerError {
    fn from(err: kernel::currency::CurrencyParseError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}
