//! Application Layer
//!
//! Use cases and application services.

pub mod authorize;
pub mod check_session;
pub mod config;
pub mod contractor;
pub mod email_verification;
pub mod kyc_review;
pub mod mailer;
pub mod manage_employees;
pub mod profile;
pub mod session_token;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod totp_setup;

// Re-exports
pub use authorize::AuthorizeUseCase;
pub use check_session::{CheckSessionUseCase, SessionInfoOutput};
pub use config::AuthConfig;
pub use contractor::{SetContractorInput, SetContractorUseCase};
pub use email_verification::{EmailTokenService, VerifyEmailUseCase};
pub use kyc_review::KycReviewUseCase;
pub use mailer::{LogMailer, VerificationMailer};
pub use manage_employees::{CreateEmployeeInput, ManageEmployeesUseCase, UpdateEmployeeInput};
pub use profile::{ProfileOutput, ProfileUseCase};
pub use sign_in::{
    ClientFingerprint, CompleteTwoFactorInput, SignInInput, SignInOutput, SignInUseCase,
};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use totp_setup::{TotpSetupOutput, TotpSetupUseCase};
