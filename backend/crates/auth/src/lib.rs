//! Auth (Authentication and Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, access decisions, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router, gates
//!
//! ## Features
//! - Registration with email + password and optional contractor referral code
//! - Email verification through signed links
//! - TOTP-based 2FA (Google Authenticator compatible)
//! - Server-side sessions with cookie-based tokens
//! - Admin, employee, contractor and per-permission gates
//! - Employee management, permission grants, KYC review
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Sessions bound to client fingerprint (User-Agent)
//! - Admins pass every permission check without a grant lookup

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::middleware::{AuthGate, CurrentUser};
pub use presentation::router::{auth_router, auth_router_generic};
