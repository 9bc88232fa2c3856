//! Ledger Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Deposits, settlement rules, repository traits
//! - `application/` - Use cases
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Settlement Model
//! - A deposit leaves `pending` exactly once; repeated settlement requests
//!   return it unchanged and credit nothing
//! - Settlement runs in one transaction with the deposit row locked
//! - Contractor commission is `amount * rate`, exact, in the deposit currency

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use error::{LedgerError, LedgerResult};
pub use infra::postgres::PgLedgerRepository;
pub use presentation::router::{ledger_router, ledger_router_generic};
