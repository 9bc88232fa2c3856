//! Domain Layer
//!
//! Deposits, settlement rules and repository traits.

pub mod commission;
pub mod entities;
pub mod repository;
pub mod value_objects;

pub use entities::{ContractorTerms, Deposit, NewDeposit, Settlement};
pub use repository::{DepositRepository, LedgerStatsRepository, LedgerStore};
pub use value_objects::{DepositStatus, SepaReference};
