//! Infrastructure Layer

#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryLedgerRepository;
pub use postgres::PgLedgerRepository;
