//! Application Layer - Use Cases

pub mod contractor_analytics;
pub mod create_deposit;
pub mod dashboard;
pub mod list_deposits;
pub mod settle_deposit;

pub use contractor_analytics::{ContractorAnalyticsOutput, ContractorAnalyticsUseCase};
pub use create_deposit::{CreateDepositInput, CreateDepositUseCase};
pub use dashboard::DashboardUseCase;
pub use list_deposits::ListDepositsUseCase;
pub use settle_deposit::SettleDepositUseCase;
