//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use std::sync::Arc;

use auth::presentation::middleware::CurrentUser;
use kernel::id::DepositId;

use crate::application::{
    ContractorAnalyticsUseCase, CreateDepositInput, CreateDepositUseCase, DashboardUseCase,
    ListDepositsUseCase, SettleDepositUseCase,
};
use crate::domain::repository::LedgerStore;
use crate::error::LedgerResult;
use crate::presentation::dto::{
    ContractorAnalyticsResponse, CreateDepositRequest, DashboardResponse, DepositListQuery,
    DepositResponse, SettleDepositRequest, SettleDepositResponse,
};

/// Shared state for ledger handlers
pub struct LedgerAppState<L>
where
    L: LedgerStore,
{
    pub repo: Arc<L>,
}

impl<L> Clone for LedgerAppState<L>
where
    L: LedgerStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

// ============================================================================
// Customer
// ============================================================================

/// POST /api/deposits
pub async fn create_deposit<L>(
    State(state): State<LedgerAppState<L>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateDepositRequest>,
) -> LedgerResult<(StatusCode, Json<DepositResponse>)>
where
    L: LedgerStore,
{
    let deposit = CreateDepositUseCase::new(state.repo.clone())
        .execute(
            &user,
            CreateDepositInput {
                amount: req.amount,
                currency: req.currency,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DepositResponse::from(&deposit))))
}

/// GET /api/deposits
pub async fn list_own_deposits<L>(
    State(state): State<LedgerAppState<L>>,
    CurrentUser(user): CurrentUser,
) -> LedgerResult<Json<Vec<DepositResponse>>>
where
    L: LedgerStore,
{
    let deposits = ListDepositsUseCase::new(state.repo.clone())
        .own(user.user_id)
        .await?;

    Ok(Json(deposits.iter().map(DepositResponse::from).collect()))
}

// ============================================================================
// Contractor
// ============================================================================

/// GET /api/contractor/analytics
pub async fn contractor_analytics<L>(
    State(state): State<LedgerAppState<L>>,
    CurrentUser(user): CurrentUser,
) -> LedgerResult<Json<ContractorAnalyticsResponse>>
where
    L: LedgerStore,
{
    let output = ContractorAnalyticsUseCase::new(state.repo.clone())
        .execute(&user)
        .await?;

    Ok(Json(output.into()))
}

// ============================================================================
// Employee / backoffice
// ============================================================================

/// GET /api/employee/dashboard
pub async fn dashboard<L>(
    State(state): State<LedgerAppState<L>>,
) -> LedgerResult<Json<DashboardResponse>>
where
    L: LedgerStore,
{
    let stats = DashboardUseCase::new(state.repo.clone()).execute().await?;
    Ok(Json(stats.into()))
}

/// GET /api/employee/dashboard/deposits
pub async fn list_deposits<L>(
    State(state): State<LedgerAppState<L>>,
    Query(query): Query<DepositListQuery>,
) -> LedgerResult<Json<Vec<DepositResponse>>>
where
    L: LedgerStore,
{
    let deposits = ListDepositsUseCase::new(state.repo.clone())
        .backoffice(query.status.as_deref(), query.limit)
        .await?;

    Ok(Json(deposits.iter().map(DepositResponse::from).collect()))
}

/// POST /api/admin/deposits/{id}/settle and /api/backoffice/deposits/{id}/settle
pub async fn settle_deposit<L>(
    State(state): State<LedgerAppState<L>>,
    CurrentUser(actor): CurrentUser,
    Path(deposit_id): Path<i64>,
    Json(req): Json<SettleDepositRequest>,
) -> LedgerResult<Json<SettleDepositResponse>>
where
    L: LedgerStore,
{
    let settlement = SettleDepositUseCase::new(state.repo.clone())
        .execute(&actor, DepositId::from_i64(deposit_id), &req.status)
        .await?;

    Ok(Json(settlement.into()))
}
