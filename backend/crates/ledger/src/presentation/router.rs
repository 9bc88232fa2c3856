//! Ledger Router
//!
//! Session and role gates come from the auth crate's [`AuthGate`]; routes
//! carry their full path below `/api`.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use auth::domain::repository::AuthStore;
use auth::domain::value_object::permission_type::PermissionType;
use auth::infra::postgres::PgAuthRepository;
use auth::presentation::middleware::AuthGate;

use crate::domain::repository::LedgerStore;
use crate::infra::postgres::PgLedgerRepository;
use crate::presentation::handlers::{self, LedgerAppState};

/// Create the ledger router with PostgreSQL repositories
pub fn ledger_router(repo: PgLedgerRepository, gate: AuthGate<PgAuthRepository>) -> Router {
    ledger_router_generic(Arc::new(repo), gate)
}

/// Create a generic ledger router for any repository implementation
pub fn ledger_router_generic<L, R>(repo: Arc<L>, gate: AuthGate<R>) -> Router
where
    L: LedgerStore,
    R: AuthStore,
{
    let state = LedgerAppState { repo };

    let customer = gate.authenticated(Router::new().route(
        "/deposits",
        get(handlers::list_own_deposits::<L>).post(handlers::create_deposit::<L>),
    ));

    let contractor = gate.contractor_only(
        Router::new().route(
            "/contractor/analytics",
            get(handlers::contractor_analytics::<L>),
        ),
    );

    let employee = gate.employee_only(
        Router::new()
            .route("/employee/dashboard", get(handlers::dashboard::<L>))
            .route(
                "/employee/dashboard/deposits",
                get(handlers::list_deposits::<L>),
            ),
    );

    let admin = gate.admin_only(Router::new().route(
        "/admin/deposits/{id}/settle",
        post(handlers::settle_deposit::<L>),
    ));

    let backoffice = gate.with_permission(
        Router::new().route(
            "/backoffice/deposits/{id}/settle",
            post(handlers::settle_deposit::<L>),
        ),
        PermissionType::manage_deposits(),
    );

    customer
        .merge(contractor)
        .merge(employee)
        .merge(admin)
        .merge(backoffice)
        .with_state(state)
}
