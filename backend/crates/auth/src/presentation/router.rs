//! Auth Router
//!
//! Routes carry their full path below `/api`, so gated groups can be merged
//! without nesting collisions.

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::mailer::{LogMailer, VerificationMailer};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::permission_type::PermissionType;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::AuthGate;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(Arc::new(repo), Arc::new(LogMailer), Arc::new(config))
}

/// Create a generic Auth router for any repository and mailer
pub fn auth_router_generic<R, M>(repo: Arc<R>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Router
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let gate = AuthGate::new(repo.clone(), config.clone());
    let state = AuthAppState {
        repo,
        mailer,
        config,
    };

    let public = Router::new()
        .route("/auth/register", post(handlers::register::<R, M>))
        .route("/auth/login", post(handlers::login::<R, M>))
        .route("/auth/session", post(handlers::complete_login::<R, M>))
        .route("/auth/status", get(handlers::session_status::<R, M>))
        .route("/auth/logout", post(handlers::logout::<R, M>))
        .route("/verify-email", get(handlers::verify_email::<R, M>));

    let authenticated = gate.authenticated(
        Router::new()
            .route("/auth/me", get(handlers::me::<R, M>))
            .route("/2fa/setup", post(handlers::totp_setup::<R, M>))
            .route("/2fa/verify", post(handlers::totp_verify::<R, M>))
            .route("/2fa/disable", post(handlers::totp_disable::<R, M>)),
    );

    let admin = gate.admin_only(
        Router::new()
            .route(
                "/admin/employees",
                get(handlers::list_employees::<R, M>).post(handlers::create_employee::<R, M>),
            )
            .route(
                "/admin/employees/{id}",
                patch(handlers::update_employee::<R, M>),
            )
            .route(
                "/admin/employees/{id}/permissions",
                get(handlers::list_permissions::<R, M>).post(handlers::set_permission::<R, M>),
            )
            .route(
                "/admin/employees/{id}/permissions/{permission_type}",
                delete(handlers::revoke_permission::<R, M>),
            )
            .route(
                "/admin/users/{id}/contractor",
                patch(handlers::set_contractor::<R, M>),
            ),
    );

    let employee = gate.employee_only(
        Router::new().route("/employee/dashboard/kyc", get(handlers::kyc_queue::<R, M>)),
    );

    let kyc_review = gate.employee_with_permission(
        Router::new().route("/employee/kyc/{user_id}", patch(handlers::update_kyc::<R, M>)),
        PermissionType::kyc_review(),
    );

    public
        .merge(authenticated)
        .merge(admin)
        .merge(employee)
        .merge(kyc_review)
        .with_state(state)
}
