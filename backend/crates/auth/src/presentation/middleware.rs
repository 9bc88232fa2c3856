//! Auth Middleware
//!
//! Gates for protected routes. `require_authenticated` resolves the session
//! cookie into a [`CurrentUser`] request extension; the role and permission
//! gates read it and must therefore run inside it.

use std::ops::Deref;
use std::sync::Arc;

use axum::Router;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::{self, Next};
use axum::response::Response;
use platform::client::{ClientFingerprint, fingerprint_request};

use crate::application::{AuthorizeUseCase, CheckSessionUseCase, config::AuthConfig};
use crate::domain::access::{self, AccessDenied};
use crate::domain::entity::user::User;
use crate::domain::repository::{AuthStore, PermissionRepository};
use crate::domain::value_object::permission_type::PermissionType;
use crate::error::AuthError;

/// Authenticated user, inserted by `require_authenticated`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::AuthRequired)
    }
}

/// Client fingerprint of the request (User-Agent hash and client IP)
pub struct Fingerprint(pub ClientFingerprint);

impl<S> FromRequestParts<S> for Fingerprint
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        fingerprint_request(&parts.headers, &parts.extensions)
            .map(Fingerprint)
            .map_err(AuthError::from)
    }
}

/// Session resolution state shared by every gated router
pub struct AuthGate<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> Clone for AuthGate<R>
where
    R: AuthStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R> AuthGate<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Resolve the session; every failure reads as "not signed in"
    async fn resolve(
        &self,
        token: Option<String>,
        fingerprint: Option<[u8; 32]>,
    ) -> Result<User, AuthError> {
        let (Some(token), Some(fingerprint)) = (token, fingerprint) else {
            return Err(AuthError::AuthRequired);
        };

        CheckSessionUseCase::new(self.repo.clone(), self.repo.clone(), self.config.clone())
            .authenticate(&token, &fingerprint)
            .await
    }

    /// Outermost layer of every protected router
    pub fn authenticated<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            self.clone(),
            require_authenticated::<R>,
        ))
    }

    pub fn admin_only<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.authenticated(router.route_layer(middleware::from_fn(require_admin)))
    }

    pub fn employee_only<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.authenticated(router.route_layer(middleware::from_fn(require_employee)))
    }

    pub fn contractor_only<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.authenticated(router.route_layer(middleware::from_fn(require_contractor)))
    }

    /// Admins pass; others need a granted row for `permission`
    pub fn with_permission<S>(&self, router: Router<S>, permission: PermissionType) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.authenticated(router.route_layer(middleware::from_fn_with_state(
            self.permission_gate(permission),
            require_permission::<R>,
        )))
    }

    /// Employee area plus a permission, checked in that order
    pub fn employee_with_permission<S>(
        &self,
        router: Router<S>,
        permission: PermissionType,
    ) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.employee_only(router.route_layer(middleware::from_fn_with_state(
            self.permission_gate(permission),
            require_permission::<R>,
        )))
    }

    fn permission_gate(&self, permission: PermissionType) -> PermissionGate<R> {
        PermissionGate {
            repo: self.repo.clone(),
            permission,
        }
    }
}

/// Middleware that requires a valid auth session
pub async fn require_authenticated<R>(
    State(gate): State<AuthGate<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
{
    let token = platform::cookie::extract_cookie(req.headers(), &gate.config.cookie.name);
    let fingerprint = fingerprint_request(req.headers(), req.extensions())
        .ok()
        .map(|fp| fp.hash);

    let user = gate.resolve(token, fingerprint).await?;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

fn current_user(req: &Request) -> Result<&User, AuthError> {
    req.extensions()
        .get::<CurrentUser>()
        .map(|current| &current.0)
        .ok_or(AuthError::AuthRequired)
}

fn deny(user: &User, gate: &'static str, denied: AccessDenied) -> AuthError {
    tracing::warn!(user_id = %user.user_id, gate = gate, "Access denied");
    AuthError::from(denied)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    {
        let user = current_user(&req)?;
        access::check_admin(user).map_err(|d| deny(user, "admin", d))?;
    }
    Ok(next.run(req).await)
}

pub async fn require_employee(req: Request, next: Next) -> Result<Response, AuthError> {
    {
        let user = current_user(&req)?;
        access::check_employee(user).map_err(|d| deny(user, "employee", d))?;
    }
    Ok(next.run(req).await)
}

pub async fn require_contractor(req: Request, next: Next) -> Result<Response, AuthError> {
    {
        let user = current_user(&req)?;
        access::check_contractor(user).map_err(|d| deny(user, "contractor", d))?;
    }
    Ok(next.run(req).await)
}

/// State of `require_permission`: the store and the permission to check
pub struct PermissionGate<P> {
    pub repo: Arc<P>,
    pub permission: PermissionType,
}

impl<P> Clone for PermissionGate<P> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            permission: self.permission.clone(),
        }
    }
}

/// Middleware that requires a permission grant (admins always pass)
pub async fn require_permission<P>(
    State(gate): State<PermissionGate<P>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    P: PermissionRepository + Send + Sync + 'static,
{
    let user = current_user(&req)?.clone();

    AuthorizeUseCase::new(gate.repo.clone())
        .require(&user, &gate.permission)
        .await?;

    Ok(next.run(req).await)
}
