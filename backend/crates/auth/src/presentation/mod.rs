//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{
    AuthGate, CurrentUser, Fingerprint, PermissionGate, require_admin, require_authenticated,
    require_contractor, require_employee, require_permission,
};
pub use router::{auth_router, auth_router_generic};
