//! Domain Layer
//!
//! Contains entities, value objects, access decisions and repository traits.

pub mod access;
pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    auth::Auth, auth_session::AuthSession, permission_grant::PermissionGrant,
    user::{NewUser, User},
};
pub use repository::{
    AuthRepository, AuthSessionRepository, AuthStore, PermissionRepository, UserRepository,
};
