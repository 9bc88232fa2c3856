//! Permission Grant Entity
//!
//! Sparse per-employee override. A missing row means "not granted"; admins
//! never need one.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{permission_type::PermissionType, user_id::UserId};

#[derive(Debug, Clone)]
pub struct PermissionGrant {
    pub user_id: UserId,
    pub permission_type: PermissionType,
    pub granted: bool,
    /// Admin who last changed the grant
    pub granted_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermissionGrant {
    pub fn new(
        user_id: UserId,
        permission_type: PermissionType,
        granted: bool,
        granted_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            permission_type,
            granted,
            granted_by: Some(granted_by),
            created_at: now,
            updated_at: now,
        }
    }
}
