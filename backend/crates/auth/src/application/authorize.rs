//! Permission checks
//!
//! Admins are allowed without touching the grant table. Everyone else costs
//! exactly one `(user, permission)` lookup.

use std::sync::Arc;

use crate::domain::access::{check_permission, needs_grant_lookup};
use crate::domain::entity::user::User;
use crate::domain::repository::PermissionRepository;
use crate::domain::value_object::permission_type::PermissionType;
use crate::error::{AuthError, AuthResult};

pub struct AuthorizeUseCase<P>
where
    P: PermissionRepository,
{
    permission_repo: Arc<P>,
}

impl<P> AuthorizeUseCase<P>
where
    P: PermissionRepository,
{
    pub fn new(permission_repo: Arc<P>) -> Self {
        Self { permission_repo }
    }

    /// Lookup failures propagate; they never read as "denied"
    pub async fn has_permission(
        &self,
        user: &User,
        permission: &PermissionType,
    ) -> AuthResult<bool> {
        if !needs_grant_lookup(user) {
            return Ok(true);
        }

        let grant = self
            .permission_repo
            .find_grant(user.user_id, permission)
            .await?;

        Ok(check_permission(user, grant.as_ref()).is_ok())
    }

    pub async fn require(&self, user: &User, permission: &PermissionType) -> AuthResult<()> {
        if self.has_permission(user, permission).await? {
            return Ok(());
        }

        tracing::warn!(
            user_id = %user.user_id,
            permission = %permission,
            "Permission denied"
        );
        Err(AuthError::PermissionDenied(permission.to_string()))
    }
}
