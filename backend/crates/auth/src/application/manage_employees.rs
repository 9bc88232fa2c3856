//! Employee Management Use Case
//!
//! Admin operations on employee accounts and their permission grants.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::sign_up::normalize_name;
use crate::domain::entity::{
    permission_grant::PermissionGrant,
    user::{NewUser, User},
};
use crate::domain::repository::{PermissionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    permission_type::PermissionType,
    user_group::UserGroup,
    user_id::UserId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Create employee input
pub struct CreateEmployeeInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_group: Option<String>,
}

/// Partial update; `None` leaves a field untouched and an empty
/// `user_group` clears the group
#[derive(Default)]
pub struct UpdateEmployeeInput {
    pub is_employee: Option<bool>,
    pub user_group: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct ManageEmployeesUseCase<U, P>
where
    U: UserRepository,
    P: PermissionRepository,
{
    user_repo: Arc<U>,
    permission_repo: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<U, P> ManageEmployeesUseCase<U, P>
where
    U: UserRepository,
    P: PermissionRepository,
{
    pub fn new(user_repo: Arc<U>, permission_repo: Arc<P>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            permission_repo,
            config,
        }
    }

    pub async fn list(&self) -> AuthResult<Vec<User>> {
        self.user_repo.list_employees().await
    }

    /// Employees are created by an admin, so their email counts as verified
    pub async fn create(&self, admin: &User, input: CreateEmployeeInput) -> AuthResult<User> {
        let email = Email::new(&input.email)?;
        let raw_password = RawPassword::new(input.password)?;
        let user_group = input
            .user_group
            .filter(|g| !g.trim().is_empty())
            .map(UserGroup::new)
            .transpose()?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let mut new_user = NewUser::customer(email).with_names(
            normalize_name(input.first_name)?,
            normalize_name(input.last_name)?,
        );
        new_user.email_verified = true;
        new_user.is_employee = true;
        new_user.user_group = user_group;

        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let user = self.user_repo.create_user(&new_user, &password_hash).await?;

        tracing::info!(
            admin_id = %admin.user_id,
            user_id = %user.user_id,
            user_group = ?user.user_group.as_ref().map(UserGroup::as_str),
            "Employee created"
        );

        Ok(user)
    }

    pub async fn update(
        &self,
        admin: &User,
        user_id: UserId,
        input: UpdateEmployeeInput,
    ) -> AuthResult<User> {
        let mut user = self.find(user_id).await?;

        if let Some(is_employee) = input.is_employee {
            user.is_employee = is_employee;
        }
        if let Some(group) = input.user_group {
            user.user_group = if group.trim().is_empty() {
                None
            } else {
                Some(UserGroup::new(group)?)
            };
        }
        if input.first_name.is_some() {
            user.first_name = normalize_name(input.first_name)?;
        }
        if input.last_name.is_some() {
            user.last_name = normalize_name(input.last_name)?;
        }
        user.updated_at = Utc::now();

        self.user_repo.update_user(&user).await?;

        tracing::info!(
            admin_id = %admin.user_id,
            user_id = %user_id,
            is_employee = user.is_employee,
            "Employee updated"
        );

        Ok(user)
    }

    pub async fn list_grants(&self, user_id: UserId) -> AuthResult<Vec<PermissionGrant>> {
        self.find(user_id).await?;
        self.permission_repo.list_grants(user_id).await
    }

    /// Insert or overwrite a grant; `granted = false` records an explicit denial
    pub async fn set_grant(
        &self,
        admin: &User,
        user_id: UserId,
        permission_type: &str,
        granted: bool,
    ) -> AuthResult<PermissionGrant> {
        let permission_type = PermissionType::new(permission_type)?;
        self.find(user_id).await?;

        let grant = PermissionGrant::new(user_id, permission_type, granted, admin.user_id);
        self.permission_repo.upsert_grant(&grant).await?;

        tracing::info!(
            admin_id = %admin.user_id,
            user_id = %user_id,
            permission = %grant.permission_type,
            granted = granted,
            "Permission grant changed"
        );

        Ok(grant)
    }

    /// Returns whether a grant existed
    pub async fn revoke_grant(
        &self,
        admin: &User,
        user_id: UserId,
        permission_type: &str,
    ) -> AuthResult<bool> {
        let permission_type = PermissionType::new(permission_type)?;
        let removed = self
            .permission_repo
            .delete_grant(user_id, &permission_type)
            .await?;

        tracing::info!(
            admin_id = %admin.user_id,
            user_id = %user_id,
            permission = %permission_type,
            removed = removed,
            "Permission grant revoked"
        );

        Ok(removed)
    }

    async fn find(&self, user_id: UserId) -> AuthResult<User> {
        self.user_repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
