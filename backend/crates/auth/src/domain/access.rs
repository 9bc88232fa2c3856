//! Access decisions
//!
//! Pure functions behind the HTTP gates. The middleware resolves the user
//! and, for permissions, loads the grant; the decision itself lives here.

use crate::domain::entity::{permission_grant::PermissionGrant, user::User};

/// Why a resolved user was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    AdminRequired,
    EmployeeRequired,
    ContractorRequired,
    PermissionDenied,
}

pub fn check_admin(user: &User) -> Result<(), AccessDenied> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AccessDenied::AdminRequired)
    }
}

/// `is_employee` or an employee-like `user_group`
pub fn check_employee(user: &User) -> Result<(), AccessDenied> {
    if user.is_employee_like() {
        Ok(())
    } else {
        Err(AccessDenied::EmployeeRequired)
    }
}

pub fn check_contractor(user: &User) -> Result<(), AccessDenied> {
    if user.is_contractor {
        Ok(())
    } else {
        Err(AccessDenied::ContractorRequired)
    }
}

/// Whether the grant table has to be consulted at all
pub fn needs_grant_lookup(user: &User) -> bool {
    !user.is_admin
}

/// Admins pass unconditionally; everyone else needs a row with `granted`
pub fn check_permission(user: &User, grant: Option<&PermissionGrant>) -> Result<(), AccessDenied> {
    if user.is_admin || grant.is_some_and(|g| g.granted) {
        Ok(())
    } else {
        Err(AccessDenied::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::NewUser;
    use crate::domain::value_object::{
        email::Email, permission_type::PermissionType, user_group::UserGroup, user_id::UserId,
    };
    use chrono::Utc;

    fn user() -> User {
        NewUser::customer(Email::new("someone@example.com").unwrap())
            .into_user(UserId::from_i64(10), Utc::now())
    }

    fn grant(granted: bool) -> PermissionGrant {
        PermissionGrant::new(
            UserId::from_i64(10),
            PermissionType::kyc_review(),
            granted,
            UserId::from_i64(1),
        )
    }

    #[test]
    fn test_admin_passes_every_permission_without_grant() {
        let mut admin = user();
        admin.is_admin = true;

        assert!(!needs_grant_lookup(&admin));
        assert_eq!(check_permission(&admin, None), Ok(()));
        assert_eq!(check_permission(&admin, Some(&grant(false))), Ok(()));
    }

    #[test]
    fn test_non_admin_needs_granted_row() {
        let employee = user();
        assert!(needs_grant_lookup(&employee));
        assert_eq!(
            check_permission(&employee, None),
            Err(AccessDenied::PermissionDenied)
        );
        assert_eq!(
            check_permission(&employee, Some(&grant(false))),
            Err(AccessDenied::PermissionDenied)
        );
        assert_eq!(check_permission(&employee, Some(&grant(true))), Ok(()));
    }

    #[test]
    fn test_role_gates() {
        let mut u = user();
        assert_eq!(check_admin(&u), Err(AccessDenied::AdminRequired));
        assert_eq!(check_employee(&u), Err(AccessDenied::EmployeeRequired));
        assert_eq!(check_contractor(&u), Err(AccessDenied::ContractorRequired));

        u.user_group = Some(UserGroup::new("kyc_employee").unwrap());
        assert_eq!(check_employee(&u), Ok(()));

        u.is_contractor = true;
        assert_eq!(check_contractor(&u), Ok(()));

        // Admin flag alone does not open the employee area
        let mut admin = user();
        admin.is_admin = true;
        assert_eq!(check_employee(&admin), Err(AccessDenied::EmployeeRequired));
    }
}
