//! User Entity
//!
//! Account profile shared by customers, employees, contractors and admins.
//! Credentials live in the [`Auth`](super::auth::Auth) entity.

use chrono::{DateTime, Utc};
use kernel::currency::Currency;
use rust_decimal::Decimal;

use crate::domain::value_object::{
    email::Email, kyc_status::KycStatus, referral_code::ReferralCode, user_group::UserGroup,
    user_id::UserId,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub email: Email,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub is_employee: bool,
    pub is_contractor: bool,
    /// Free-text role tag
    pub user_group: Option<UserGroup>,
    /// Code owned by this user when it is a contractor
    pub referral_code: Option<ReferralCode>,
    /// Code entered at registration
    pub referred_by: Option<ReferralCode>,
    /// Contractor that referred this user
    pub contractor_id: Option<UserId>,
    /// Fraction of each referred deposit paid to this contractor (0.0085 = 0.85 %)
    pub contractor_commission_rate: Option<Decimal>,
    pub kyc_status: KycStatus,
    pub balance: Decimal,
    pub currency: Currency,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Employee area access: flag or employee-like group
    pub fn is_employee_like(&self) -> bool {
        self.is_employee
            || self
                .user_group
                .as_ref()
                .is_some_and(UserGroup::is_employee_like)
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn verify_email(&mut self) {
        self.email_verified = true;
        self.updated_at = Utc::now();
    }

    pub fn set_kyc_status(&mut self, status: KycStatus) {
        self.kyc_status = status;
        self.updated_at = Utc::now();
    }

    /// Turn the contractor role on with the given code and rate
    pub fn promote_to_contractor(&mut self, code: ReferralCode, rate: Decimal) {
        self.is_contractor = true;
        self.referral_code = Some(code);
        self.contractor_commission_rate = Some(rate);
        self.updated_at = Utc::now();
    }

    /// Turn the contractor role off; the code is kept so past deposits stay attributed
    pub fn revoke_contractor(&mut self) {
        self.is_contractor = false;
        self.updated_at = Utc::now();
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => self.email.to_string(),
        }
    }
}

/// Data for a user that has no id yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_employee: bool,
    pub user_group: Option<UserGroup>,
    pub referred_by: Option<ReferralCode>,
    pub contractor_id: Option<UserId>,
    pub currency: Currency,
}

impl NewUser {
    /// Self-registered customer
    pub fn customer(email: Email) -> Self {
        Self {
            email,
            email_verified: false,
            first_name: None,
            last_name: None,
            is_employee: false,
            user_group: None,
            referred_by: None,
            contractor_id: None,
            currency: Currency::eur(),
        }
    }

    /// Attach the contractor that owns `code`
    pub fn referred(mut self, code: ReferralCode, contractor_id: UserId) -> Self {
        self.referred_by = Some(code);
        self.contractor_id = Some(contractor_id);
        self
    }

    pub fn with_names(mut self, first: Option<String>, last: Option<String>) -> Self {
        self.first_name = first;
        self.last_name = last;
        self
    }

    /// Complete the record once the database assigned an id
    pub fn into_user(self, user_id: UserId, now: DateTime<Utc>) -> User {
        User {
            user_id,
            email: self.email,
            email_verified: self.email_verified,
            first_name: self.first_name,
            last_name: self.last_name,
            is_admin: false,
            is_employee: self.is_employee,
            is_contractor: false,
            user_group: self.user_group,
            referral_code: None,
            referred_by: self.referred_by,
            contractor_id: self.contractor_id,
            contractor_commission_rate: None,
            kyc_status: KycStatus::NotStarted,
            balance: Decimal::ZERO,
            currency: self.currency,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_employee: bool, group: Option<&str>) -> User {
        let mut new_user = NewUser::customer(Email::new("e@example.com").unwrap());
        new_user.is_employee = is_employee;
        new_user.user_group = group.map(|g| UserGroup::new(g).unwrap());
        new_user.into_user(UserId::from_i64(1), Utc::now())
    }

    #[test]
    fn test_employee_like() {
        assert!(user(true, None).is_employee_like());
        assert!(user(false, Some("emp_support")).is_employee_like());
        assert!(user(false, Some("second_admin")).is_employee_like());
        assert!(!user(false, Some("vip")).is_employee_like());
        assert!(!user(false, None).is_employee_like());
    }

    #[test]
    fn test_contractor_promotion_and_revoke() {
        let mut u = user(false, None);
        u.promote_to_contractor(ReferralCode::new("TEST2").unwrap(), Decimal::new(85, 4));
        assert!(u.is_contractor);
        assert_eq!(u.contractor_commission_rate, Some(Decimal::new(85, 4)));

        u.revoke_contractor();
        assert!(!u.is_contractor);
        assert_eq!(u.referral_code.as_ref().map(|c| c.as_str()), Some("TEST2"));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut u = user(false, None);
        assert_eq!(u.display_name(), "e@example.com");
        u.first_name = Some("Ada".to_string());
        u.last_name = Some("Lovelace".to_string());
        assert_eq!(u.display_name(), "Ada Lovelace");
    }
}
