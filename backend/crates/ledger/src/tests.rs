//! Settlement, analytics and router tests for the ledger crate
//!
//! Users live in auth's `MemoryAuthRepository`; the ledger's memory store
//! wraps the same instance.

#[cfg(test)]
mod support {
    use std::sync::Arc;

    use auth::application::config::AuthConfig;
    use auth::application::mailer::LogMailer;
    use auth::domain::entity::user::{NewUser, User};
    use auth::domain::value_object::{
        email::Email, referral_code::ReferralCode, user_id::UserId,
    };
    use auth::infra::memory::MemoryAuthRepository;
    use auth::presentation::middleware::AuthGate;
    use auth::auth_router_generic;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, header};
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::infra::memory::MemoryLedgerRepository;
    use crate::presentation::router::ledger_router_generic;

    pub const PASSWORD: &str = "Kx9#vLq2!Wm4";
    pub const USER_AGENT: &str = "Mozilla/5.0 Test Browser";

    pub fn rate() -> Decimal {
        Decimal::new(85, 4)
    }

    pub fn seed(auth: &MemoryAuthRepository, email: &str, customize: impl FnOnce(&mut User)) -> User {
        let mut user = auth
            .seed(NewUser::customer(Email::new(email).unwrap()), PASSWORD)
            .unwrap();
        customize(&mut user);
        auth.put_user(user.clone());
        user
    }

    /// Contractor 102 owning `TEST2` at 0.85 %, and a customer it referred
    pub fn referral_scenario(auth: &MemoryAuthRepository) -> (User, User) {
        let mut contractor = seed(auth, "partner@example.com", |_| {});
        auth.state().users.remove(&contractor.user_id);
        contractor.user_id = UserId::from_i64(102);
        contractor.promote_to_contractor(ReferralCode::new("TEST2").unwrap(), rate());
        auth.put_user(contractor.clone());

        let customer = auth
            .seed(
                NewUser::customer(Email::new("customer@example.com").unwrap())
                    .referred(ReferralCode::new("TEST2").unwrap(), contractor.user_id),
                PASSWORD,
            )
            .unwrap();

        (contractor, customer)
    }

    pub struct TestApp {
        pub router: Router,
        pub auth: MemoryAuthRepository,
        pub ledger: MemoryLedgerRepository,
    }

    impl TestApp {
        pub fn new() -> Self {
            let auth = MemoryAuthRepository::new();
            let ledger = MemoryLedgerRepository::new(auth.clone());
            let config = Arc::new(AuthConfig::development());
            let auth_repo = Arc::new(auth.clone());

            let gate = AuthGate::new(auth_repo.clone(), config.clone());
            let router = auth_router_generic(auth_repo, Arc::new(LogMailer), config)
                .merge(ledger_router_generic(Arc::new(ledger.clone()), gate));

            Self {
                router,
                auth,
                ledger,
            }
        }

        pub async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(request).await.unwrap()
        }

        pub async fn login(&self, email: &str) -> String {
            let response = self
                .send(request(
                    "POST",
                    "/auth/login",
                    None,
                    Some(serde_json::json!({ "email": email, "password": PASSWORD })),
                ))
                .await;
            assert_eq!(response.status(), 200);

            let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
            set_cookie.split(';').next().unwrap().to_string()
        }
    }

    pub fn request(
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }
}

#[cfg(test)]
mod settlement_tests {
    use std::sync::Arc;

    use auth::infra::memory::MemoryAuthRepository;
    use kernel::id::{DepositId, UserId};
    use rust_decimal::Decimal;

    use super::support::*;
    use crate::application::{CreateDepositInput, CreateDepositUseCase, SettleDepositUseCase};
    use crate::domain::value_objects::DepositStatus;
    use crate::error::LedgerError;
    use crate::infra::memory::MemoryLedgerRepository;

    fn eur(amount: &str) -> CreateDepositInput {
        CreateDepositInput {
            amount: amount.parse().unwrap(),
            currency: "eur".to_string(),
        }
    }

    #[tokio::test]
    async fn test_referred_deposit_pays_contractor_commission() {
        let auth = MemoryAuthRepository::new();
        let (_contractor, customer) = referral_scenario(&auth);
        let ledger = Arc::new(MemoryLedgerRepository::new(auth.clone()));

        let deposit = CreateDepositUseCase::new(ledger.clone())
            .execute(&customer, eur("1000"))
            .await
            .unwrap();
        assert_eq!(deposit.status, DepositStatus::Pending);
        assert_eq!(deposit.referral_code.as_ref().unwrap().as_str(), "TEST2");
        assert!(deposit.reference.as_str().starts_with("DEP-"));

        let settlement = SettleDepositUseCase::new(ledger.clone())
            .execute(&customer, deposit.deposit_id, "completed")
            .await
            .unwrap();

        assert!(settlement.transitioned);
        assert!(settlement.balance_credited);
        assert_eq!(settlement.deposit.contractor_id, Some(UserId::from_i64(102)));
        assert_eq!(
            settlement.deposit.contractor_commission,
            Some(Decimal::new(850, 2))
        );
        assert_eq!(
            auth.user(customer.user_id).unwrap().balance,
            Decimal::new(1000, 0)
        );
    }

    #[tokio::test]
    async fn test_duplicate_settlement_does_not_credit_twice() {
        let auth = MemoryAuthRepository::new();
        let (_contractor, customer) = referral_scenario(&auth);
        let ledger = Arc::new(MemoryLedgerRepository::new(auth.clone()));
        let settle = SettleDepositUseCase::new(ledger.clone());

        let deposit = CreateDepositUseCase::new(ledger.clone())
            .execute(&customer, eur("1000"))
            .await
            .unwrap();
        settle
            .execute(&customer, deposit.deposit_id, "completed")
            .await
            .unwrap();

        let again = settle
            .execute(&customer, deposit.deposit_id, "completed")
            .await
            .unwrap();
        assert!(!again.transitioned);
        assert!(!again.balance_credited);

        let reversed = settle
            .execute(&customer, deposit.deposit_id, "failed")
            .await
            .unwrap();
        assert!(!reversed.transitioned);
        assert_eq!(reversed.deposit.status, DepositStatus::Completed);

        assert_eq!(
            auth.user(customer.user_id).unwrap().balance,
            Decimal::new(1000, 0)
        );
    }

    #[tokio::test]
    async fn test_contractor_resolved_from_referral_code() {
        let auth = MemoryAuthRepository::new();
        let (_contractor, mut customer) = referral_scenario(&auth);
        // Referral code recorded, back-reference missing
        customer.contractor_id = None;
        auth.put_user(customer.clone());
        let ledger = Arc::new(MemoryLedgerRepository::new(auth.clone()));

        let deposit = CreateDepositUseCase::new(ledger.clone())
            .execute(&customer, eur("200.00"))
            .await
            .unwrap();
        assert_eq!(deposit.contractor_id, None);

        let settlement = SettleDepositUseCase::new(ledger.clone())
            .execute(&customer, deposit.deposit_id, "completed")
            .await
            .unwrap();
        assert_eq!(settlement.deposit.contractor_id, Some(UserId::from_i64(102)));
        assert_eq!(
            settlement.deposit.contractor_commission,
            Some(Decimal::new(17, 1))
        );
    }

    #[tokio::test]
    async fn test_revoked_contractor_earns_nothing() {
        let auth = MemoryAuthRepository::new();
        let (mut contractor, customer) = referral_scenario(&auth);
        contractor.revoke_contractor();
        auth.put_user(contractor);
        let ledger = Arc::new(MemoryLedgerRepository::new(auth.clone()));

        let deposit = CreateDepositUseCase::new(ledger.clone())
            .execute(&customer, eur("1000"))
            .await
            .unwrap();
        let settlement = SettleDepositUseCase::new(ledger.clone())
            .execute(&customer, deposit.deposit_id, "completed")
            .await
            .unwrap();

        assert_eq!(settlement.deposit.status, DepositStatus::Completed);
        assert_eq!(settlement.deposit.contractor_commission, None);
    }

    #[tokio::test]
    async fn test_foreign_currency_is_not_credited() {
        let auth = MemoryAuthRepository::new();
        let customer = seed(&auth, "usd@example.com", |_| {});
        let ledger = Arc::new(MemoryLedgerRepository::new(auth.clone()));

        let deposit = CreateDepositUseCase::new(ledger.clone())
            .execute(
                &customer,
                CreateDepositInput {
                    amount: Decimal::new(50, 0),
                    currency: "USD".to_string(),
                },
            )
            .await
            .unwrap();
        let settlement = SettleDepositUseCase::new(ledger.clone())
            .execute(&customer, deposit.deposit_id, "completed")
            .await
            .unwrap();

        assert!(settlement.transitioned);
        assert!(!settlement.balance_credited);
        assert_eq!(auth.user(customer.user_id).unwrap().balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_failed_deposit_pays_nothing() {
        let auth = MemoryAuthRepository::new();
        let (_contractor, customer) = referral_scenario(&auth);
        let ledger = Arc::new(MemoryLedgerRepository::new(auth.clone()));

        let deposit = CreateDepositUseCase::new(ledger.clone())
            .execute(&customer, eur("1000"))
            .await
            .unwrap();
        let settlement = SettleDepositUseCase::new(ledger.clone())
            .execute(&customer, deposit.deposit_id, "failed")
            .await
            .unwrap();

        assert_eq!(settlement.deposit.status, DepositStatus::Failed);
        assert_eq!(settlement.deposit.contractor_commission, None);
        assert!(!settlement.balance_credited);
        assert_eq!(auth.user(customer.user_id).unwrap().balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_settlement_errors() {
        let auth = MemoryAuthRepository::new();
        let customer = seed(&auth, "c@example.com", |_| {});
        let ledger = Arc::new(MemoryLedgerRepository::new(auth.clone()));
        let settle = SettleDepositUseCase::new(ledger.clone());

        let missing = settle
            .execute(&customer, DepositId::from_i64(999), "completed")
            .await;
        assert!(matches!(missing, Err(LedgerError::DepositNotFound)));

        let pending = settle
            .execute(&customer, DepositId::from_i64(999), "pending")
            .await;
        assert!(matches!(
            pending,
            Err(LedgerError::InvalidSettlementStatus(_))
        ));

        let unknown = settle
            .execute(&customer, DepositId::from_i64(999), "settled")
            .await;
        assert!(matches!(unknown, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_deposit_validation() {
        let auth = MemoryAuthRepository::new();
        let customer = seed(&auth, "c@example.com", |_| {});
        let create = CreateDepositUseCase::new(Arc::new(MemoryLedgerRepository::new(auth)));

        assert!(create.execute(&customer, eur("0")).await.is_err());
        assert!(create.execute(&customer, eur("-10")).await.is_err());

        let bad_currency = CreateDepositInput {
            amount: Decimal::ONE,
            currency: "euro-coin".to_string(),
        };
        assert!(matches!(
            create.execute(&customer, bad_currency).await,
            Err(LedgerError::Validation(_))
        ));
    }
}

#[cfg(test)]
mod router_tests {
    use auth::domain::entity::permission_grant::PermissionGrant;
    use auth::domain::repository::PermissionRepository;
    use auth::domain::value_object::{
        kyc_status::KycStatus, permission_type::PermissionType, user_group::UserGroup,
    };
    use rust_decimal::Decimal;

    use super::support::*;

    #[tokio::test]
    async fn test_customer_creates_and_lists_deposits() {
        let app = TestApp::new();
        seed(&app.auth, "customer@example.com", |_| {});
        let cookie = app.login("customer@example.com").await;

        let response = app
            .send(request(
                "POST",
                "/deposits",
                Some(&cookie),
                Some(serde_json::json!({ "amount": "250.00", "currency": "EUR" })),
            ))
            .await;
        assert_eq!(response.status(), 201);
        let created = body_json(response).await;
        assert_eq!(created["status"], "pending");
        assert!(created["reference"].as_str().unwrap().starts_with("DEP-"));

        let response = app
            .send(request("GET", "/deposits", Some(&cookie), None))
            .await;
        assert_eq!(response.status(), 200);
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["depositId"], created["depositId"]);
    }

    #[tokio::test]
    async fn test_deposits_require_session() {
        let app = TestApp::new();

        let response = app.send(request("GET", "/deposits", None, None)).await;
        assert_eq!(response.status(), 401);
        assert_eq!(body_json(response).await["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn test_backoffice_settlement_requires_manage_deposits() {
        let app = TestApp::new();
        let (_contractor, _customer) = referral_scenario(&app.auth);
        let clerk = seed(&app.auth, "clerk@example.com", |u| {
            u.user_group = Some(UserGroup::new("emp_payments").unwrap())
        });

        let customer_cookie = app.login("customer@example.com").await;
        let response = app
            .send(request(
                "POST",
                "/deposits",
                Some(&customer_cookie),
                Some(serde_json::json!({ "amount": "1000", "currency": "EUR" })),
            ))
            .await;
        let deposit_id = body_json(response).await["depositId"].as_i64().unwrap();
        let uri = format!("/backoffice/deposits/{deposit_id}/settle");
        let body = serde_json::json!({ "status": "completed" });

        let cookie = app.login("clerk@example.com").await;
        let response = app
            .send(request("POST", &uri, Some(&cookie), Some(body.clone())))
            .await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["code"], "PERMISSION_DENIED");

        app.auth
            .upsert_grant(&PermissionGrant::new(
                clerk.user_id,
                PermissionType::manage_deposits(),
                true,
                clerk.user_id,
            ))
            .await
            .unwrap();

        let response = app
            .send(request("POST", &uri, Some(&cookie), Some(body.clone())))
            .await;
        assert_eq!(response.status(), 200);
        let settled = body_json(response).await;
        assert_eq!(settled["status"], "completed");
        assert_eq!(settled["contractorId"], 102);
        assert_eq!(decimal(&settled["contractorCommission"]), Decimal::new(850, 2));
        assert_eq!(settled["alreadySettled"], false);
        assert_eq!(settled["balanceCredited"], true);

        let response = app
            .send(request("POST", &uri, Some(&cookie), Some(body)))
            .await;
        let again = body_json(response).await;
        assert_eq!(again["alreadySettled"], true);
        assert_eq!(again["balanceCredited"], false);
    }

    #[tokio::test]
    async fn test_admin_settlement_route() {
        let app = TestApp::new();
        seed(&app.auth, "admin@example.com", |u| u.is_admin = true);
        seed(&app.auth, "customer@example.com", |_| {});
        let admin = app.login("admin@example.com").await;
        let customer = app.login("customer@example.com").await;

        let response = app
            .send(request(
                "POST",
                "/admin/deposits/1/settle",
                Some(&customer),
                Some(serde_json::json!({ "status": "completed" })),
            ))
            .await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["code"], "ADMIN_REQUIRED");

        let response = app
            .send(request(
                "POST",
                "/admin/deposits/1/settle",
                Some(&admin),
                Some(serde_json::json!({ "status": "completed" })),
            ))
            .await;
        assert_eq!(response.status(), 404);
        assert_eq!(body_json(response).await["code"], "DEPOSIT_NOT_FOUND");

        app.send(request(
            "POST",
            "/deposits",
            Some(&customer),
            Some(serde_json::json!({ "amount": "10", "currency": "EUR" })),
        ))
        .await;

        let response = app
            .send(request(
                "POST",
                "/admin/deposits/1/settle",
                Some(&admin),
                Some(serde_json::json!({ "status": "pending" })),
            ))
            .await;
        assert_eq!(response.status(), 400);
        assert_eq!(
            body_json(response).await["code"],
            "INVALID_SETTLEMENT_STATUS"
        );

        // Admins hold every permission without a grant
        let response = app
            .send(request(
                "POST",
                "/backoffice/deposits/1/settle",
                Some(&admin),
                Some(serde_json::json!({ "status": "cancelled" })),
            ))
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_contractor_analytics() {
        let app = TestApp::new();
        let contractor = seed(&app.auth, "partner@example.com", |u| {
            u.promote_to_contractor(
                auth::domain::value_object::referral_code::ReferralCode::new("TEST2").unwrap(),
                rate(),
            )
        });
        let customer = seed(&app.auth, "customer@example.com", |u| {
            u.contractor_id = Some(contractor.user_id)
        });

        let customer_cookie = app.login("customer@example.com").await;
        let response = app
            .send(request(
                "GET",
                "/contractor/analytics",
                Some(&customer_cookie),
                None,
            ))
            .await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["code"], "CONTRACTOR_REQUIRED");

        let ledger = std::sync::Arc::new(app.ledger.clone());
        let deposit = crate::application::CreateDepositUseCase::new(ledger.clone())
            .execute(
                &customer,
                crate::application::CreateDepositInput {
                    amount: Decimal::new(1000, 0),
                    currency: "EUR".to_string(),
                },
            )
            .await
            .unwrap();
        crate::application::SettleDepositUseCase::new(ledger)
            .execute(&customer, deposit.deposit_id, "completed")
            .await
            .unwrap();

        let cookie = app.login("partner@example.com").await;
        let response = app
            .send(request("GET", "/contractor/analytics", Some(&cookie), None))
            .await;
        assert_eq!(response.status(), 200);

        let body = body_json(response).await;
        assert_eq!(body["referralCode"], "TEST2");
        assert_eq!(body["referredUsers"], 1);
        assert_eq!(body["completedDeposits"], 1);
        assert_eq!(body["totals"][0]["currency"], "EUR");
        assert_eq!(decimal(&body["totals"][0]["volume"]), Decimal::new(1000, 0));
        assert_eq!(decimal(&body["totals"][0]["commission"]), Decimal::new(850, 2));
    }

    #[tokio::test]
    async fn test_employee_dashboard() {
        let app = TestApp::new();
        seed(&app.auth, "kyc@example.com", |u| {
            u.user_group = Some(UserGroup::new("kyc_employee").unwrap())
        });
        seed(&app.auth, "waiting@example.com", |u| {
            u.kyc_status = KycStatus::Pending
        });
        let customer = app.login("waiting@example.com").await;

        let response = app
            .send(request("GET", "/employee/dashboard", Some(&customer), None))
            .await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["code"], "EMPLOYEE_REQUIRED");

        for amount in ["10", "20"] {
            app.send(request(
                "POST",
                "/deposits",
                Some(&customer),
                Some(serde_json::json!({ "amount": amount, "currency": "EUR" })),
            ))
            .await;
        }

        let cookie = app.login("kyc@example.com").await;
        let response = app
            .send(request("GET", "/employee/dashboard", Some(&cookie), None))
            .await;
        assert_eq!(response.status(), 200);
        let body = body_json(response).await;
        assert_eq!(body["totalUsers"], 2);
        assert_eq!(body["pendingKyc"], 1);
        assert_eq!(body["deposits"]["pending"], 2);
        assert_eq!(body["deposits"]["completed"], 0);

        let response = app
            .send(request(
                "GET",
                "/employee/dashboard/deposits?status=pending&limit=1",
                Some(&cookie),
                None,
            ))
            .await;
        assert_eq!(response.status(), 200);
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let response = app
            .send(request(
                "GET",
                "/employee/dashboard/deposits?status=bogus",
                Some(&cookie),
                None,
            ))
            .await;
        assert_eq!(response.status(), 400);
    }
}
