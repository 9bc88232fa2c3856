//! Router and use-case tests for the auth crate
//!
//! Everything runs against `MemoryAuthRepository`; requests go through the
//! real router with `tower::ServiceExt::oneshot`.

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::application::config::AuthConfig;
    use crate::application::mailer::VerificationMailer;
    use crate::domain::entity::user::{NewUser, User};
    use crate::domain::value_object::email::Email;
    use crate::error::AuthResult;
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::router::auth_router_generic;

    pub const PASSWORD: &str = "Kx9#vLq2!Wm4";
    pub const USER_AGENT: &str = "Mozilla/5.0 Test Browser";

    /// Keeps every link instead of sending it
    #[derive(Clone, Default)]
    pub struct RecordingMailer {
        pub links: Arc<Mutex<Vec<String>>>,
    }

    impl VerificationMailer for RecordingMailer {
        async fn send_verification(&self, _to: &Email, link: &str) -> AuthResult<()> {
            self.links
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(link.to_string());
            Ok(())
        }
    }

    pub struct TestApp {
        pub router: Router,
        pub repo: MemoryAuthRepository,
        pub mailer: RecordingMailer,
        pub config: Arc<AuthConfig>,
    }

    impl TestApp {
        pub fn new() -> Self {
            let repo = MemoryAuthRepository::new();
            let mailer = RecordingMailer::default();
            let config = Arc::new(AuthConfig::development());
            let router = auth_router_generic(
                Arc::new(repo.clone()),
                Arc::new(mailer.clone()),
                config.clone(),
            );

            Self {
                router,
                repo,
                mailer,
                config,
            }
        }

        pub fn user(&self, email: &str, customize: impl FnOnce(&mut User)) -> User {
            let mut user = self
                .repo
                .seed(NewUser::customer(Email::new(email).unwrap()), PASSWORD)
                .unwrap();
            customize(&mut user);
            self.repo.put_user(user.clone());
            user
        }

        pub async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(request).await.unwrap()
        }

        /// Log in and return the `Cookie` header value
        pub async fn login(&self, email: &str) -> String {
            let response = self
                .send(json_request(
                    "POST",
                    "/auth/login",
                    None,
                    serde_json::json!({ "email": email, "password": PASSWORD }),
                ))
                .await;
            assert_eq!(response.status(), 200);
            session_cookie(&response)
        }
    }

    pub fn session_cookie(response: &Response<Body>) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("Set-Cookie header")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn json_request(
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod gate_tests {
    use super::support::*;
    use crate::domain::entity::permission_grant::PermissionGrant;
    use crate::domain::repository::PermissionRepository;
    use crate::domain::value_object::{
        kyc_status::KycStatus, permission_type::PermissionType, user_group::UserGroup,
    };

    #[tokio::test]
    async fn test_protected_route_requires_session() {
        let app = TestApp::new();

        let response = app.send(request("GET", "/auth/me", None)).await;
        assert_eq!(response.status(), 401);
        assert_eq!(body_json(response).await["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn test_forged_cookie_is_rejected() {
        let app = TestApp::new();

        let response = app
            .send(request(
                "GET",
                "/auth/me",
                Some("auth_session=00000000-0000-0000-0000-000000000000.bm90LWEtc2ln"),
            ))
            .await;
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn test_admin_gate() {
        let app = TestApp::new();
        app.user("customer@example.com", |_| {});
        app.user("admin@example.com", |u| u.is_admin = true);

        let cookie = app.login("customer@example.com").await;
        let response = app
            .send(request("GET", "/admin/employees", Some(&cookie)))
            .await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["code"], "ADMIN_REQUIRED");

        let cookie = app.login("admin@example.com").await;
        let response = app
            .send(request("GET", "/admin/employees", Some(&cookie)))
            .await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_employee_gate_accepts_employee_like_groups() {
        let app = TestApp::new();
        app.user("customer@example.com", |_| {});
        app.user("support@example.com", |u| {
            u.user_group = Some(UserGroup::new("emp_support").unwrap())
        });

        let cookie = app.login("customer@example.com").await;
        let response = app
            .send(request("GET", "/employee/dashboard/kyc", Some(&cookie)))
            .await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["code"], "EMPLOYEE_REQUIRED");

        let cookie = app.login("support@example.com").await;
        let response = app
            .send(request("GET", "/employee/dashboard/kyc", Some(&cookie)))
            .await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_kyc_review_requires_granted_permission() {
        let app = TestApp::new();
        let reviewer = app.user("kyc@example.com", |u| u.is_employee = true);
        let customer = app.user("customer@example.com", |u| {
            u.kyc_status = KycStatus::Pending
        });
        let uri = format!("/employee/kyc/{}", customer.user_id);
        let body = serde_json::json!({ "status": "approved" });

        let cookie = app.login("kyc@example.com").await;
        let response = app
            .send(json_request("PATCH", &uri, Some(&cookie), body.clone()))
            .await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["code"], "PERMISSION_DENIED");

        // An explicit denial row still denies
        let denied = PermissionGrant::new(
            reviewer.user_id,
            PermissionType::kyc_review(),
            false,
            reviewer.user_id,
        );
        app.repo.upsert_grant(&denied).await.unwrap();
        let response = app
            .send(json_request("PATCH", &uri, Some(&cookie), body.clone()))
            .await;
        assert_eq!(response.status(), 403);

        let granted = PermissionGrant::new(
            reviewer.user_id,
            PermissionType::kyc_review(),
            true,
            reviewer.user_id,
        );
        app.repo.upsert_grant(&granted).await.unwrap();
        let response = app
            .send(json_request("PATCH", &uri, Some(&cookie), body))
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["kycStatus"], "approved");
        assert_eq!(
            app.repo.user(customer.user_id).unwrap().kyc_status,
            KycStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_failed_grant_lookup_is_a_server_error() {
        let app = TestApp::new();
        app.user("kyc@example.com", |u| u.is_employee = true);
        app.user("admin@example.com", |u| {
            u.is_admin = true;
            u.is_employee = true;
        });
        let customer = app.user("customer@example.com", |u| {
            u.kyc_status = KycStatus::Pending
        });
        let uri = format!("/employee/kyc/{}", customer.user_id);
        let body = serde_json::json!({ "status": "approved" });
        app.repo.state().fail_grant_lookups = true;

        let cookie = app.login("kyc@example.com").await;
        let response = app
            .send(json_request("PATCH", &uri, Some(&cookie), body.clone()))
            .await;
        assert_eq!(response.status(), 500);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(json["detail"], "An unexpected error occurred");
        assert_eq!(app.repo.state().grant_lookups, 1);

        // Admins never reach the grant table
        let cookie = app.login("admin@example.com").await;
        let response = app
            .send(json_request("PATCH", &uri, Some(&cookie), body))
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(app.repo.state().grant_lookups, 1);
    }

    #[tokio::test]
    async fn test_session_bound_to_user_agent() {
        let app = TestApp::new();
        app.user("customer@example.com", |_| {});
        let cookie = app.login("customer@example.com").await;

        let request = axum::http::Request::builder()
            .uri("/auth/me")
            .header("user-agent", "curl/8.0")
            .header("cookie", &cookie)
            .body(axum::body::Body::empty())
            .unwrap();

        let response = app.send(request).await;
        assert_eq!(response.status(), 401);
        assert_eq!(body_json(response).await["code"], "AUTH_REQUIRED");
    }
}

#[cfg(test)]
mod account_tests {
    use super::support::*;
    use crate::application::email_verification::EmailTokenService;
    use crate::domain::value_object::{referral_code::ReferralCode, user_id::UserId};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_register_with_referral_code() {
        let app = TestApp::new();
        let contractor = app.user("partner@example.com", |u| {
            u.promote_to_contractor(ReferralCode::new("TEST2").unwrap(), Decimal::new(85, 4))
        });

        let response = app
            .send(json_request(
                "POST",
                "/auth/register",
                None,
                serde_json::json!({
                    "email": "New.Customer@Example.com",
                    "password": PASSWORD,
                    "firstName": "Ada",
                    "referralCode": "test2"
                }),
            ))
            .await;
        assert_eq!(response.status(), 201);

        let body = body_json(response).await;
        assert_eq!(body["emailVerificationSent"], true);

        let user = app
            .repo
            .user(UserId::from_i64(body["userId"].as_i64().unwrap()))
            .unwrap();
        assert_eq!(user.email.as_str(), "new.customer@example.com");
        assert_eq!(user.contractor_id, Some(contractor.user_id));
        assert_eq!(user.referred_by.as_ref().map(|c| c.as_str()), Some("TEST2"));
        assert!(!user.email_verified);
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_referral_code() {
        let app = TestApp::new();

        let response = app
            .send(json_request(
                "POST",
                "/auth/register",
                None,
                serde_json::json!({
                    "email": "someone@example.com",
                    "password": PASSWORD,
                    "referralCode": "NOPE1"
                }),
            ))
            .await;
        assert_eq!(response.status(), 400);
        assert_eq!(body_json(response).await["code"], "INVALID_REFERRAL_CODE");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let app = TestApp::new();
        app.user("taken@example.com", |_| {});

        let response = app
            .send(json_request(
                "POST",
                "/auth/register",
                None,
                serde_json::json!({ "email": "TAKEN@example.com", "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), 409);
        assert_eq!(body_json(response).await["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn test_verification_link_verifies_email() {
        let app = TestApp::new();

        let response = app
            .send(json_request(
                "POST",
                "/auth/register",
                None,
                serde_json::json!({ "email": "verify@example.com", "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), 201);

        let link = app.mailer.links.lock().unwrap()[0].clone();
        let query = link.split_once('?').unwrap().1;

        let response = app
            .send(request("GET", &format!("/verify-email?{query}"), None))
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["verified"], true);

        let user = app
            .repo
            .state()
            .users
            .values()
            .find(|u| u.email.as_str() == "verify@example.com")
            .cloned()
            .unwrap();
        assert!(user.email_verified);
    }

    #[tokio::test]
    async fn test_verification_rejects_other_user_id() {
        let app = TestApp::new();
        let victim = app.user("victim@example.com", |_| {});
        let attacker = app.user("attacker@example.com", |_| {});

        let tokens = EmailTokenService::new(
            &app.config.email_token_secret,
            app.config.email_token_ttl,
        );
        let token = tokens.generate(attacker.user_id, &attacker.email).unwrap();

        let uri = format!("/verify-email?token={token}&userId={}", victim.user_id);
        let response = app.send(request("GET", &uri, None)).await;
        assert_eq!(response.status(), 400);
        assert_eq!(body_json(response).await["code"], "INVALID_TOKEN");
        assert!(!app.repo.user(victim.user_id).unwrap().email_verified);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let app = TestApp::new();
        app.user("customer@example.com", |_| {});

        let response = app
            .send(json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({ "email": "customer@example.com", "password": "wrong-password" }),
            ))
            .await;
        assert_eq!(response.status(), 401);
        assert_eq!(body_json(response).await["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_status_and_logout() {
        let app = TestApp::new();
        let user = app.user("customer@example.com", |_| {});

        let response = app.send(request("GET", "/auth/status", None)).await;
        assert_eq!(body_json(response).await["authenticated"], false);

        let cookie = app.login("customer@example.com").await;
        let response = app
            .send(request("GET", "/auth/status", Some(&cookie)))
            .await;
        let body = body_json(response).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["userId"], user.user_id.as_i64());

        let response = app
            .send(request("POST", "/auth/logout", Some(&cookie)))
            .await;
        assert_eq!(response.status(), 204);
        assert_eq!(app.repo.session_count(), 0);

        let response = app.send(request("GET", "/auth/me", Some(&cookie))).await;
        assert_eq!(response.status(), 401);
    }
}

#[cfg(test)]
mod two_factor_tests {
    use super::support::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_login_with_two_factor() {
        let app = TestApp::new();
        let user = app.user("secure@example.com", |_| {});
        let secret = app.repo.enable_totp(user.user_id).unwrap();

        let response = app
            .send(json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({ "email": "secure@example.com", "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), 200);
        assert!(response.headers().get("set-cookie").is_none());

        let body = body_json(response).await;
        assert_eq!(body["requires2fa"], true);
        let pending_token = body["pendingToken"].as_str().unwrap().to_string();

        let wrong = app
            .send(json_request(
                "POST",
                "/auth/session",
                None,
                serde_json::json!({ "pendingToken": pending_token, "code": "not-a-code" }),
            ))
            .await;
        assert_eq!(wrong.status(), 401);
        assert_eq!(body_json(wrong).await["code"], "INVALID_2FA_CODE");

        let code = secret
            .generate_at(user.email.as_str(), Utc::now().timestamp() as u64)
            .unwrap();
        let response = app
            .send(json_request(
                "POST",
                "/auth/session",
                None,
                serde_json::json!({ "pendingToken": pending_token, "code": code }),
            ))
            .await;
        assert_eq!(response.status(), 200);
        let cookie = session_cookie(&response);

        let response = app.send(request("GET", "/auth/me", Some(&cookie))).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["is2faEnabled"], true);
    }

    #[tokio::test]
    async fn test_setup_verify_and_disable() {
        let app = TestApp::new();
        let user = app.user("setup@example.com", |_| {});
        let cookie = app.login("setup@example.com").await;

        let response = app
            .send(json_request(
                "POST",
                "/2fa/verify",
                Some(&cookie),
                serde_json::json!({ "code": "123456" }),
            ))
            .await;
        assert_eq!(body_json(response).await["code"], "2FA_NOT_SETUP");

        let response = app.send(request("POST", "/2fa/setup", Some(&cookie))).await;
        assert_eq!(response.status(), 200);
        let body = body_json(response).await;
        assert!(
            body["otpauthUrl"]
                .as_str()
                .unwrap()
                .starts_with("otpauth://totp/")
        );

        let secret = crate::domain::value_object::totp_secret::TotpSecret::from_base32(
            body["secret"].as_str().unwrap(),
        )
        .unwrap();
        let code = secret
            .generate_at(user.email.as_str(), Utc::now().timestamp() as u64)
            .unwrap();

        let response = app
            .send(json_request(
                "POST",
                "/2fa/verify",
                Some(&cookie),
                serde_json::json!({ "code": code }),
            ))
            .await;
        assert_eq!(response.status(), 204);

        let response = app
            .send(json_request(
                "POST",
                "/2fa/verify",
                Some(&cookie),
                serde_json::json!({ "code": code }),
            ))
            .await;
        assert_eq!(body_json(response).await["code"], "2FA_ALREADY_ENABLED");

        let response = app
            .send(json_request(
                "POST",
                "/2fa/disable",
                Some(&cookie),
                serde_json::json!({ "code": code }),
            ))
            .await;
        assert_eq!(response.status(), 204);
    }
}

#[cfg(test)]
mod admin_tests {
    use super::support::*;
    use crate::domain::value_object::referral_code::ReferralCode;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_employee_lifecycle_and_grants() {
        let app = TestApp::new();
        app.user("admin@example.com", |u| u.is_admin = true);
        let cookie = app.login("admin@example.com").await;

        let response = app
            .send(json_request(
                "POST",
                "/admin/employees",
                Some(&cookie),
                serde_json::json!({
                    "email": "staff@example.com",
                    "password": PASSWORD,
                    "userGroup": "kyc_employee"
                }),
            ))
            .await;
        assert_eq!(response.status(), 201);
        let employee = body_json(response).await;
        assert_eq!(employee["isEmployee"], true);
        assert_eq!(employee["emailVerified"], true);
        let id = employee["userId"].as_i64().unwrap();

        let response = app
            .send(json_request(
                "POST",
                &format!("/admin/employees/{id}/permissions"),
                Some(&cookie),
                serde_json::json!({ "permissionType": "kyc_review", "granted": true }),
            ))
            .await;
        assert_eq!(response.status(), 200);

        let response = app
            .send(request(
                "GET",
                &format!("/admin/employees/{id}/permissions"),
                Some(&cookie),
            ))
            .await;
        let grants = body_json(response).await;
        assert_eq!(grants.as_array().unwrap().len(), 1);
        assert_eq!(grants[0]["permissionType"], "kyc_review");
        assert_eq!(grants[0]["granted"], true);

        let response = app
            .send(request(
                "DELETE",
                &format!("/admin/employees/{id}/permissions/kyc_review"),
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), 204);

        let response = app
            .send(json_request(
                "PATCH",
                &format!("/admin/employees/{id}"),
                Some(&cookie),
                serde_json::json!({ "isEmployee": false, "userGroup": "" }),
            ))
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["isEmployee"], false);
    }

    #[tokio::test]
    async fn test_contractor_promotion() {
        let app = TestApp::new();
        app.user("admin@example.com", |u| u.is_admin = true);
        let owner = app.user("owner@example.com", |u| {
            u.promote_to_contractor(ReferralCode::new("TEST2").unwrap(), Decimal::new(85, 4))
        });
        let target = app.user("partner@example.com", |_| {});
        let cookie = app.login("admin@example.com").await;
        let uri = format!("/admin/users/{}/contractor", target.user_id);

        let response = app
            .send(json_request(
                "PATCH",
                &uri,
                Some(&cookie),
                serde_json::json!({ "isContractor": true, "referralCode": "TEST2", "commissionRate": "0.01" }),
            ))
            .await;
        assert_eq!(response.status(), 409);
        assert_eq!(body_json(response).await["code"], "REFERRAL_CODE_TAKEN");

        let response = app
            .send(json_request(
                "PATCH",
                &uri,
                Some(&cookie),
                serde_json::json!({ "isContractor": true, "commissionRate": "1.5" }),
            ))
            .await;
        assert_eq!(response.status(), 400);

        let response = app
            .send(json_request(
                "PATCH",
                &uri,
                Some(&cookie),
                serde_json::json!({ "isContractor": true, "commissionRate": "0.000000015" }),
            ))
            .await;
        assert_eq!(response.status(), 400);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
        assert_eq!(app.repo.user(target.user_id).unwrap().contractor_commission_rate, None);

        let response = app
            .send(json_request(
                "PATCH",
                &uri,
                Some(&cookie),
                serde_json::json!({ "isContractor": true, "commissionRate": "0.0085" }),
            ))
            .await;
        assert_eq!(response.status(), 200);
        let body = body_json(response).await;
        assert_eq!(body["isContractor"], true);
        assert!(body["referralCode"].as_str().is_some());

        let stored = app.repo.user(target.user_id).unwrap();
        assert_eq!(stored.contractor_commission_rate, Some(Decimal::new(85, 4)));
        assert_ne!(stored.referral_code, owner.referral_code);
    }
}
