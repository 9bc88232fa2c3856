//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use kernel::error::app_error::AppError;

use crate::application::config::AuthConfig;
use crate::application::email_verification::{EmailTokenService, VerifyEmailUseCase};
use crate::application::kyc_review::KycReviewUseCase;
use crate::application::{
    CheckSessionUseCase, CompleteTwoFactorInput, CreateEmployeeInput, ManageEmployeesUseCase,
    ProfileUseCase, SetContractorInput, SetContractorUseCase, SignInInput, SignInOutput,
    SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase, TotpSetupUseCase,
    UpdateEmployeeInput, VerificationMailer,
};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CompleteLoginRequest, CreateEmployeeRequest, KycQueueQuery, LoginRequest, LoginResponse,
    PermissionGrantResponse, ProfileResponse, RegisterRequest, RegisterResponse,
    SessionStatusResponse, SetContractorRequest, SetPermissionRequest, TotpCodeRequest,
    TotpSetupResponse, UpdateEmployeeRequest, UpdateKycRequest, UserResponse, VerifyEmailQuery,
    VerifyEmailResponse,
};
use crate::presentation::middleware::{CurrentUser, Fingerprint};

const DEFAULT_KYC_QUEUE_LIMIT: i64 = 50;

/// Shared state for auth handlers
pub struct AuthAppState<R, M>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
}

impl<R, M> Clone for AuthAppState<R, M>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Registration and login
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<RegisterResponse>)>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignUpInput {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            referral_code: req.referral_code,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: output.user_id.as_i64(),
            email_verification_sent: output.email_verification_sent,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Fingerprint(fingerprint): Fingerprint,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let output = sign_in_use_case(&state)
        .execute(
            SignInInput {
                email: req.email,
                password: req.password,
                remember_me: req.remember_me,
            },
            fingerprint,
        )
        .await?;

    Ok(login_response(&state.config, output))
}

/// POST /api/auth/session
pub async fn complete_login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Fingerprint(fingerprint): Fingerprint,
    Json(req): Json<CompleteLoginRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let output = sign_in_use_case(&state)
        .complete_two_factor(
            CompleteTwoFactorInput {
                pending_token: req.pending_token,
                code: req.code,
                remember_me: req.remember_me,
            },
            fingerprint,
        )
        .await?;

    Ok(login_response(&state.config, output))
}

/// POST /api/auth/logout
pub async fn logout<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    if let Some(token) = platform::cookie::extract_cookie(&headers, &state.config.cookie.name) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // The cookie is cleared either way
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign out with stale session");
        }
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&state.config.cookie.build_delete_cookie()) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// GET /api/auth/status
pub async fn session_status<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    fingerprint: Result<Fingerprint, AuthError>,
) -> Json<SessionStatusResponse>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(&headers, &state.config.cookie.name);

    let info = match (token, fingerprint.ok()) {
        (Some(token), Some(Fingerprint(fp))) => {
            CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone())
                .execute(&token, &fp.hash)
                .await
                .ok()
        }
        _ => None,
    };

    Json(info.map(SessionStatusResponse::from).unwrap_or_default())
}

/// GET /api/auth/me
pub async fn me<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(user): CurrentUser,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let output = ProfileUseCase::new(state.repo.clone()).execute(user).await?;
    Ok(Json(ProfileResponse::from(output)))
}

// ============================================================================
// Email verification
// ============================================================================

/// GET /api/verify-email?token=..&userId=..
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Query(query): Query<VerifyEmailQuery>,
) -> AuthResult<Json<VerifyEmailResponse>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let tokens = EmailTokenService::new(
        &state.config.email_token_secret,
        state.config.email_token_ttl,
    );

    VerifyEmailUseCase::new(state.repo.clone(), tokens)
        .execute(&query.token, UserId::from_i64(query.user_id))
        .await?;

    Ok(Json(VerifyEmailResponse { verified: true }))
}

// ============================================================================
// TOTP
// ============================================================================

/// POST /api/2fa/setup
pub async fn totp_setup<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(user): CurrentUser,
) -> AuthResult<Json<TotpSetupResponse>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let output = TotpSetupUseCase::new(state.repo.clone(), state.repo.clone())
        .setup(user.user_id)
        .await?;

    Ok(Json(TotpSetupResponse::from(output)))
}

/// POST /api/2fa/verify
pub async fn totp_verify<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<TotpCodeRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    TotpSetupUseCase::new(state.repo.clone(), state.repo.clone())
        .verify(user.user_id, &req.code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/2fa/disable
pub async fn totp_disable<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<TotpCodeRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    TotpSetupUseCase::new(state.repo.clone(), state.repo.clone())
        .disable(user.user_id, &req.code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/employees
pub async fn list_employees<R, M>(
    State(state): State<AuthAppState<R, M>>,
) -> AuthResult<Json<Vec<UserResponse>>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let employees = employees_use_case(&state).list().await?;
    Ok(Json(employees.iter().map(UserResponse::from).collect()))
}

/// POST /api/admin/employees
pub async fn create_employee<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(admin): CurrentUser,
    Json(req): Json<CreateEmployeeRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let user = employees_use_case(&state)
        .create(
            &admin,
            CreateEmployeeInput {
                email: req.email,
                password: req.password,
                first_name: req.first_name,
                last_name: req.last_name,
                user_group: req.user_group,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// PATCH /api/admin/employees/{id}
pub async fn update_employee<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let user = employees_use_case(&state)
        .update(
            &admin,
            UserId::from_i64(user_id),
            UpdateEmployeeInput {
                is_employee: req.is_employee,
                user_group: req.user_group,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/admin/employees/{id}/permissions
pub async fn list_permissions<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Path(user_id): Path<i64>,
) -> AuthResult<Json<Vec<PermissionGrantResponse>>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let grants = employees_use_case(&state)
        .list_grants(UserId::from_i64(user_id))
        .await?;

    Ok(Json(grants.iter().map(PermissionGrantResponse::from).collect()))
}

/// POST /api/admin/employees/{id}/permissions
pub async fn set_permission<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<i64>,
    Json(req): Json<SetPermissionRequest>,
) -> AuthResult<Json<PermissionGrantResponse>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let grant = employees_use_case(&state)
        .set_grant(
            &admin,
            UserId::from_i64(user_id),
            &req.permission_type,
            req.granted,
        )
        .await?;

    Ok(Json(PermissionGrantResponse::from(&grant)))
}

/// DELETE /api/admin/employees/{id}/permissions/{permission_type}
pub async fn revoke_permission<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(admin): CurrentUser,
    Path((user_id, permission_type)): Path<(i64, String)>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let removed = employees_use_case(&state)
        .revoke_grant(&admin, UserId::from_i64(user_id), &permission_type)
        .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Permission grant not found").into())
    }
}

/// PATCH /api/admin/users/{id}/contractor
pub async fn set_contractor<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<i64>,
    Json(req): Json<SetContractorRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let user = SetContractorUseCase::new(state.repo.clone())
        .execute(
            &admin,
            UserId::from_i64(user_id),
            SetContractorInput {
                is_contractor: req.is_contractor,
                referral_code: req.referral_code,
                commission_rate: req.commission_rate,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

// ============================================================================
// Employee: KYC
// ============================================================================

/// GET /api/employee/dashboard/kyc
pub async fn kyc_queue<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Query(query): Query<KycQueueQuery>,
) -> AuthResult<Json<Vec<UserResponse>>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let users = KycReviewUseCase::new(state.repo.clone())
        .pending(query.limit.unwrap_or(DEFAULT_KYC_QUEUE_LIMIT))
        .await?;

    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// PATCH /api/employee/kyc/{user_id}
pub async fn update_kyc<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(reviewer): CurrentUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateKycRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    let user = KycReviewUseCase::new(state.repo.clone())
        .set_status(&reviewer, UserId::from_i64(user_id), &req.status)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn sign_in_use_case<R, M>(state: &AuthAppState<R, M>) -> SignInUseCase<R, R, R>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    )
}

fn employees_use_case<R, M>(state: &AuthAppState<R, M>) -> ManageEmployeesUseCase<R, R>
where
    R: AuthStore,
    M: VerificationMailer + Send + Sync + 'static,
{
    ManageEmployeesUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone())
}

/// Session cookie on success, pending token when a TOTP code is still needed
fn login_response(config: &AuthConfig, output: SignInOutput) -> Response {
    match output {
        SignInOutput::Session {
            session_token,
            user,
            remember_me,
        } => {
            let max_age = config.session_ttl(remember_me).as_secs();
            let body = Json(LoginResponse {
                requires_2fa: false,
                pending_token: None,
                user: Some(UserResponse::from(&user)),
            });

            match config.cookie.set_cookie_header(&session_token, max_age) {
                Some(cookie) => (StatusCode::OK, [(header::SET_COOKIE, cookie)], body).into_response(),
                None => AuthError::Internal("Session cookie is not a valid header".to_string())
                    .into_response(),
            }
        }
        SignInOutput::TwoFactorRequired { pending_token } => Json(LoginResponse {
            requires_2fa: true,
            pending_token: Some(pending_token),
            user: None,
        })
        .into_response(),
    }
}
