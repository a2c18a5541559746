//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use platform::rate_limit::RateLimitStore;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ConfirmationUseCase, ProfileUseCase, SessionService, SignInInput,
    SignInUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::entity::principal::Principal;
use crate::domain::mailer::CodeMailer;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ConfirmEmailRequest, ResendCodeRequest, SessionResponse, SessionStatusResponse,
    SignInRequest, SignUpRequest, SignUpResponse, UpdateNameRequest, UpdatePasswordRequest,
    UserInfoResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<S, U, M>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    pub sessions: Arc<SessionService<S, U>>,
    pub users: Arc<U>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
}

impl<S, U, M> AuthAppState<S, U, M>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    pub fn new(store: S, users: U, mailer: M, config: AuthConfig) -> Self {
        let users = Arc::new(users);
        let config = Arc::new(config);
        Self {
            sessions: Arc::new(SessionService::new(
                Arc::new(store),
                users.clone(),
                config.clone(),
            )),
            users,
            mailer: Arc::new(mailer),
            config,
        }
    }

    fn confirmation(&self) -> ConfirmationUseCase<S, U, M> {
        ConfirmationUseCase::new(self.sessions.clone(), self.users.clone(), self.mailer.clone())
    }

    fn profile(&self) -> ProfileUseCase<S, U> {
        ProfileUseCase::new(self.sessions.clone(), self.users.clone())
    }
}

// Derive would require S, U, M: Clone
impl<S, U, M> Clone for AuthAppState<S, U, M>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            users: self.users.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Sign Up / Sign In / Sign Out
// ============================================================================

/// POST /v1/users
pub async fn sign_up<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<SignUpResponse>)>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.users.clone(), state.config.clone());

    let input = SignUpInput {
        name: req.name,
        email: req.email,
        confirm_email: req.confirm_email,
        password: req.password,
        confirm_password: req.confirm_password,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            id: output.user_id.to_string(),
        }),
    ))
}

/// POST /v1/users/signIn
///
/// 200 with the token, or 409 with the token when the email still needs
/// confirming (a code has just been sent).
pub async fn sign_in<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Response>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(
        state.sessions.clone(),
        state.users.clone(),
        state.mailer.clone(),
    );

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let status = if output.email_confirmed {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };

    let body = Json(SessionResponse {
        token: output.token,
    });

    Ok((status, body).into_response())
}

/// POST /v1/users/signOut
pub async fn sign_out<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    principal: Principal,
) -> AuthResult<StatusCode>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    state.sessions.end_session(&principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Current User
// ============================================================================

/// GET /v1/users/me
pub async fn user_info(principal: Principal) -> Json<UserInfoResponse> {
    Json(UserInfoResponse::from(&principal))
}

/// GET /v1/users/session
pub async fn session_status<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    principal: Principal,
) -> AuthResult<Json<SessionStatusResponse>>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let remaining = state
        .sessions
        .remaining_ttl(principal.user_id())
        .await?
        .ok_or(AuthError::SessionNotFound)?;

    Ok(Json(SessionStatusResponse {
        id: principal.user_id().to_string(),
        expires_in_ms: remaining.as_millis() as u64,
    }))
}

/// PATCH /v1/users/name
pub async fn update_name<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    principal: Principal,
    Json(req): Json<UpdateNameRequest>,
) -> AuthResult<Json<UserInfoResponse>>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let session = state.profile().update_name(&principal, &req.name).await?;
    Ok(Json(UserInfoResponse::from(&session)))
}

/// PATCH /v1/users/password
pub async fn update_password<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    principal: Principal,
    Json(req): Json<UpdatePasswordRequest>,
) -> AuthResult<StatusCode>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let input = ChangePasswordInput {
        old_password: req.old_password,
        new_password: req.new_password,
        confirm_password: req.confirm_password,
    };

    state.profile().update_password(&principal, input).await?;
    Ok(StatusCode::OK)
}

// ============================================================================
// Email Confirmation
// ============================================================================

/// PATCH /v1/users/email/confirm
pub async fn confirm_email<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    principal: Principal,
    Json(req): Json<ConfirmEmailRequest>,
) -> AuthResult<StatusCode>
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let code = OtpCode::parse(&req.otp)?;
    state.confirmation().confirm(&principal, &code).await?;
    Ok(StatusCode::OK)
}

/// POST /v1/users/resend-code
///
/// Signed-in callers get a code for their own email; anonymous callers
/// name the email in the body. Each address has a resend budget per window
/// (429 with `Retry-After` once spent).
pub async fn resend_code<S, U, M>(
    State(state): State<AuthAppState<S, U, M>>,
    principal: Option<Principal>,
    body: Bytes,
) -> AuthResult<StatusCode>
where
    S: SessionStore + RateLimitStore<Error = AuthError> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let email = match &principal {
        Some(_) => None,
        None => {
            let req: ResendCodeRequest = serde_json::from_slice(&body).map_err(|_| {
                AuthError::Validation("An email address is required".to_string())
            })?;
            Some(req.email)
        }
    };

    state
        .confirmation()
        .resend(principal.as_ref(), email.as_deref())
        .await?;
    Ok(StatusCode::OK)
}
