//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use platform::rate_limit::RateLimitStore;

use crate::domain::mailer::CodeMailer;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::error::AuthError;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{optional_auth_session, require_auth_session};

/// User routes, meant to be nested under `/v1/users`
pub fn auth_router<S, U, M>(state: AuthAppState<S, U, M>) -> Router
where
    S: SessionStore + RateLimitStore<Error = AuthError> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    M: CodeMailer + Send + Sync + 'static,
{
    let gated = Router::new()
        .route("/signOut", post(handlers::sign_out::<S, U, M>))
        .route("/name", patch(handlers::update_name::<S, U, M>))
        .route("/password", patch(handlers::update_password::<S, U, M>))
        .route("/me", get(handlers::user_info))
        .route("/session", get(handlers::session_status::<S, U, M>))
        .route("/email/confirm", patch(handlers::confirm_email::<S, U, M>))
        .route_layer(from_fn_with_state(
            state.sessions.clone(),
            require_auth_session::<S, U>,
        ));

    let resend = Router::new()
        .route("/resend-code", post(handlers::resend_code::<S, U, M>))
        .route_layer(from_fn_with_state(
            state.sessions.clone(),
            optional_auth_session::<S, U>,
        ));

    Router::new()
        .route("/", post(handlers::sign_up::<S, U, M>))
        .route("/signIn", post(handlers::sign_in::<S, U, M>))
        .merge(gated)
        .merge(resend)
        .with_state(state)
}
