//! Auth Gate
//!
//! Bearer-token middleware for protected routes. On success the resolved
//! [`Principal`] is inserted into the request extensions.
//!
//! Rejections, all 401 problem details:
//!
//! | cause                                   | title                 |
//! |-----------------------------------------|-----------------------|
//! | no `Authorization` header               | Access Denied         |
//! | not `Bearer <token>`, bad signature     | Invalid Session       |
//! | no stored session                       | Session Expired       |
//! | any other resolution failure            | Unauthorized Access   |

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use platform::bearer::{BearerError, extract_bearer};
use platform::crypto::fingerprint;

use crate::application::session::SessionService;
use crate::domain::entity::principal::Principal;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::error::{AuthError, SESSION_EXPIRED_HEADER};

/// Why the gate turned a request away
#[derive(Debug)]
pub enum GateRejection {
    AccessDenied,
    InvalidSession(AuthError),
    SessionExpired,
    Unauthorized(AuthError),
}

impl From<BearerError> for GateRejection {
    fn from(err: BearerError) -> Self {
        match err {
            BearerError::Missing => GateRejection::AccessDenied,
            BearerError::Malformed => GateRejection::InvalidSession(AuthError::TokenInvalid),
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let error = match self {
            GateRejection::AccessDenied => {
                tracing::debug!("Request without credentials");
                AppError::unauthorized("Authentication is required to access this resource.")
                    .with_title("Access Denied")
            }
            GateRejection::InvalidSession(e) => {
                e.log();
                AppError::unauthorized("Your session is invalid. Please sign in again.")
                    .with_title("Invalid Session")
            }
            GateRejection::SessionExpired => {
                let mut response = AppError::unauthorized(
                    "Your session has expired. Please sign in again to continue.",
                )
                .with_title("Session Expired")
                .into_response();
                response
                    .headers_mut()
                    .insert(SESSION_EXPIRED_HEADER, HeaderValue::from_static("true"));
                return response;
            }
            GateRejection::Unauthorized(e) => {
                e.log();
                AppError::unauthorized("Your session is invalid. Please sign in again.")
                    .with_title("Unauthorized Access")
            }
        };
        error.into_response()
    }
}

/// Verify the bearer token, then resolve its stored session
///
/// The signature check comes first: no claim is used as a store key
/// before it passes.
pub async fn authenticate<S, U>(
    sessions: &SessionService<S, U>,
    headers: &HeaderMap,
) -> Result<Principal, GateRejection>
where
    S: SessionStore,
    U: UserRepository,
{
    let token = extract_bearer(headers)?;

    let claims = sessions
        .codec()
        .verify(token)
        .map_err(GateRejection::InvalidSession)?;

    match sessions.resolve_verified(&claims, token).await {
        Ok(session) => Ok(Principal::new(session)),
        Err(AuthError::SessionNotFound) => {
            tracing::debug!(token = %fingerprint(token), "Session expired");
            Err(GateRejection::SessionExpired)
        }
        Err(e) => Err(GateRejection::Unauthorized(e)),
    }
}

/// Middleware that requires a valid session
pub async fn require_auth_session<S, U>(
    State(sessions): State<Arc<SessionService<S, U>>>,
    req: Request,
    next: Next,
) -> Response
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    admit(&sessions, req, next).await
}

/// Middleware for routes open to anonymous callers
///
/// Without an `Authorization` header the request passes through with no
/// principal; with one, the checks are those of [`require_auth_session`].
pub async fn optional_auth_session<S, U>(
    State(sessions): State<Arc<SessionService<S, U>>>,
    req: Request,
    next: Next,
) -> Response
where
    S: SessionStore + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if matches!(extract_bearer(req.headers()), Err(BearerError::Missing)) {
        return next.run(req).await;
    }

    admit(&sessions, req, next).await
}

async fn admit<S, U>(sessions: &SessionService<S, U>, mut req: Request, next: Next) -> Response
where
    S: SessionStore,
    U: UserRepository,
{
    let result = authenticate(sessions, req.headers()).await;
    match result {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
