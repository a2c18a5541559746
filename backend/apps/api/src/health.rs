//! Health check

use auth::RedisSessionStore;
use axum::Json;
use axum::extract::State;
use kernel::error::app_error::{AppError, AppResult};
use serde_json::{Value, json};
use sqlx::PgPool;

#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    pub store: RedisSessionStore,
}

/// GET /health: database and session store must both answer
pub async fn health_check(State(state): State<HealthState>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Health check: database unreachable");
            AppError::service_unavailable("Database is unavailable")
        })?;

    state.store.ping().await.map_err(|e| {
        tracing::error!(error = %e, "Health check: session store unreachable");
        AppError::service_unavailable("Session store is unavailable")
    })?;

    Ok(Json(json!({ "status": "ok" })))
}
