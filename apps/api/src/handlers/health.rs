use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use sqlx::PgPool;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = check_postgres(state.postgres_pool.as_ref()).await;

    let ready = postgres.status != "error";
    let (status, http_status) = if ready {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            postgres,
        }),
    )
}

async fn check_postgres(pool: Option<&PgPool>) -> HealthDependencyStatus {
    let Some(pool) = pool else {
        return HealthDependencyStatus {
            status: "disabled",
            detail: None,
        };
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthDependencyStatus {
            status: "ok",
            detail: None,
        },
        Err(error) => HealthDependencyStatus {
            status: "error",
            detail: Some(format!("postgres check failed: {error}")),
        },
    }
}
