use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;
use trustline_core::{AppError, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub handle: String,
    pub token: String,
}

/// Development sign-in: trusts a shared token and attaches a known user to the session.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    let Some(expected_token) = state.bootstrap_token.as_deref() else {
        return Err(AppError::NotFound("session bootstrap is disabled".to_owned()).into());
    };
    if payload.token != expected_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let handle = payload.handle.trim().trim_start_matches('@');
    let user = state
        .user_directory
        .find_by_handle(handle)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{handle}' does not exist")))?;
    let identity = UserIdentity::new(user.user_id, user.handle, user.display_name);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(user_id = %identity.user_id(), "bootstrap session established");

    Ok(StatusCode::NO_CONTENT)
}
