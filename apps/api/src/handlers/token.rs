use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::header::{CACHE_CONTROL, PRAGMA};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use tracing::{info, warn};
use trustline_core::AppError;

use crate::dto::{RevokeRequest, TokenRequest, TokenResponse};
use crate::error::{ApiResult, oauth_error_response};
use crate::state::AppState;

const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Code-for-token exchange.
pub async fn token_handler(
    State(state): State<AppState>,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> ApiResult<Response> {
    let Form(request) = form.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    match request.grant_type.as_deref() {
        Some(AUTHORIZATION_CODE_GRANT) => {}
        Some(other) => {
            return Ok(oauth_error_response(
                StatusCode::BAD_REQUEST,
                "unsupported_grant_type",
                format!("grant_type '{other}' is not supported"),
            ));
        }
        None => return Err(AppError::Validation("grant_type is required".to_owned()).into()),
    }

    let redeem = request.into_redeem_request()?;
    let issued = match state.token_service.redeem(&redeem).await {
        Ok(issued) => issued,
        Err(error) => {
            if matches!(
                error,
                AppError::InvalidGrant(_) | AppError::InvalidClient(_)
            ) {
                warn!(
                    client_id = %redeem.client_identifier,
                    error = %error,
                    "token redemption rejected"
                );
            }
            return Err(error.into());
        }
    };

    info!(
        client_id = %redeem.client_identifier,
        expires_at = %issued.expires_at,
        "access token issued"
    );

    let mut response = Json(TokenResponse::from(issued)).into_response();
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    Ok(response)
}

/// Token revocation. Unknown and foreign tokens are acknowledged without effect.
pub async fn revoke_handler(
    State(state): State<AppState>,
    form: Result<Form<RevokeRequest>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(request) = form.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let (token, client_identifier) = request.into_parts()?;

    state
        .token_service
        .revoke_token(&token, &client_identifier)
        .await?;

    info!(client_id = %client_identifier, "token revocation processed");

    Ok(StatusCode::OK)
}
