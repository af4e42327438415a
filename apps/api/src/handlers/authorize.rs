use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use tower_sessions::Session;
use tracing::{info, warn};
use trustline_application::AuthorizationOutcome;
use trustline_core::{AppError, UserIdentity};

use crate::auth::current_identity;
use crate::dto::{
    AuthorizeDecisionRequest, AuthorizeDecisionResponse, AuthorizeQuery, ConsentResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Consent preview. A session is optional and only enables the re-consent shortcut.
pub async fn authorize_preview_handler(
    State(state): State<AppState>,
    session: Session,
    query: Result<Query<AuthorizeQuery>, QueryRejection>,
) -> ApiResult<Json<ConsentResponse>> {
    let Query(query) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let request = query.into_request()?;
    let user_id = current_identity(&session)
        .await?
        .map(|identity| identity.user_id());

    let descriptor = state
        .authorization_service
        .prepare(&request, user_id)
        .await?;

    Ok(Json(ConsentResponse::from(descriptor)))
}

pub async fn authorize_decision_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    payload: Result<Json<AuthorizeDecisionRequest>, JsonRejection>,
) -> ApiResult<Json<AuthorizeDecisionResponse>> {
    let Json(payload) =
        payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let (request, approved) = payload.into_parts();
    let user_id = identity.user_id();

    let redirect = state
        .authorization_service
        .issue(user_id, &request, approved)
        .await?;

    match &redirect.outcome {
        AuthorizationOutcome::CodeIssued => info!(
            client_id = %request.client_identifier,
            %user_id,
            "authorization code issued"
        ),
        AuthorizationOutcome::Denied => info!(
            client_id = %request.client_identifier,
            %user_id,
            "authorization denied by user"
        ),
        AuthorizationOutcome::Rejected(error) => warn!(
            client_id = %request.client_identifier,
            %user_id,
            error = %error,
            "authorization request rejected"
        ),
    }

    Ok(Json(AuthorizeDecisionResponse {
        redirect_url: redirect.redirect_url,
    }))
}
