use axum::Json;
use axum::extract::{Extension, Path, State};
use tracing::info;
use trustline_core::UserIdentity;

use crate::dto::{ConnectedAppResponse, RevokeGrantResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_grants_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ConnectedAppResponse>>> {
    let apps = state
        .grant_service
        .list_connected_apps(identity.user_id())
        .await?;

    Ok(Json(apps.into_iter().map(ConnectedAppResponse::from).collect()))
}

pub async fn revoke_grant_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(client_id): Path<String>,
) -> ApiResult<Json<RevokeGrantResponse>> {
    let revocation = state
        .grant_service
        .revoke_client(identity.user_id(), &client_id)
        .await?;

    info!(
        %client_id,
        user_id = %identity.user_id(),
        tokens_revoked = revocation.tokens_revoked,
        "client access revoked by user"
    );

    Ok(Json(RevokeGrantResponse::from(revocation)))
}
