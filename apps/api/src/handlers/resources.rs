use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use trustline_core::AppError;

use crate::bearer::BearerToken;
use crate::dto::{ConnectionDegreeQuery, ConnectionDegreeResponse, UserInfoResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn userinfo_handler(
    State(state): State<AppState>,
    BearerToken(context): BearerToken,
) -> ApiResult<Json<UserInfoResponse>> {
    let info = state.userinfo_service.get_userinfo(&context).await?;

    Ok(Json(UserInfoResponse::from(info)))
}

pub async fn connection_degree_handler(
    State(state): State<AppState>,
    BearerToken(context): BearerToken,
    query: Result<Query<ConnectionDegreeQuery>, QueryRejection>,
) -> ApiResult<Json<ConnectionDegreeResponse>> {
    let Query(query) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let target = query.into_target()?;

    let result = state
        .connection_graph_service
        .degree(&context, &target)
        .await?;

    Ok(Json(ConnectionDegreeResponse::from(result)))
}
