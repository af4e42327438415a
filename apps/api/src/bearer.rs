use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use trustline_application::TokenContext;
use trustline_core::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Validated bearer token of a resource request.
#[derive(Debug, Clone)]
pub struct BearerToken(pub TokenContext);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw_token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_credentials)
            .ok_or_else(|| AppError::InvalidToken("missing bearer token".to_owned()))?;

        let context = state.token_service.validate(raw_token).await?;
        Ok(Self(context))
    }
}

/// Extracts the credentials of a `Bearer` authorization header. The scheme is case-insensitive.
fn bearer_credentials(header_value: &str) -> Option<&str> {
    let (scheme, credentials) = header_value.trim().split_once(' ')?;
    let credentials = credentials.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !credentials.is_empty()).then_some(credentials)
}
