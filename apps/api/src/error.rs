use axum::Json;
use axum::http::header::{CACHE_CONTROL, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use trustline_core::AppError;
use ts_rs::TS;

/// OAuth-style error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_)
            | AppError::InvalidRedirectUri(_)
            | AppError::InvalidGrant(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidClient(_)
            | AppError::InvalidToken(_)
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) | AppError::InsufficientScope(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let description = match &self.0 {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error while handling request");
                "the server encountered an unexpected error".to_owned()
            }
            other => other.description().to_owned(),
        };

        let mut response = oauth_error_response(status, self.0.error_code(), description);
        let challenge = match self.0 {
            AppError::InvalidToken(_) => Some(r#"Bearer error="invalid_token""#),
            AppError::InsufficientScope(_) => Some(r#"Bearer error="insufficient_scope""#),
            _ => None,
        };
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }

        response
    }
}

/// Builds an `{error, error_description}` response with caching disabled.
pub fn oauth_error_response(
    status: StatusCode,
    error: &str,
    error_description: impl Into<String>,
) -> Response {
    let payload = Json(ErrorResponse {
        error: error.to_owned(),
        error_description: error_description.into(),
    });

    let mut response = (status, payload).into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
