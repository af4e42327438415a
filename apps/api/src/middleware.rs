use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;
use trustline_core::AppError;
use url::Url;

use crate::auth::current_identity;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session user once and hands it to handlers as an extension.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = current_identity(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Rejects session-authenticated mutations that do not originate from the frontend.
pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        check_origin(request.headers(), &state.frontend_url)?;
    }

    Ok(next.run(request).await)
}

fn check_origin(headers: &HeaderMap, allowed_origin: &str) -> Result<(), AppError> {
    let fetch_site = header_str(headers, "sec-fetch-site");
    if fetch_site == Some("cross-site") {
        return Err(AppError::Unauthorized(
            "cross-site request blocked".to_owned(),
        ));
    }

    let origin_matches = header_str(headers, header::ORIGIN.as_str()) == Some(allowed_origin);
    let referer_matches = header_str(headers, header::REFERER.as_str())
        .and_then(|referer| Url::parse(referer).ok())
        .is_some_and(|referer| {
            referer.origin().ascii_serialization() == allowed_origin.trim_end_matches('/')
        });

    if origin_matches || referer_matches {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "origin validation failed".to_owned(),
        ))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
