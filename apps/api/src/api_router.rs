mod cors;

#[cfg(test)]
mod tests;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};
use trustline_core::AppError;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router<Store>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let session_routes = Router::new()
        .route(
            "/authorize",
            post(handlers::authorize::authorize_decision_handler),
        )
        .route("/api/grants", get(handlers::grants::list_grants_handler))
        .route(
            "/api/grants/{client_id}",
            delete(handlers::grants::revoke_grant_handler),
        )
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route_layer(from_fn(middleware::require_auth))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ));

    let oauth_routes = Router::new()
        .route(
            "/authorize",
            get(handlers::authorize::authorize_preview_handler),
        )
        .route("/token", post(handlers::token::token_handler))
        .route("/revoke", post(handlers::token::revoke_handler))
        .route("/userinfo", get(handlers::resources::userinfo_handler))
        .route(
            "/connection-degree",
            get(handlers::resources::connection_degree_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .merge(oauth_routes)
        .merge(session_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
