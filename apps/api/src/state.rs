use std::sync::Arc;

use sqlx::PgPool;
use trustline_application::{
    AuthorizationService, ConnectionGraphService, GrantService, TokenService, UserDirectory,
    UserInfoService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub token_service: TokenService,
    pub grant_service: GrantService,
    pub userinfo_service: UserInfoService,
    pub connection_graph_service: ConnectionGraphService,
    pub user_directory: Arc<dyn UserDirectory>,
    pub postgres_pool: Option<PgPool>,
    pub frontend_url: String,
    pub bootstrap_token: Option<String>,
}
