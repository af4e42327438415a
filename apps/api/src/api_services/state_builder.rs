use std::sync::Arc;

use sqlx::PgPool;
use trustline_application::{
    AccessTokenRepository, AuthorizationCodeRepository, AuthorizationService, ClientRegistry,
    ClientRepository, ConnectionGraphService, FriendshipGraph, GrantRepository, GrantService,
    OAuthSettings, ProfileSource, ResourceLimits, TokenService, UserDirectory, UserInfoService,
};
use trustline_infrastructure::{
    PostgresAccessTokenRepository, PostgresAuthorizationCodeRepository, PostgresClientRepository,
    PostgresGrantRepository, PostgresSocialDirectory,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Port implementations backing one application state.
struct Adapters {
    clients: Arc<dyn ClientRepository>,
    codes: Arc<dyn AuthorizationCodeRepository>,
    grants: Arc<dyn GrantRepository>,
    tokens: Arc<dyn AccessTokenRepository>,
    directory: Arc<dyn UserDirectory>,
    profiles: Arc<dyn ProfileSource>,
    graph: Arc<dyn FriendshipGraph>,
}

pub fn build_app_state(postgres_pool: PgPool, config: &ApiConfig) -> AppState {
    let social = Arc::new(PostgresSocialDirectory::new(postgres_pool.clone()));
    let adapters = Adapters {
        clients: Arc::new(PostgresClientRepository::new(postgres_pool.clone())),
        codes: Arc::new(PostgresAuthorizationCodeRepository::new(
            postgres_pool.clone(),
        )),
        grants: Arc::new(PostgresGrantRepository::new(postgres_pool.clone())),
        tokens: Arc::new(PostgresAccessTokenRepository::new(postgres_pool.clone())),
        directory: social.clone(),
        profiles: social.clone(),
        graph: social,
    };

    let mut state = assemble(adapters, config.oauth, config.limits);
    state.postgres_pool = Some(postgres_pool);
    state.frontend_url = config.frontend_url.clone();
    state.bootstrap_token = config.bootstrap_token.clone();
    state
}

/// State over in-memory adapters, without a database pool.
#[cfg(test)]
pub fn build_in_memory_app_state(
    oauth: Arc<trustline_infrastructure::InMemoryOAuthRepository>,
    social: Arc<trustline_infrastructure::InMemorySocialDirectory>,
    frontend_url: &str,
    bootstrap_token: Option<&str>,
) -> AppState {
    let adapters = Adapters {
        clients: oauth.clone(),
        codes: oauth.clone(),
        grants: oauth.clone(),
        tokens: oauth,
        directory: social.clone(),
        profiles: social.clone(),
        graph: social,
    };

    let mut state = assemble(adapters, OAuthSettings::default(), ResourceLimits::default());
    state.frontend_url = frontend_url.to_owned();
    state.bootstrap_token = bootstrap_token.map(ToOwned::to_owned);
    state
}

fn assemble(adapters: Adapters, settings: OAuthSettings, limits: ResourceLimits) -> AppState {
    let client_registry = ClientRegistry::new(adapters.clients);

    AppState {
        authorization_service: AuthorizationService::new(
            client_registry.clone(),
            adapters.codes.clone(),
            adapters.grants.clone(),
            settings,
        ),
        token_service: TokenService::new(
            client_registry.clone(),
            adapters.codes,
            adapters.tokens.clone(),
            adapters.grants.clone(),
            settings,
        ),
        grant_service: GrantService::new(client_registry, adapters.grants, adapters.tokens),
        userinfo_service: UserInfoService::new(
            adapters.directory.clone(),
            adapters.profiles,
            adapters.graph.clone(),
            limits,
        ),
        connection_graph_service: ConnectionGraphService::new(
            adapters.directory.clone(),
            adapters.graph,
            limits,
        ),
        user_directory: adapters.directory,
        postgres_pool: None,
        frontend_url: String::new(),
        bootstrap_token: None,
    }
}
