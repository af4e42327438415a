//! Token endpoint exchange, bearer validation, and revocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{ClientId, Scope, ScopeSet};

use crate::client_registry::ClientRegistry;
use crate::oauth_ports::{AccessTokenRepository, AuthorizationCodeRepository, GrantRepository};
use crate::settings::OAuthSettings;
use crate::token_crypto::hash_secret;

mod redeem;
mod revoke;
mod validate;

#[cfg(test)]
mod tests;

/// Token type reported to clients.
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

/// Parameters of an `authorization_code` grant exchange.
#[derive(Debug, Clone, Default)]
pub struct RedeemRequest {
    /// Raw authorization code.
    pub code: String,
    /// Public identifier of the redeeming client.
    pub client_identifier: String,
    /// Redirect target; must equal the one the code was issued for.
    pub redirect_uri: String,
    /// PKCE verifier matching the challenge bound at issuance.
    pub code_verifier: String,
}

/// Freshly minted access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Raw bearer value. Returned once and never stored.
    pub access_token: String,
    /// Always [`BEARER_TOKEN_TYPE`].
    pub token_type: &'static str,
    /// Lifetime in seconds.
    pub expires_in: i64,
    /// Scope snapshot carried by the token.
    pub scopes: ScopeSet,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Authenticated resource request context resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContext {
    /// Token row identifier.
    pub token_id: uuid::Uuid,
    /// Resource owner.
    pub user_id: UserId,
    /// Calling client.
    pub client_id: ClientId,
    /// Effective scopes: the token snapshot narrowed by the current grant.
    pub scopes: ScopeSet,
}

impl TokenContext {
    /// Fails with `insufficient_scope` unless the scope is effective.
    pub fn require_scope(&self, scope: Scope) -> AppResult<()> {
        if self.scopes.contains(scope) {
            return Ok(());
        }

        Err(AppError::InsufficientScope(format!(
            "scope '{}' is required",
            scope.as_str()
        )))
    }
}

/// Rows removed by a retention purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Authorization codes removed.
    pub codes: u64,
    /// Access tokens removed.
    pub tokens: u64,
}

/// Application service owning access token lifecycle.
#[derive(Clone)]
pub struct TokenService {
    client_registry: ClientRegistry,
    code_repository: Arc<dyn AuthorizationCodeRepository>,
    token_repository: Arc<dyn AccessTokenRepository>,
    grant_repository: Arc<dyn GrantRepository>,
    settings: OAuthSettings,
}

impl TokenService {
    /// Creates a new token service.
    #[must_use]
    pub fn new(
        client_registry: ClientRegistry,
        code_repository: Arc<dyn AuthorizationCodeRepository>,
        token_repository: Arc<dyn AccessTokenRepository>,
        grant_repository: Arc<dyn GrantRepository>,
        settings: OAuthSettings,
    ) -> Self {
        Self {
            client_registry,
            code_repository,
            token_repository,
            grant_repository,
            settings,
        }
    }

    /// Deletes codes and tokens that stopped being usable before the cutoff.
    pub async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<PurgeReport> {
        let codes = self.code_repository.purge_codes(before).await?;
        let tokens = self.token_repository.purge_tokens(before).await?;

        Ok(PurgeReport { codes, tokens })
    }
}

fn invalid_token() -> AppError {
    AppError::InvalidToken("the access token is invalid, expired, or revoked".to_owned())
}

fn bearer_hash(raw_token: &str) -> AppResult<String> {
    let raw_token = raw_token.trim();
    if raw_token.is_empty() {
        return Err(invalid_token());
    }

    Ok(hash_secret(raw_token))
}
