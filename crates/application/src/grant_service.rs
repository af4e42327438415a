//! Connected-app management for the consenting user.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{Client, ScopeSet};

use crate::client_registry::ClientRegistry;
use crate::oauth_ports::{AccessTokenRepository, GrantRepository};

/// A client the user has granted access to.
#[derive(Debug, Clone)]
pub struct ConnectedApp {
    /// Authorized client.
    pub client: Client,
    /// Scopes currently granted.
    pub scopes: ScopeSet,
    /// First consent timestamp.
    pub granted_at: DateTime<Utc>,
    /// Latest consent timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of revoking a client's access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantRevocation {
    /// Whether a grant row existed and was removed.
    pub grant_removed: bool,
    /// Live tokens that were revoked alongside it.
    pub tokens_revoked: u64,
}

/// Application service over the user's grants.
#[derive(Clone)]
pub struct GrantService {
    client_registry: ClientRegistry,
    grant_repository: Arc<dyn GrantRepository>,
    token_repository: Arc<dyn AccessTokenRepository>,
}

impl GrantService {
    /// Creates a new grant service.
    #[must_use]
    pub fn new(
        client_registry: ClientRegistry,
        grant_repository: Arc<dyn GrantRepository>,
        token_repository: Arc<dyn AccessTokenRepository>,
    ) -> Self {
        Self {
            client_registry,
            grant_repository,
            token_repository,
        }
    }

    /// Lists the apps the user has connected, most recently updated first.
    pub async fn list_connected_apps(&self, user_id: UserId) -> AppResult<Vec<ConnectedApp>> {
        let grants = self.grant_repository.list_grants_for_user(user_id).await?;

        let mut apps = Vec::with_capacity(grants.len());
        for grant in grants {
            // Grants of deregistered clients are not reported.
            let Some(client) = self.client_registry.find_client(grant.client_id).await? else {
                continue;
            };

            apps.push(ConnectedApp {
                client,
                scopes: grant.scopes,
                granted_at: grant.created_at,
                updated_at: grant.updated_at,
            });
        }
        apps.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));

        Ok(apps)
    }

    /// Revokes every token of the client for the user, then drops the grant.
    pub async fn revoke_client(
        &self,
        user_id: UserId,
        client_identifier: &str,
    ) -> AppResult<GrantRevocation> {
        let client = self
            .client_registry
            .lookup_client(client_identifier)
            .await
            .map_err(|error| match error {
                AppError::InvalidClient(detail) => AppError::NotFound(detail),
                other => other,
            })?;

        let tokens_revoked = self
            .token_repository
            .revoke_for_client(user_id, client.id(), Utc::now())
            .await?;
        let grant_removed = self
            .grant_repository
            .delete_grant(user_id, client.id())
            .await?;

        if !grant_removed && tokens_revoked == 0 {
            return Err(AppError::NotFound(format!(
                "no grant exists for client '{client_identifier}'"
            )));
        }

        Ok(GrantRevocation {
            grant_removed,
            tokens_revoked,
        })
    }
}
