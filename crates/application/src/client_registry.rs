//! Client and scope registry lookups.

use std::sync::Arc;

use trustline_core::{AppError, AppResult};
use trustline_domain::{Client, ClientId, ScopeSet};

use crate::oauth_ports::ClientRepository;

/// Read-only registry of third-party applications and scope atoms.
#[derive(Clone)]
pub struct ClientRegistry {
    repository: Arc<dyn ClientRepository>,
}

impl ClientRegistry {
    /// Creates a registry over the client store.
    #[must_use]
    pub fn new(repository: Arc<dyn ClientRepository>) -> Self {
        Self { repository }
    }

    /// Looks up a client by its public identifier.
    pub async fn lookup_client(&self, client_identifier: &str) -> AppResult<Client> {
        if client_identifier.trim().is_empty() {
            return Err(AppError::InvalidClient("client_id is required".to_owned()));
        }

        self.repository
            .find_by_identifier(client_identifier)
            .await?
            .ok_or_else(|| {
                AppError::InvalidClient(format!("unknown client '{client_identifier}'"))
            })
    }

    /// Looks up a client by its internal identifier.
    pub async fn find_client(&self, client_id: ClientId) -> AppResult<Option<Client>> {
        self.repository.find_by_id(client_id).await
    }

    /// Returns whether the candidate exactly matches a registered redirect.
    #[must_use]
    pub fn validate_redirect(client: &Client, candidate: &str) -> bool {
        client.accepts_redirect(candidate)
    }

    /// Fails with `invalid_redirect_uri` unless the candidate is registered.
    pub fn require_redirect(client: &Client, candidate: &str) -> AppResult<()> {
        if Self::validate_redirect(client, candidate) {
            return Ok(());
        }

        Err(AppError::InvalidRedirectUri(format!(
            "redirect_uri is not registered for client '{}'",
            client.client_identifier()
        )))
    }

    /// Resolves a space-delimited scope parameter against the scope registry.
    ///
    /// A single unknown atom rejects the whole request.
    pub fn resolve_scopes(raw_scope: &str) -> AppResult<ScopeSet> {
        ScopeSet::parse(raw_scope)
    }
}
