//! Authorization code issuance: consent preview and decision handling.
//!
//! Codes are cryptographically random, stored as SHA-256 hashes, bound to a
//! PKCE challenge, single-use, and short-lived.

use std::sync::Arc;

use trustline_core::{AppError, AppResult};
use trustline_domain::{Client, PkceChallenge, PkceMethod, ScopeSet};

use crate::client_registry::ClientRegistry;
use crate::oauth_ports::{AuthorizationCodeRepository, GrantRepository};
use crate::settings::OAuthSettings;

mod issue;
mod prepare;
mod redirect;


/// Parameters of an authorization request, shared by preview and decision.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationRequest {
    /// Public client identifier.
    pub client_identifier: String,
    /// Redirect target presented by the client.
    pub redirect_uri: String,
    /// Space-delimited scopes. On decision this is the approved subset.
    pub scope: String,
    /// Opaque client state echoed back on redirect.
    pub state: Option<String>,
    /// PKCE challenge.
    pub code_challenge: Option<String>,
    /// PKCE challenge method.
    pub code_challenge_method: Option<String>,
}

/// Data a consent screen needs to render.
#[derive(Debug, Clone)]
pub struct ConsentDescriptor {
    /// Requesting client.
    pub client: Client,
    /// Validated redirect target.
    pub redirect_uri: String,
    /// Requested scopes.
    pub scopes: ScopeSet,
    /// Opaque client state.
    pub state: Option<String>,
    /// Validated PKCE challenge.
    pub pkce: PkceChallenge,
    /// Scopes the user already granted this client, if a session was present.
    pub previously_granted: ScopeSet,
    /// Whether the existing grant already covers every requested scope.
    pub already_granted: bool,
}

/// Result category of a consent decision.
#[derive(Debug)]
pub enum AuthorizationOutcome {
    /// A code was minted and the grant recorded.
    CodeIssued,
    /// The user refused consent.
    Denied,
    /// The request was rejected after the redirect target was trusted.
    Rejected(AppError),
}

/// Redirect back to the client after a consent decision.
#[derive(Debug)]
pub struct AuthorizationRedirect {
    /// Fully built redirect target carrying `code` or `error`, plus `state`.
    pub redirect_url: String,
    /// What happened.
    pub outcome: AuthorizationOutcome,
}

/// Application service implementing the two-phase authorization protocol.
#[derive(Clone)]
pub struct AuthorizationService {
    client_registry: ClientRegistry,
    code_repository: Arc<dyn AuthorizationCodeRepository>,
    grant_repository: Arc<dyn GrantRepository>,
    settings: OAuthSettings,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        client_registry: ClientRegistry,
        code_repository: Arc<dyn AuthorizationCodeRepository>,
        grant_repository: Arc<dyn GrantRepository>,
        settings: OAuthSettings,
    ) -> Self {
        Self {
            client_registry,
            code_repository,
            grant_repository,
            settings,
        }
    }

    /// Resolves the client and checks the redirect target.
    ///
    /// Failures here cannot be redirected because the target is not trusted.
    async fn trusted_client(&self, request: &AuthorizationRequest) -> AppResult<Client> {
        let client = self
            .client_registry
            .lookup_client(&request.client_identifier)
            .await?;
        ClientRegistry::require_redirect(&client, &request.redirect_uri)?;

        Ok(client)
    }
}

/// Validates scope and PKCE parameters against the registry and client policy.
fn validate_parameters(
    client: &Client,
    request: &AuthorizationRequest,
) -> AppResult<(ScopeSet, PkceChallenge)> {
    let scopes = ClientRegistry::resolve_scopes(&request.scope)?;

    let challenge = request
        .code_challenge
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation("code_challenge is required".to_owned()))?;
    let method = PkceMethod::parse(request.code_challenge_method.as_deref())?;

    if !client.allows_pkce_method(method) {
        return Err(AppError::Validation(format!(
            "code_challenge_method '{}' is not allowed for unverified clients",
            method.as_str()
        )));
    }

    let pkce = PkceChallenge::new(challenge, method)?;

    Ok((scopes, pkce))
}
