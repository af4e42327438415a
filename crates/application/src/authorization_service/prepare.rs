use trustline_core::UserId;

use super::*;

impl AuthorizationService {
    /// Validates an authorization request and describes it for consent.
    ///
    /// Read-only: nothing is persisted. When the caller already has a session
    /// the descriptor also reports what the user granted this client before.
    pub async fn prepare(
        &self,
        request: &AuthorizationRequest,
        user_id: Option<UserId>,
    ) -> AppResult<ConsentDescriptor> {
        let client = self.trusted_client(request).await?;
        let (scopes, pkce) = validate_parameters(&client, request)?;

        let previously_granted = match user_id {
            Some(user_id) => self
                .grant_repository
                .find_grant(user_id, client.id())
                .await?
                .map(|grant| grant.scopes)
                .unwrap_or_default(),
            None => ScopeSet::empty(),
        };
        let already_granted = !previously_granted.is_empty() && scopes.is_subset(&previously_granted);

        Ok(ConsentDescriptor {
            client,
            redirect_uri: request.redirect_uri.clone(),
            scopes,
            state: request.state.clone(),
            pkce,
            previously_granted,
            already_granted,
        })
    }
}
