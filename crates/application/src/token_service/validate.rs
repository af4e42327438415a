use super::*;

impl TokenService {
    /// Resolves a raw bearer value into its request context.
    ///
    /// Unknown, revoked, and expired tokens are indistinguishable to callers.
    /// Effective scopes never exceed what the user currently grants the client.
    pub async fn validate(&self, raw_token: &str) -> AppResult<TokenContext> {
        let token_hash = bearer_hash(raw_token)?;
        let record = self
            .token_repository
            .find_by_hash(&token_hash)
            .await?
            .ok_or_else(invalid_token)?;

        if record.revoked_at.is_some() || record.expires_at <= Utc::now() {
            return Err(invalid_token());
        }

        let grant = self
            .grant_repository
            .find_grant(record.user_id, record.client_id)
            .await?
            .ok_or_else(invalid_token)?;

        Ok(TokenContext {
            token_id: record.id,
            user_id: record.user_id,
            client_id: record.client_id,
            scopes: record.scopes.intersection(&grant.scopes),
        })
    }
}
