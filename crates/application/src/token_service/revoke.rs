use super::*;

impl TokenService {
    /// Revokes a single token on behalf of the client it was issued to.
    ///
    /// Unknown tokens and tokens of other clients are ignored so the caller
    /// learns nothing about them.
    pub async fn revoke_token(&self, raw_token: &str, client_identifier: &str) -> AppResult<()> {
        let client = self.client_registry.lookup_client(client_identifier).await?;

        let Ok(token_hash) = bearer_hash(raw_token) else {
            return Ok(());
        };
        let Some(record) = self.token_repository.find_by_hash(&token_hash).await? else {
            return Ok(());
        };
        if record.client_id != client.id() {
            return Ok(());
        }

        self.token_repository
            .revoke_by_hash(&token_hash, Utc::now())
            .await?;

        Ok(())
    }

    /// Revokes every token the user ever granted to the client.
    pub async fn revoke_for_client(&self, user_id: UserId, client_id: ClientId) -> AppResult<u64> {
        self.token_repository
            .revoke_for_client(user_id, client_id, Utc::now())
            .await
    }
}
