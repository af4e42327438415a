use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use trustline_application::{
    AccessTokenRecord, AccessTokenRepository, AuthorizationCodeRecord,
    AuthorizationCodeRepository, ClientRepository, GrantRecord, GrantRepository, NewAccessToken,
    NewAuthorizationCode,
};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{Client, ClientId, ScopeSet};
use uuid::Uuid;

/// In-memory store for clients, codes, grants, and access tokens.
#[derive(Debug, Default)]
pub struct InMemoryOAuthRepository {
    clients: RwLock<HashMap<ClientId, Client>>,
    codes: RwLock<HashMap<String, AuthorizationCodeRecord>>,
    grants: RwLock<HashMap<(UserId, ClientId), GrantRecord>>,
    tokens: RwLock<HashMap<String, AccessTokenRecord>>,
}

impl InMemoryOAuthRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client, rejecting duplicate public identifiers.
    pub async fn register_client(&self, client: Client) -> AppResult<()> {
        let mut clients = self.clients.write().await;

        if clients
            .values()
            .any(|existing| existing.client_identifier() == client.client_identifier())
        {
            return Err(AppError::Validation(format!(
                "client '{}' is already registered",
                client.client_identifier()
            )));
        }

        clients.insert(client.id(), client);
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for InMemoryOAuthRepository {
    async fn find_by_identifier(&self, client_identifier: &str) -> AppResult<Option<Client>> {
        Ok(self
            .clients
            .read()
            .await
            .values()
            .find(|client| client.client_identifier() == client_identifier)
            .cloned())
    }

    async fn find_by_id(&self, client_id: ClientId) -> AppResult<Option<Client>> {
        Ok(self.clients.read().await.get(&client_id).cloned())
    }
}

#[async_trait]
impl AuthorizationCodeRepository for InMemoryOAuthRepository {
    async fn create_code(&self, code: NewAuthorizationCode) -> AppResult<Uuid> {
        let mut codes = self.codes.write().await;
        if codes.contains_key(&code.code_hash) {
            return Err(AppError::Internal(
                "authorization code hash collision".to_owned(),
            ));
        }

        let id = Uuid::new_v4();
        codes.insert(
            code.code_hash,
            AuthorizationCodeRecord {
                id,
                client_id: code.client_id,
                user_id: code.user_id,
                redirect_uri: code.redirect_uri,
                scopes: code.scopes,
                pkce: code.pkce,
                created_at: Utc::now(),
                expires_at: code.expires_at,
                consumed_at: None,
            },
        );

        Ok(id)
    }

    async fn consume_code(
        &self,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCodeRecord>> {
        // The write lock serializes the check and the flip.
        let mut codes = self.codes.write().await;
        let Some(record) = codes.get_mut(code_hash) else {
            return Ok(None);
        };
        if record.consumed_at.is_some() || record.expires_at <= now {
            return Ok(None);
        }

        record.consumed_at = Some(now);
        Ok(Some(record.clone()))
    }

    async fn purge_codes(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut codes = self.codes.write().await;
        let initial = codes.len();
        codes.retain(|_, record| {
            record.expires_at >= before && record.consumed_at.is_none_or(|at| at >= before)
        });

        Ok((initial - codes.len()) as u64)
    }
}

#[async_trait]
impl GrantRepository for InMemoryOAuthRepository {
    async fn upsert_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
        scopes: &ScopeSet,
    ) -> AppResult<GrantRecord> {
        let now = Utc::now();
        let mut grants = self.grants.write().await;
        let grant = grants
            .entry((user_id, client_id))
            .and_modify(|grant| {
                grant.scopes = scopes.clone();
                grant.updated_at = now;
            })
            .or_insert_with(|| GrantRecord {
                user_id,
                client_id,
                scopes: scopes.clone(),
                created_at: now,
                updated_at: now,
            });

        Ok(grant.clone())
    }

    async fn find_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
    ) -> AppResult<Option<GrantRecord>> {
        Ok(self.grants.read().await.get(&(user_id, client_id)).cloned())
    }

    async fn list_grants_for_user(&self, user_id: UserId) -> AppResult<Vec<GrantRecord>> {
        let mut grants: Vec<GrantRecord> = self
            .grants
            .read()
            .await
            .values()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect();
        grants.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));

        Ok(grants)
    }

    async fn delete_grant(&self, user_id: UserId, client_id: ClientId) -> AppResult<bool> {
        Ok(self
            .grants
            .write()
            .await
            .remove(&(user_id, client_id))
            .is_some())
    }
}

#[async_trait]
impl AccessTokenRepository for InMemoryOAuthRepository {
    async fn create_token(&self, token: NewAccessToken) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        self.tokens.write().await.insert(
            token.token_hash,
            AccessTokenRecord {
                id,
                client_id: token.client_id,
                user_id: token.user_id,
                scopes: token.scopes,
                created_at: Utc::now(),
                expires_at: token.expires_at,
                revoked_at: None,
            },
        );

        Ok(id)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessTokenRecord>> {
        Ok(self.tokens.read().await.get(token_hash).cloned())
    }

    async fn revoke_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessTokenRecord>> {
        Ok(self.tokens.write().await.get_mut(token_hash).map(|record| {
            record.revoked_at.get_or_insert(now);
            record.clone()
        }))
    }

    async fn revoke_for_client(
        &self,
        user_id: UserId,
        client_id: ClientId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut revoked = 0;
        for record in self.tokens.write().await.values_mut() {
            if record.user_id == user_id
                && record.client_id == client_id
                && record.revoked_at.is_none()
            {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }

        Ok(revoked)
    }

    async fn purge_tokens(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut tokens = self.tokens.write().await;
        let initial = tokens.len();
        tokens.retain(|_, record| record.expires_at >= before);

        Ok((initial - tokens.len()) as u64)
    }
}
