//! Hand-written port fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use trustline_core::{AppResult, NonEmptyString, UserId};
use trustline_domain::{
    Client, ClientId, ClientMetadata, FriendshipEdge, FriendshipLevel, ScopeSet, TrustTier,
};

use crate::oauth_ports::{
    AccessTokenRecord, AccessTokenRepository, AuthorizationCodeRecord,
    AuthorizationCodeRepository, ClientRepository, GrantRecord, GrantRepository, NewAccessToken,
    NewAuthorizationCode,
};
use crate::social_ports::{
    FriendshipGraph, FriendshipSnapshot, JournalEntryRecord, ProfileRecord, ProfileSource,
    UserDirectory, UserRef,
};
use crate::{
    AuthorizationService, ClientRegistry, OAuthSettings, ResourceLimits, TokenService,
};

pub(crate) const ACME_REDIRECT: &str = "https://acme.example/cb";
pub(crate) const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
pub(crate) const S256_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

pub(crate) fn client(identifier: &str, trust_tier: TrustTier) -> Client {
    Client::new(
        ClientId::new(),
        identifier,
        vec![format!("https://{identifier}.example/cb")],
        ClientMetadata {
            display_name: NonEmptyString::new(identifier)
                .unwrap_or_else(|error| panic!("display name rejected: {error}")),
            description: None,
            logo_url: None,
            homepage_url: None,
        },
        trust_tier,
    )
    .unwrap_or_else(|error| panic!("client rejected: {error}"))
}

#[derive(Default)]
pub(crate) struct FakeClients {
    pub(crate) clients: Vec<Client>,
}

#[async_trait]
impl ClientRepository for FakeClients {
    async fn find_by_identifier(&self, client_identifier: &str) -> AppResult<Option<Client>> {
        Ok(self
            .clients
            .iter()
            .find(|client| client.client_identifier() == client_identifier)
            .cloned())
    }

    async fn find_by_id(&self, client_id: ClientId) -> AppResult<Option<Client>> {
        Ok(self
            .clients
            .iter()
            .find(|client| client.id() == client_id)
            .cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeCodes {
    pub(crate) codes: Mutex<Vec<(String, AuthorizationCodeRecord)>>,
}

impl FakeCodes {
    pub(crate) async fn expire_all(&self) {
        for (_, record) in self.codes.lock().await.iter_mut() {
            record.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    pub(crate) async fn stored(&self) -> Vec<AuthorizationCodeRecord> {
        self.codes
            .lock()
            .await
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl AuthorizationCodeRepository for FakeCodes {
    async fn create_code(&self, code: NewAuthorizationCode) -> AppResult<uuid::Uuid> {
        let id = uuid::Uuid::new_v4();
        self.codes.lock().await.push((
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
        ));
        Ok(id)
    }

    async fn consume_code(
        &self,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCodeRecord>> {
        let mut codes = self.codes.lock().await;
        let Some((_, record)) = codes.iter_mut().find(|(hash, record)| {
            hash == code_hash && record.consumed_at.is_none() && record.expires_at > now
        }) else {
            return Ok(None);
        };

        record.consumed_at = Some(now);
        Ok(Some(record.clone()))
    }

    async fn purge_codes(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut codes = self.codes.lock().await;
        let initial = codes.len();
        codes.retain(|(_, record)| {
            record.expires_at >= before && record.consumed_at.is_none_or(|at| at >= before)
        });
        Ok((initial - codes.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct FakeGrants {
    pub(crate) grants: Mutex<HashMap<(UserId, ClientId), GrantRecord>>,
}

#[async_trait]
impl GrantRepository for FakeGrants {
    async fn upsert_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
        scopes: &ScopeSet,
    ) -> AppResult<GrantRecord> {
        let now = Utc::now();
        let mut grants = self.grants.lock().await;
        let record = grants
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
        Ok(record.clone())
    }

    async fn find_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
    ) -> AppResult<Option<GrantRecord>> {
        Ok(self.grants.lock().await.get(&(user_id, client_id)).cloned())
    }

    async fn list_grants_for_user(&self, user_id: UserId) -> AppResult<Vec<GrantRecord>> {
        Ok(self
            .grants
            .lock()
            .await
            .values()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_grant(&self, user_id: UserId, client_id: ClientId) -> AppResult<bool> {
        Ok(self.grants.lock().await.remove(&(user_id, client_id)).is_some())
    }
}

#[derive(Default)]
pub(crate) struct FakeTokens {
    pub(crate) tokens: Mutex<Vec<(String, AccessTokenRecord)>>,
}

#[async_trait]
impl AccessTokenRepository for FakeTokens {
    async fn create_token(&self, token: NewAccessToken) -> AppResult<uuid::Uuid> {
        let id = uuid::Uuid::new_v4();
        self.tokens.lock().await.push((
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
        ));
        Ok(id)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessTokenRecord>> {
        Ok(self
            .tokens
            .lock()
            .await
            .iter()
            .find(|(hash, _)| hash == token_hash)
            .map(|(_, record)| record.clone()))
    }

    async fn revoke_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessTokenRecord>> {
        let mut tokens = self.tokens.lock().await;
        Ok(tokens
            .iter_mut()
            .find(|(hash, _)| hash == token_hash)
            .map(|(_, record)| {
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
        for (_, record) in self.tokens.lock().await.iter_mut() {
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
        let mut tokens = self.tokens.lock().await;
        let initial = tokens.len();
        tokens.retain(|(_, record)| record.expires_at >= before);
        Ok((initial - tokens.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct FakeSocial {
    pub(crate) users: Vec<UserRef>,
    pub(crate) profiles: Vec<ProfileRecord>,
    pub(crate) journal: HashMap<UserId, Vec<JournalEntryRecord>>,
    pub(crate) edges: Vec<FriendshipEdge>,
}

impl FakeSocial {
    pub(crate) fn add_user(&mut self, handle: &str) -> UserId {
        let user_id = UserId::new();
        self.users.push(UserRef {
            user_id,
            handle: handle.to_owned(),
            display_name: handle.to_uppercase(),
            avatar_url: Some(format!("https://cdn.example/{handle}.png")),
        });
        user_id
    }

    pub(crate) fn befriend(&mut self, from: UserId, to: UserId, level: FriendshipLevel) {
        self.edges.push(FriendshipEdge {
            user_id: from,
            friend_id: to,
            level,
        });
    }
}

#[async_trait]
impl UserDirectory for FakeSocial {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRef>> {
        Ok(self.users.iter().find(|user| user.user_id == user_id).cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> AppResult<Option<UserRef>> {
        Ok(self.users.iter().find(|user| user.handle == handle).cloned())
    }

    async fn find_many(&self, user_ids: &[UserId]) -> AppResult<Vec<UserRef>> {
        Ok(self
            .users
            .iter()
            .filter(|user| user_ids.contains(&user.user_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileSource for FakeSocial {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<ProfileRecord>> {
        Ok(self
            .profiles
            .iter()
            .find(|profile| profile.user.user_id == user_id)
            .cloned())
    }

    async fn recent_public_journal_entries(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> AppResult<Vec<JournalEntryRecord>> {
        Ok(self
            .journal
            .get(&user_id)
            .map(|entries| entries.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

struct FakeSnapshot {
    edges: Vec<FriendshipEdge>,
}

#[async_trait]
impl FriendshipSnapshot for FakeSnapshot {
    async fn outgoing_edges(&mut self, sources: &[UserId]) -> AppResult<Vec<FriendshipEdge>> {
        Ok(self
            .edges
            .iter()
            .filter(|edge| sources.contains(&edge.user_id))
            .copied()
            .collect())
    }
}

#[async_trait]
impl FriendshipGraph for FakeSocial {
    async fn snapshot(&self) -> AppResult<Box<dyn FriendshipSnapshot>> {
        Ok(Box::new(FakeSnapshot {
            edges: self.edges.clone(),
        }))
    }
}

/// Fully wired OAuth services over fresh fakes.
pub(crate) struct OAuthHarness {
    pub(crate) acme: Client,
    pub(crate) unverified: Client,
    pub(crate) codes: Arc<FakeCodes>,
    pub(crate) grants: Arc<FakeGrants>,
    pub(crate) tokens: Arc<FakeTokens>,
    pub(crate) authorization: AuthorizationService,
    pub(crate) token_service: TokenService,
}

impl OAuthHarness {
    pub(crate) fn new() -> Self {
        let acme = client("acme", TrustTier::Verified);
        let unverified = client("sketchy", TrustTier::Unverified);
        let registry = ClientRegistry::new(Arc::new(FakeClients {
            clients: vec![acme.clone(), unverified.clone()],
        }));
        let codes = Arc::new(FakeCodes::default());
        let grants = Arc::new(FakeGrants::default());
        let tokens = Arc::new(FakeTokens::default());
        let settings = OAuthSettings::default();

        Self {
            authorization: AuthorizationService::new(
                registry.clone(),
                codes.clone(),
                grants.clone(),
                settings,
            ),
            token_service: TokenService::new(
                registry,
                codes.clone(),
                tokens.clone(),
                grants.clone(),
                settings,
            ),
            acme,
            unverified,
            codes,
            grants,
            tokens,
        }
    }
}

pub(crate) fn limits() -> ResourceLimits {
    ResourceLimits::default()
}
