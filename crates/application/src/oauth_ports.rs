//! Persistence ports for clients, authorization codes, grants, and tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use trustline_core::{AppResult, UserId};
use trustline_domain::{Client, ClientId, PkceChallenge, ScopeSet};

/// Read-only port over the client registration store.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Finds a client by its public identifier.
    async fn find_by_identifier(&self, client_identifier: &str) -> AppResult<Option<Client>>;

    /// Finds a client by its internal identifier.
    async fn find_by_id(&self, client_id: ClientId) -> AppResult<Option<Client>>;
}

/// Authorization code ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewAuthorizationCode {
    /// SHA-256 hash of the raw code.
    pub code_hash: String,
    /// Client the code was issued to.
    pub client_id: ClientId,
    /// Resource owner who approved the request.
    pub user_id: UserId,
    /// Redirect target snapshot; must match at redemption.
    pub redirect_uri: String,
    /// Approved scope snapshot.
    pub scopes: ScopeSet,
    /// PKCE challenge bound at issuance.
    pub pkce: PkceChallenge,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Authorization code as persisted.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeRecord {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Client the code was issued to.
    pub client_id: ClientId,
    /// Resource owner who approved the request.
    pub user_id: UserId,
    /// Redirect target snapshot.
    pub redirect_uri: String,
    /// Approved scope snapshot.
    pub scopes: ScopeSet,
    /// PKCE challenge bound at issuance.
    pub pkce: PkceChallenge,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// When the code was consumed, if ever.
    pub consumed_at: Option<DateTime<Utc>>,
}

/// Repository port for authorization code persistence.
#[async_trait]
pub trait AuthorizationCodeRepository: Send + Sync {
    /// Stores a newly issued code.
    async fn create_code(&self, code: NewAuthorizationCode) -> AppResult<uuid::Uuid>;

    /// Atomically marks an unexpired, unconsumed code as consumed.
    ///
    /// Returns the record only to the single caller whose update flipped the
    /// consumed flag. Every other caller, concurrent or later, gets `None`.
    async fn consume_code(
        &self,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCodeRecord>>;

    /// Deletes codes that expired or were consumed before the cutoff.
    async fn purge_codes(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Durable consent of one user to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    /// Consenting user.
    pub user_id: UserId,
    /// Authorized client.
    pub client_id: ClientId,
    /// Scopes the user currently consents to.
    pub scopes: ScopeSet,
    /// First consent timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest consent timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Repository port for grant persistence.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Inserts the grant or overwrites the scopes of the existing one.
    async fn upsert_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
        scopes: &ScopeSet,
    ) -> AppResult<GrantRecord>;

    /// Finds the grant for the pair.
    async fn find_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
    ) -> AppResult<Option<GrantRecord>>;

    /// Lists every grant a user has issued, most recently updated first.
    async fn list_grants_for_user(&self, user_id: UserId) -> AppResult<Vec<GrantRecord>>;

    /// Removes the grant for the pair. Returns whether a grant existed.
    async fn delete_grant(&self, user_id: UserId, client_id: ClientId) -> AppResult<bool>;
}

/// Access token ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewAccessToken {
    /// SHA-256 hash of the raw bearer value.
    pub token_hash: String,
    /// Client the token was issued to.
    pub client_id: ClientId,
    /// Resource owner.
    pub user_id: UserId,
    /// Scope snapshot taken from the redeemed code.
    pub scopes: ScopeSet,
    /// Code the token was minted from.
    pub authorization_code_id: uuid::Uuid,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Access token as persisted.
#[derive(Debug, Clone)]
pub struct AccessTokenRecord {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Client the token was issued to.
    pub client_id: ClientId,
    /// Resource owner.
    pub user_id: UserId,
    /// Scope snapshot; never widened after issuance.
    pub scopes: ScopeSet,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// When the token was revoked, if ever.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Repository port for access token persistence.
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    /// Stores a newly minted token.
    async fn create_token(&self, token: NewAccessToken) -> AppResult<uuid::Uuid>;

    /// Finds a token by its hash regardless of revocation or expiry.
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessTokenRecord>>;

    /// Marks the token revoked. Already revoked tokens keep their timestamp.
    ///
    /// Returns the record the hash resolved to, if any.
    async fn revoke_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessTokenRecord>>;

    /// Marks every token ever issued to the client for the user revoked.
    ///
    /// Returns how many tokens changed state.
    async fn revoke_for_client(
        &self,
        user_id: UserId,
        client_id: ClientId,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Deletes tokens that expired before the cutoff.
    async fn purge_tokens(&self, before: DateTime<Utc>) -> AppResult<u64>;
}
