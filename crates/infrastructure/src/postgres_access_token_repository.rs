//! PostgreSQL-backed access token store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use trustline_application::{AccessTokenRecord, AccessTokenRepository, NewAccessToken};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{ClientId, ScopeSet};

/// PostgreSQL implementation of the access token repository port.
#[derive(Clone)]
pub struct PostgresAccessTokenRepository {
    pool: PgPool,
}

impl PostgresAccessTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessTokenRepository for PostgresAccessTokenRepository {
    async fn create_token(&self, token: NewAccessToken) -> AppResult<uuid::Uuid> {
        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO oauth_access_tokens (
                token_hash, client_id, user_id, scopes, authorization_code_id, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.client_id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(token.scopes.to_storage())
        .bind(token.authorization_code_id)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create access token: {error}")))?;

        Ok(id)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessTokenRecord>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, client_id, user_id, scopes, created_at, expires_at, revoked_at
            FROM oauth_access_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find access token: {error}")))?;

        row.map(AccessTokenRecord::try_from).transpose()
    }

    async fn revoke_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessTokenRecord>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            UPDATE oauth_access_tokens
            SET revoked_at = COALESCE(revoked_at, $2)
            WHERE token_hash = $1
            RETURNING id, client_id, user_id, scopes, created_at, expires_at, revoked_at
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke access token: {error}")))?;

        row.map(AccessTokenRecord::try_from).transpose()
    }

    async fn revoke_for_client(
        &self,
        user_id: UserId,
        client_id: ClientId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE oauth_access_tokens
            SET revoked_at = $3
            WHERE user_id = $1
              AND client_id = $2
              AND revoked_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(client_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to revoke client access tokens: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    async fn purge_tokens(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM oauth_access_tokens
            WHERE expires_at < $1
            "#,
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to purge access tokens: {error}")))?;

        debug!(purged = result.rows_affected(), %before, "purged access tokens");
        Ok(result.rows_affected())
    }
}

#[derive(Debug, FromRow)]
struct TokenRow {
    id: uuid::Uuid,
    client_id: uuid::Uuid,
    user_id: uuid::Uuid,
    scopes: Vec<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl TryFrom<TokenRow> for AccessTokenRecord {
    type Error = AppError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            client_id: ClientId::from_uuid(row.client_id),
            user_id: UserId::from_uuid(row.user_id),
            scopes: ScopeSet::from_storage(&row.scopes)?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        })
    }
}
