//! PostgreSQL-backed authorization code store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use trustline_application::{
    AuthorizationCodeRecord, AuthorizationCodeRepository, NewAuthorizationCode,
};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{ClientId, PkceChallenge, ScopeSet};


/// PostgreSQL implementation of the authorization code repository port.
#[derive(Clone)]
pub struct PostgresAuthorizationCodeRepository {
    pool: PgPool,
}

impl PostgresAuthorizationCodeRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationCodeRepository for PostgresAuthorizationCodeRepository {
    async fn create_code(&self, code: NewAuthorizationCode) -> AppResult<uuid::Uuid> {
        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO oauth_authorization_codes (
                code_hash, client_id, user_id, redirect_uri, scopes,
                code_challenge, code_challenge_method, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&code.code_hash)
        .bind(code.client_id.as_uuid())
        .bind(code.user_id.as_uuid())
        .bind(&code.redirect_uri)
        .bind(code.scopes.to_storage())
        .bind(code.pkce.challenge())
        .bind(code.pkce.method().as_str())
        .bind(code.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create authorization code: {error}"))
        })?;

        Ok(id)
    }

    async fn consume_code(
        &self,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCodeRecord>> {
        // Single conditional statement: concurrent callers race on the row lock
        // and only the first sees `consumed_at IS NULL`.
        let row = sqlx::query_as::<_, CodeRow>(
            r#"
            UPDATE oauth_authorization_codes
            SET consumed_at = $2
            WHERE code_hash = $1
              AND consumed_at IS NULL
              AND expires_at > $2
            RETURNING id, client_id, user_id, redirect_uri, scopes, code_challenge,
                      code_challenge_method, created_at, expires_at, consumed_at
            "#,
        )
        .bind(code_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to consume authorization code: {error}"))
        })?;

        row.map(AuthorizationCodeRecord::try_from).transpose()
    }

    async fn purge_codes(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM oauth_authorization_codes
            WHERE expires_at < $1
               OR consumed_at < $1
            "#,
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to purge authorization codes: {error}"))
        })?;

        debug!(purged = result.rows_affected(), %before, "purged authorization codes");
        Ok(result.rows_affected())
    }
}

#[derive(Debug, FromRow)]
struct CodeRow {
    id: uuid::Uuid,
    client_id: uuid::Uuid,
    user_id: uuid::Uuid,
    redirect_uri: String,
    scopes: Vec<String>,
    code_challenge: String,
    code_challenge_method: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl TryFrom<CodeRow> for AuthorizationCodeRecord {
    type Error = AppError;

    fn try_from(row: CodeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            client_id: ClientId::from_uuid(row.client_id),
            user_id: UserId::from_uuid(row.user_id),
            redirect_uri: row.redirect_uri,
            scopes: ScopeSet::from_storage(&row.scopes)?,
            pkce: PkceChallenge::from_storage(row.code_challenge, &row.code_challenge_method)?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            consumed_at: row.consumed_at,
        })
    }
}
