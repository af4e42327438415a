//! PostgreSQL-backed grant store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use trustline_application::{GrantRecord, GrantRepository};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{ClientId, ScopeSet};

/// PostgreSQL implementation of the grant repository port.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn upsert_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
        scopes: &ScopeSet,
    ) -> AppResult<GrantRecord> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            INSERT INTO oauth_grants (user_id, client_id, scopes)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, client_id)
            DO UPDATE SET scopes = EXCLUDED.scopes, updated_at = now()
            RETURNING user_id, client_id, scopes, created_at, updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(client_id.as_uuid())
        .bind(scopes.to_storage())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert oauth grant: {error}")))?;

        GrantRecord::try_from(row)
    }

    async fn find_grant(
        &self,
        user_id: UserId,
        client_id: ClientId,
    ) -> AppResult<Option<GrantRecord>> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT user_id, client_id, scopes, created_at, updated_at
            FROM oauth_grants
            WHERE user_id = $1 AND client_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(client_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find oauth grant: {error}")))?;

        row.map(GrantRecord::try_from).transpose()
    }

    async fn list_grants_for_user(&self, user_id: UserId) -> AppResult<Vec<GrantRecord>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT user_id, client_id, scopes, created_at, updated_at
            FROM oauth_grants
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list oauth grants: {error}")))?;

        rows.into_iter().map(GrantRecord::try_from).collect()
    }

    async fn delete_grant(&self, user_id: UserId, client_id: ClientId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM oauth_grants
            WHERE user_id = $1 AND client_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(client_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete oauth grant: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    user_id: uuid::Uuid,
    client_id: uuid::Uuid,
    scopes: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for GrantRecord {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            client_id: ClientId::from_uuid(row.client_id),
            scopes: ScopeSet::from_storage(&row.scopes)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
