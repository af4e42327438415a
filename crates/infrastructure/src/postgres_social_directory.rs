//! PostgreSQL reads over the user, profile, journal, and friendship tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use trustline_application::{
    FriendshipGraph, FriendshipSnapshot, HometownRecord, JournalEntryRecord, ProfileRecord,
    ProfileSource, UserDirectory, UserRef,
};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{FriendshipEdge, FriendshipLevel, Visibility};

/// PostgreSQL implementation of the social collaborator ports.
#[derive(Clone)]
pub struct PostgresSocialDirectory {
    pool: PgPool,
}

impl PostgresSocialDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn persisted<T>(result: AppResult<T>) -> AppResult<T> {
    result.map_err(|error| AppError::Internal(format!("persisted social data is invalid: {error}")))
}

#[async_trait]
impl UserDirectory for PostgresSocialDirectory {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRef>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, handle, display_name, avatar_url
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user: {error}")))?;

        Ok(row.map(UserRef::from))
    }

    async fn find_by_handle(&self, handle: &str) -> AppResult<Option<UserRef>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, handle, display_name, avatar_url
            FROM users
            WHERE LOWER(handle) = LOWER($1)
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by handle: {error}")))?;

        Ok(row.map(UserRef::from))
    }

    async fn find_many(&self, user_ids: &[UserId]) -> AppResult<Vec<UserRef>> {
        let ids: Vec<uuid::Uuid> = user_ids.iter().map(UserId::as_uuid).collect();
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, handle, display_name, avatar_url
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve users: {error}")))?;

        Ok(rows.into_iter().map(UserRef::from).collect())
    }
}

#[async_trait]
impl ProfileSource for PostgresSocialDirectory {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<ProfileRecord>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT users.id, users.handle, users.display_name, users.avatar_url,
                   profiles.bio, profiles.link, profiles.email,
                   COALESCE(profiles.visibility, 'public') AS visibility,
                   profiles.hometown_name, profiles.hometown_latitude,
                   profiles.hometown_longitude,
                   COALESCE(profiles.hometown_visibility, 'public') AS hometown_visibility
            FROM users
            LEFT JOIN profiles ON profiles.user_id = users.id
            WHERE users.id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load profile: {error}")))?;

        row.map(ProfileRecord::try_from).transpose()
    }

    async fn recent_public_journal_entries(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> AppResult<Vec<JournalEntryRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, JournalRow>(
            r#"
            SELECT id, title, excerpt, visibility, published_at
            FROM journal_entries
            WHERE user_id = $1
              AND visibility = 'public'
            ORDER BY published_at DESC, id
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list journal entries: {error}")))?;

        rows.into_iter().map(JournalEntryRecord::try_from).collect()
    }
}

#[async_trait]
impl FriendshipGraph for PostgresSocialDirectory {
    async fn snapshot(&self) -> AppResult<Box<dyn FriendshipSnapshot>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin graph snapshot: {error}"))
        })?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to pin graph snapshot: {error}"))
            })?;

        Ok(Box::new(PostgresFriendshipSnapshot { transaction }))
    }
}

/// Repeatable-read transaction held for the length of one traversal.
///
/// Dropping it rolls the read-only transaction back.
struct PostgresFriendshipSnapshot {
    transaction: Transaction<'static, Postgres>,
}

#[async_trait]
impl FriendshipSnapshot for PostgresFriendshipSnapshot {
    async fn outgoing_edges(&mut self, sources: &[UserId]) -> AppResult<Vec<FriendshipEdge>> {
        let ids: Vec<uuid::Uuid> = sources.iter().map(UserId::as_uuid).collect();
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT user_id, friend_id, level
            FROM friendships
            WHERE user_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to expand friendships: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(FriendshipEdge {
                    user_id: UserId::from_uuid(row.user_id),
                    friend_id: UserId::from_uuid(row.friend_id),
                    level: persisted(FriendshipLevel::parse(&row.level))?,
                })
            })
            .collect()
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    handle: String,
    display_name: String,
    avatar_url: Option<String>,
}

impl From<UserRow> for UserRef {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.id),
            handle: row.handle,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: uuid::Uuid,
    handle: String,
    display_name: String,
    avatar_url: Option<String>,
    bio: Option<String>,
    link: Option<String>,
    email: Option<String>,
    visibility: String,
    hometown_name: Option<String>,
    hometown_latitude: Option<f64>,
    hometown_longitude: Option<f64>,
    hometown_visibility: String,
}

impl TryFrom<ProfileRow> for ProfileRecord {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let hometown = match row.hometown_name {
            Some(name) => Some(HometownRecord {
                name,
                latitude: row.hometown_latitude,
                longitude: row.hometown_longitude,
                visibility: persisted(Visibility::parse(&row.hometown_visibility))?,
            }),
            None => None,
        };

        Ok(Self {
            user: UserRef {
                user_id: UserId::from_uuid(row.id),
                handle: row.handle,
                display_name: row.display_name,
                avatar_url: row.avatar_url,
            },
            bio: row.bio,
            link: row.link,
            profile_visibility: persisted(Visibility::parse(&row.visibility))?,
            email: row.email,
            hometown,
        })
    }
}

#[derive(Debug, FromRow)]
struct JournalRow {
    id: uuid::Uuid,
    title: String,
    excerpt: String,
    visibility: String,
    published_at: DateTime<Utc>,
}

impl TryFrom<JournalRow> for JournalEntryRecord {
    type Error = AppError;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            excerpt: row.excerpt,
            visibility: persisted(Visibility::parse(&row.visibility))?,
            published_at: row.published_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EdgeRow {
    user_id: uuid::Uuid,
    friend_id: uuid::Uuid,
    level: String,
}
