//! PostgreSQL-backed client registration store.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use trustline_application::ClientRepository;
use trustline_core::{AppError, AppResult, NonEmptyString};
use trustline_domain::{Client, ClientId, ClientMetadata, TrustTier};

/// PostgreSQL implementation of the client repository port.
#[derive(Clone)]
pub struct PostgresClientRepository {
    pool: PgPool,
}

impl PostgresClientRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
    async fn find_by_identifier(&self, client_identifier: &str) -> AppResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, client_identifier, display_name, description, logo_url, homepage_url,
                   redirect_uris, trust_tier
            FROM oauth_clients
            WHERE client_identifier = $1
            "#,
        )
        .bind(client_identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find oauth client: {error}")))?;

        row.map(Client::try_from).transpose()
    }

    async fn find_by_id(&self, client_id: ClientId) -> AppResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, client_identifier, display_name, description, logo_url, homepage_url,
                   redirect_uris, trust_tier
            FROM oauth_clients
            WHERE id = $1
            "#,
        )
        .bind(client_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find oauth client: {error}")))?;

        row.map(Client::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: uuid::Uuid,
    client_identifier: String,
    display_name: String,
    description: Option<String>,
    logo_url: Option<String>,
    homepage_url: Option<String>,
    redirect_uris: Vec<String>,
    trust_tier: String,
}

impl TryFrom<ClientRow> for Client {
    type Error = AppError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let corrupt = |error: AppError| {
            AppError::Internal(format!(
                "persisted oauth client '{}' is invalid: {error}",
                row.client_identifier
            ))
        };

        let metadata = ClientMetadata {
            display_name: NonEmptyString::new(row.display_name.clone()).map_err(corrupt)?,
            description: row.description.clone(),
            logo_url: row.logo_url.clone(),
            homepage_url: row.homepage_url.clone(),
        };
        let trust_tier = TrustTier::parse(&row.trust_tier).map_err(corrupt)?;

        Client::new(
            ClientId::from_uuid(row.id),
            row.client_identifier.clone(),
            row.redirect_uris.clone(),
            metadata,
            trust_tier,
        )
        .map_err(corrupt)
    }
}
