//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_oauth_repository;
mod in_memory_social_directory;
mod postgres_access_token_repository;
mod postgres_authorization_code_repository;
mod postgres_client_repository;
mod postgres_grant_repository;
mod postgres_social_directory;

pub use in_memory_oauth_repository::InMemoryOAuthRepository;
pub use in_memory_social_directory::InMemorySocialDirectory;
pub use postgres_access_token_repository::PostgresAccessTokenRepository;
pub use postgres_authorization_code_repository::PostgresAuthorizationCodeRepository;
pub use postgres_client_repository::PostgresClientRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
pub use postgres_social_directory::PostgresSocialDirectory;
