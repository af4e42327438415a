//! Shared primitives for all Rust crates in Trustline.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::UserIdentity;

/// Result type used across Trustline crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Identifier of a user owned by the external identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a user identifier from its hyphenated string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid user id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
///
/// Variants line up with the OAuth 2.0 error vocabulary so every layer can
/// surface a specific reason without translating between taxonomies.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input or violated invariant (`invalid_request`).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown or unusable client application.
    #[error("invalid client: {0}")]
    InvalidClient(String),

    /// Redirect target does not exactly match a registered one.
    #[error("invalid redirect uri: {0}")]
    InvalidRedirectUri(String),

    /// Resource owner refused the request.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Authorization code is unknown, expired, consumed, or fails PKCE.
    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    /// Bearer token is unknown, revoked, or expired.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Bearer token is valid but lacks the scope required by the resource.
    #[error("insufficient scope: {0}")]
    InsufficientScope(String),

    /// Caller has no verified session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal unexpected error, including collaborator and storage failures.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the wire error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid_request",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidRedirectUri(_) => "invalid_redirect_uri",
            Self::AccessDenied(_) => "access_denied",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::InvalidToken(_) => "invalid_token",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "server_error",
        }
    }

    /// Returns the human readable detail without the category prefix.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Validation(detail)
            | Self::InvalidClient(detail)
            | Self::InvalidRedirectUri(detail)
            | Self::AccessDenied(detail)
            | Self::InvalidGrant(detail)
            | Self::InvalidToken(detail)
            | Self::InsufficientScope(detail)
            | Self::Unauthorized(detail)
            | Self::NotFound(detail)
            | Self::Internal(detail) => detail.as_str(),
        }
    }
}
