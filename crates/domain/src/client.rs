//! Registered third-party applications.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use trustline_core::{AppError, AppResult, NonEmptyString};
use uuid::Uuid;

use crate::PkceMethod;

/// Internal identifier of a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Creates a random client identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a client identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ClientId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Review status of a client application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    /// Reviewed by the platform.
    Verified,
    /// Self-registered and unreviewed.
    Unverified,
}

impl TrustTier {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
        }
    }

    /// Parses a storage string into a trust tier.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "verified" => Ok(Self::Verified),
            "unverified" => Ok(Self::Unverified),
            _ => Err(AppError::Validation(format!(
                "unknown client trust tier '{value}'"
            ))),
        }
    }
}

/// Display metadata shown on the consent screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// Application name.
    pub display_name: NonEmptyString,
    /// Short description supplied at registration.
    pub description: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Public homepage URL.
    pub homepage_url: Option<String>,
}

/// Registered third-party application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    id: ClientId,
    client_identifier: NonEmptyString,
    redirect_uris: Vec<String>,
    metadata: ClientMetadata,
    trust_tier: TrustTier,
}

impl Client {
    /// Creates a validated client record.
    pub fn new(
        id: ClientId,
        client_identifier: impl Into<String>,
        redirect_uris: Vec<String>,
        metadata: ClientMetadata,
        trust_tier: TrustTier,
    ) -> AppResult<Self> {
        let client_identifier = NonEmptyString::new(client_identifier)?;

        if redirect_uris.is_empty() {
            return Err(AppError::Validation(format!(
                "client '{}' must register at least one redirect uri",
                client_identifier.as_str()
            )));
        }

        if let Some(blank) = redirect_uris.iter().find(|uri| uri.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "client '{}' registers a blank redirect uri '{blank}'",
                client_identifier.as_str()
            )));
        }

        Ok(Self {
            id,
            client_identifier,
            redirect_uris,
            metadata,
            trust_tier,
        })
    }

    /// Returns the internal identifier.
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the public, stable client identifier.
    #[must_use]
    pub fn client_identifier(&self) -> &str {
        self.client_identifier.as_str()
    }

    /// Returns the registered redirect targets.
    #[must_use]
    pub fn redirect_uris(&self) -> &[String] {
        &self.redirect_uris
    }

    /// Returns the consent-screen metadata.
    #[must_use]
    pub fn metadata(&self) -> &ClientMetadata {
        &self.metadata
    }

    /// Returns the review status.
    #[must_use]
    pub fn trust_tier(&self) -> TrustTier {
        self.trust_tier
    }

    /// Returns whether the candidate is byte-identical to a registered redirect.
    ///
    /// No normalisation happens here: scheme case, trailing slashes, default
    /// ports and query strings all have to match exactly.
    #[must_use]
    pub fn accepts_redirect(&self, candidate: &str) -> bool {
        self.redirect_uris
            .iter()
            .any(|registered| registered.as_bytes() == candidate.as_bytes())
    }

    /// Returns whether the client may bind codes with the given PKCE method.
    ///
    /// Unverified clients are restricted to the hashed transform.
    #[must_use]
    pub fn allows_pkce_method(&self, method: PkceMethod) -> bool {
        match method {
            PkceMethod::S256 => true,
            PkceMethod::Plain => self.trust_tier == TrustTier::Verified,
        }
    }
}
