//! Proof Key for Code Exchange (RFC 7636).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use trustline_core::{AppError, AppResult};

const MIN_LENGTH: usize = 43;
const MAX_LENGTH: usize = 128;

/// Transform applied to the verifier before comparison with the challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PkceMethod {
    /// `BASE64URL(SHA256(verifier))`.
    #[serde(rename = "S256")]
    S256,
    /// Verifier compared directly.
    #[serde(rename = "plain")]
    Plain,
}

impl PkceMethod {
    /// Returns the wire and storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }

    /// Parses the `code_challenge_method` parameter.
    ///
    /// A missing method means `plain`, as RFC 7636 section 4.3 requires.
    pub fn parse(value: Option<&str>) -> AppResult<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("plain") => Ok(Self::Plain),
            Some("S256") => Ok(Self::S256),
            Some(other) => Err(AppError::Validation(format!(
                "unsupported code_challenge_method '{other}'"
            ))),
        }
    }
}

/// Challenge bound to an authorization code at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceChallenge {
    challenge: String,
    method: PkceMethod,
}

impl PkceChallenge {
    /// Creates a validated challenge.
    pub fn new(challenge: impl Into<String>, method: PkceMethod) -> AppResult<Self> {
        let challenge = challenge.into();
        if !is_well_formed(&challenge) {
            return Err(AppError::Validation(format!(
                "code_challenge must be {MIN_LENGTH}-{MAX_LENGTH} characters of [A-Za-z0-9-._~]"
            )));
        }

        Ok(Self { challenge, method })
    }

    /// Rebuilds a challenge from persisted values.
    pub fn from_storage(challenge: String, method: &str) -> AppResult<Self> {
        let method = match method {
            "S256" => PkceMethod::S256,
            "plain" => PkceMethod::Plain,
            other => {
                return Err(AppError::Internal(format!(
                    "persisted pkce method '{other}' is not supported"
                )));
            }
        };

        Ok(Self { challenge, method })
    }

    /// Returns the challenge string.
    #[must_use]
    pub fn challenge(&self) -> &str {
        self.challenge.as_str()
    }

    /// Returns the challenge method.
    #[must_use]
    pub fn method(&self) -> PkceMethod {
        self.method
    }

    /// Returns whether the verifier proves possession of this challenge.
    #[must_use]
    pub fn verify(&self, verifier: &str) -> bool {
        if !is_well_formed(verifier) {
            return false;
        }

        let derived = match self.method {
            PkceMethod::S256 => s256_challenge(verifier),
            PkceMethod::Plain => verifier.to_owned(),
        };

        derived.as_bytes().ct_eq(self.challenge.as_bytes()).into()
    }
}

/// Computes the `S256` challenge for a verifier.
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn is_well_formed(value: &str) -> bool {
    (MIN_LENGTH..=MAX_LENGTH).contains(&value.len())
        && value
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~'))
}
