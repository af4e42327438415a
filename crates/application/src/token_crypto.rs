use sha2::{Digest, Sha256};
use trustline_core::{AppError, AppResult};

const SECRET_BYTES: usize = 32;

/// Freshly minted bearer secret.
///
/// `raw` leaves the server exactly once; only `hash` is persisted.
pub(crate) struct MintedSecret {
    pub(crate) raw: String,
    pub(crate) hash: String,
}

impl MintedSecret {
    /// Draws a new secret from the operating system RNG.
    pub(crate) fn generate() -> AppResult<Self> {
        let mut bytes = [0u8; SECRET_BYTES];
        getrandom::fill(&mut bytes)
            .map_err(|error| AppError::Internal(format!("failed to generate credential: {error}")))?;

        let raw = hex::encode(bytes);
        let hash = hash_secret(&raw);
        Ok(Self { raw, hash })
    }
}

/// Storage key for a presented code or access token.
pub(crate) fn hash_secret(raw_value: &str) -> String {
    hex::encode(Sha256::digest(raw_value.as_bytes()))
}
