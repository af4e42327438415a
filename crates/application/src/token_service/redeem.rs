use super::*;
use crate::oauth_ports::NewAccessToken;
use crate::token_crypto::MintedSecret;

fn invalid_grant(detail: &str) -> AppError {
    AppError::InvalidGrant(detail.to_owned())
}

impl TokenService {
    /// Exchanges an authorization code for an access token.
    ///
    /// The code is consumed before any other check, so a code presented with
    /// the wrong client, redirect, or verifier is burnt and cannot be retried.
    pub async fn redeem(&self, request: &RedeemRequest) -> AppResult<IssuedToken> {
        let client = self
            .client_registry
            .lookup_client(&request.client_identifier)
            .await?;

        if request.code.trim().is_empty() {
            return Err(AppError::Validation("code is required".to_owned()));
        }
        if request.code_verifier.is_empty() {
            return Err(AppError::Validation("code_verifier is required".to_owned()));
        }

        let now = Utc::now();
        let record = self
            .code_repository
            .consume_code(&hash_secret(request.code.trim()), now)
            .await?
            .ok_or_else(|| {
                invalid_grant("the authorization code is invalid, expired, or already used")
            })?;

        if record.client_id != client.id() {
            return Err(invalid_grant("the authorization code was issued to another client"));
        }
        if record.redirect_uri != request.redirect_uri {
            return Err(invalid_grant("redirect_uri does not match the authorization request"));
        }
        if !record.pkce.verify(&request.code_verifier) {
            return Err(invalid_grant("code_verifier does not match the code_challenge"));
        }

        let token = MintedSecret::generate()?;
        let expires_at = now + self.settings.access_token_ttl;
        self.token_repository
            .create_token(NewAccessToken {
                token_hash: token.hash,
                client_id: client.id(),
                user_id: record.user_id,
                scopes: record.scopes.clone(),
                authorization_code_id: record.id,
                expires_at,
            })
            .await?;

        Ok(IssuedToken {
            access_token: token.raw,
            token_type: BEARER_TOKEN_TYPE,
            expires_in: self.settings.access_token_ttl.num_seconds(),
            scopes: record.scopes,
            expires_at,
        })
    }
}
