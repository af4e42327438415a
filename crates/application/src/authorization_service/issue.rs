use chrono::Utc;
use trustline_core::UserId;

use super::redirect::{build_redirect, error_redirect};
use super::*;
use crate::oauth_ports::NewAuthorizationCode;
use crate::token_crypto::MintedSecret;

impl AuthorizationService {
    /// Applies the user's consent decision and builds the client redirect.
    ///
    /// The client and redirect target are validated again, never trusted from
    /// the preview. Once the redirect target is trusted every outcome,
    /// including denial and rejection, is reported through the redirect.
    pub async fn issue(
        &self,
        user_id: UserId,
        request: &AuthorizationRequest,
        approved: bool,
    ) -> AppResult<AuthorizationRedirect> {
        let client = self.trusted_client(request).await?;
        let state = request.state.as_deref();

        if !approved {
            let denial = AppError::AccessDenied("the user denied the request".to_owned());
            return Ok(AuthorizationRedirect {
                redirect_url: error_redirect(&request.redirect_uri, &denial, state)?,
                outcome: AuthorizationOutcome::Denied,
            });
        }

        match self.mint_code(user_id, &client, request).await {
            Ok(raw_code) => Ok(AuthorizationRedirect {
                redirect_url: build_redirect(
                    &request.redirect_uri,
                    &[("code", raw_code.as_str())],
                    state,
                )?,
                outcome: AuthorizationOutcome::CodeIssued,
            }),
            Err(error) => Ok(AuthorizationRedirect {
                redirect_url: error_redirect(&request.redirect_uri, &error, state)?,
                outcome: AuthorizationOutcome::Rejected(error),
            }),
        }
    }

    async fn mint_code(
        &self,
        user_id: UserId,
        client: &Client,
        request: &AuthorizationRequest,
    ) -> AppResult<String> {
        let (scopes, pkce) = validate_parameters(client, request)?;
        let code = MintedSecret::generate()?;

        self.code_repository
            .create_code(NewAuthorizationCode {
                code_hash: code.hash,
                client_id: client.id(),
                user_id,
                redirect_uri: request.redirect_uri.clone(),
                scopes: scopes.clone(),
                pkce,
                expires_at: Utc::now() + self.settings.authorization_code_ttl,
            })
            .await?;

        // The grant mirrors the latest approval, so a narrower approval narrows it.
        self.grant_repository
            .upsert_grant(user_id, client.id(), &scopes)
            .await?;

        Ok(code.raw)
    }
}
