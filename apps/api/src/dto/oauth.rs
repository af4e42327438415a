use serde::{Deserialize, Serialize};
use trustline_application::{AuthorizationRequest, ConsentDescriptor, IssuedToken, RedeemRequest};
use trustline_core::{AppError, AppResult};
use trustline_domain::{Client, ScopeDescriptor, ScopeSet};
use ts_rs::TS;

/// Query string of `GET /authorize`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeQuery {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

impl AuthorizeQuery {
    /// Checks the transport-level parameters and builds the service request.
    pub fn into_request(self) -> AppResult<AuthorizationRequest> {
        if let Some(response_type) = self.response_type.as_deref()
            && response_type != "code"
        {
            return Err(AppError::Validation(format!(
                "response_type '{response_type}' is not supported"
            )));
        }

        Ok(AuthorizationRequest {
            client_identifier: required(self.client_id, "client_id")?,
            redirect_uri: required(self.redirect_uri, "redirect_uri")?,
            scope: self.scope.unwrap_or_default(),
            state: self.state,
            code_challenge: self.code_challenge,
            code_challenge_method: self.code_challenge_method,
        })
    }
}

/// Consent decision posted by the signed-in user.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/authorize-decision-request.ts"
)]
pub struct AuthorizeDecisionRequest {
    pub client_id: String,
    pub redirect_uri: String,
    /// Approved scopes, space-delimited. May be narrower than requested.
    pub scope: String,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub approved: bool,
}

impl AuthorizeDecisionRequest {
    /// Splits the payload into the service request and the decision.
    #[must_use]
    pub fn into_parts(self) -> (AuthorizationRequest, bool) {
        (
            AuthorizationRequest {
                client_identifier: self.client_id,
                redirect_uri: self.redirect_uri,
                scope: self.scope,
                state: self.state,
                code_challenge: self.code_challenge,
                code_challenge_method: self.code_challenge_method,
            },
            self.approved,
        )
    }
}

/// Public description of a client application.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/client-summary-response.ts"
)]
pub struct ClientSummaryResponse {
    pub client_id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub homepage_url: Option<String>,
    pub trust_tier: String,
}

impl From<&Client> for ClientSummaryResponse {
    fn from(client: &Client) -> Self {
        let metadata = client.metadata();
        Self {
            client_id: client.client_identifier().to_owned(),
            display_name: metadata.display_name.as_str().to_owned(),
            description: metadata.description.clone(),
            logo_url: metadata.logo_url.clone(),
            homepage_url: metadata.homepage_url.clone(),
            trust_tier: client.trust_tier().as_str().to_owned(),
        }
    }
}

/// Consent-screen description of one scope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/scope-response.ts"
)]
pub struct ScopeResponse {
    pub name: String,
    pub description: String,
    pub category: String,
}

impl From<ScopeDescriptor> for ScopeResponse {
    fn from(descriptor: ScopeDescriptor) -> Self {
        Self {
            name: descriptor.name.to_owned(),
            description: descriptor.description.to_owned(),
            category: descriptor.category.as_str().to_owned(),
        }
    }
}

impl ScopeResponse {
    /// Describes every scope of the set in registry order.
    #[must_use]
    pub fn describe(scopes: &ScopeSet) -> Vec<Self> {
        scopes.descriptors().into_iter().map(Self::from).collect()
    }
}

/// Data the consent screen renders.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/consent-response.ts"
)]
pub struct ConsentResponse {
    pub client: ClientSummaryResponse,
    pub redirect_uri: String,
    pub scopes: Vec<ScopeResponse>,
    pub state: Option<String>,
    pub code_challenge_method: String,
    pub previously_granted: Vec<String>,
    pub already_granted: bool,
}

impl From<ConsentDescriptor> for ConsentResponse {
    fn from(descriptor: ConsentDescriptor) -> Self {
        Self {
            client: ClientSummaryResponse::from(&descriptor.client),
            redirect_uri: descriptor.redirect_uri,
            scopes: ScopeResponse::describe(&descriptor.scopes),
            state: descriptor.state,
            code_challenge_method: descriptor.pkce.method().as_str().to_owned(),
            previously_granted: descriptor.previously_granted.to_storage(),
            already_granted: descriptor.already_granted,
        }
    }
}

/// Where the user agent goes after a consent decision.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/authorize-decision-response.ts"
)]
pub struct AuthorizeDecisionResponse {
    pub redirect_url: String,
}

/// Form body of `POST /token`.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
}

impl TokenRequest {
    /// Builds the redemption request once the grant type is known to be supported.
    pub fn into_redeem_request(self) -> AppResult<RedeemRequest> {
        Ok(RedeemRequest {
            code: required(self.code, "code")?,
            client_identifier: required(self.client_id, "client_id")?,
            redirect_uri: required(self.redirect_uri, "redirect_uri")?,
            code_verifier: required(self.code_verifier, "code_verifier")?,
        })
    }
}

/// Successful token endpoint payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/token-response.ts"
)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.access_token,
            token_type: issued.token_type.to_owned(),
            expires_in: issued.expires_in,
            scope: issued.scopes.to_scope_string(),
        }
    }
}

/// Form body of `POST /revoke`. `token_type_hint` is accepted and ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RevokeRequest {
    pub token: Option<String>,
    pub client_id: Option<String>,
}

impl RevokeRequest {
    /// Returns `(token, client_id)`.
    pub fn into_parts(self) -> AppResult<(String, String)> {
        Ok((
            required(self.token, "token")?,
            required(self.client_id, "client_id")?,
        ))
    }
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}
