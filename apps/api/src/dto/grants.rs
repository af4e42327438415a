use serde::Serialize;
use trustline_application::{ConnectedApp, GrantRevocation};
use ts_rs::TS;

use super::oauth::{ClientSummaryResponse, ScopeResponse};

/// One application the user has granted access to.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/connected-app-response.ts"
)]
pub struct ConnectedAppResponse {
    pub client: ClientSummaryResponse,
    pub scopes: Vec<ScopeResponse>,
    pub granted_at: String,
    pub updated_at: String,
}

impl From<ConnectedApp> for ConnectedAppResponse {
    fn from(app: ConnectedApp) -> Self {
        Self {
            client: ClientSummaryResponse::from(&app.client),
            scopes: ScopeResponse::describe(&app.scopes),
            granted_at: app.granted_at.to_rfc3339(),
            updated_at: app.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/revoke-grant-response.ts"
)]
pub struct RevokeGrantResponse {
    pub grant_removed: bool,
    #[ts(type = "number")]
    pub tokens_revoked: u64,
}

impl From<GrantRevocation> for RevokeGrantResponse {
    fn from(revocation: GrantRevocation) -> Self {
        Self {
            grant_removed: revocation.grant_removed,
            tokens_revoked: revocation.tokens_revoked,
        }
    }
}
