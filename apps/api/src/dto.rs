mod common;
mod grants;
mod oauth;
mod resources;

pub use common::{HealthDependencyStatus, HealthResponse, UserIdentityResponse};
pub use grants::{ConnectedAppResponse, RevokeGrantResponse};
pub use oauth::{
    AuthorizeDecisionRequest, AuthorizeDecisionResponse, AuthorizeQuery, ClientSummaryResponse,
    ConsentResponse, RevokeRequest, ScopeResponse, TokenRequest, TokenResponse,
};
pub use resources::{
    ConnectionDegreeQuery, ConnectionDegreeResponse, ConnectionResponse, HometownResponse,
    JournalEntryResponse, PathHopResponse, UserInfoResponse,
};
