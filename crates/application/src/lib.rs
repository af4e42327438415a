//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod client_registry;
mod connection_graph_service;
mod grant_service;
mod oauth_ports;
mod settings;
mod social_ports;
mod token_crypto;
mod token_service;
mod userinfo_service;

#[cfg(test)]
mod test_support;

pub use authorization_service::{
    AuthorizationOutcome, AuthorizationRedirect, AuthorizationRequest, AuthorizationService,
    ConsentDescriptor,
};
pub use client_registry::ClientRegistry;
pub use connection_graph_service::{ConnectionDegree, ConnectionGraphService, ConnectionTarget};
pub use grant_service::{ConnectedApp, GrantRevocation, GrantService};
pub use oauth_ports::{
    AccessTokenRecord, AccessTokenRepository, AuthorizationCodeRecord,
    AuthorizationCodeRepository, ClientRepository, GrantRecord, GrantRepository, NewAccessToken,
    NewAuthorizationCode,
};
pub use settings::{OAuthSettings, ResourceLimits};
pub use social_ports::{
    FriendshipGraph, FriendshipSnapshot, HometownRecord, JournalEntryRecord, ProfileRecord,
    ProfileSource, UserDirectory, UserRef,
};
pub use token_service::{
    BEARER_TOKEN_TYPE, IssuedToken, PurgeReport, RedeemRequest, TokenContext, TokenService,
};
pub use userinfo_service::{BasicProfile, Connection, Hometown, UserInfo, UserInfoService};
