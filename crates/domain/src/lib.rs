//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod client;
mod pkce;
mod scope;
mod social;

pub use client::{Client, ClientId, ClientMetadata, TrustTier};
pub use pkce::{PkceChallenge, PkceMethod, s256_challenge};
pub use scope::{Scope, ScopeCategory, ScopeDescriptor, ScopeSet};
pub use social::{FriendshipEdge, FriendshipLevel, MAX_CONNECTION_DEPTH, Visibility};
