//! Scope-gated profile reads for bearer-authenticated clients.

use std::collections::HashMap;
use std::sync::Arc;

use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{FriendshipLevel, Scope, Visibility};

use crate::settings::ResourceLimits;
use crate::social_ports::{
    FriendshipGraph, JournalEntryRecord, ProfileRecord, ProfileSource, UserDirectory, UserRef,
};
use crate::token_service::TokenContext;

/// Basic profile group gated by `profile:read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicProfile {
    /// Public handle.
    pub handle: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Biography, withheld when the profile is private.
    pub bio: Option<String>,
    /// Personal link, withheld when the profile is private.
    pub link: Option<String>,
}

/// Hometown group gated by `hometown:read`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hometown {
    /// Place name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
}

/// One trust-tier connection gated by `connections:read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Connected user.
    pub user: UserRef,
    /// Friendship level of the edge.
    pub level: FriendshipLevel,
}

/// Userinfo payload. Every group except the subject is optional and additive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserInfo {
    /// Token owner.
    pub subject: UserId,
    /// Basic profile fields.
    pub profile: Option<BasicProfile>,
    /// Private contact email.
    pub email: Option<String>,
    /// Hometown descriptor.
    pub hometown: Option<Hometown>,
    /// Bounded trust-tier connection list.
    pub connections: Option<Vec<Connection>>,
    /// Recent public journal entries, most recent first.
    pub journal: Option<Vec<JournalEntryRecord>>,
}

/// Resource server for `/userinfo`.
#[derive(Clone)]
pub struct UserInfoService {
    directory: Arc<dyn UserDirectory>,
    profiles: Arc<dyn ProfileSource>,
    graph: Arc<dyn FriendshipGraph>,
    limits: ResourceLimits,
}

impl UserInfoService {
    /// Creates a new userinfo service.
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        profiles: Arc<dyn ProfileSource>,
        graph: Arc<dyn FriendshipGraph>,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            directory,
            profiles,
            graph,
            limits,
        }
    }

    /// Builds the payload for the token owner, one group per effective scope.
    pub async fn get_userinfo(&self, context: &TokenContext) -> AppResult<UserInfo> {
        let subject = context.user_id;
        let scopes = &context.scopes;
        let mut payload = UserInfo {
            subject,
            ..UserInfo::default()
        };

        let needs_profile = [Scope::ProfileRead, Scope::ProfileEmail, Scope::HometownRead]
            .into_iter()
            .any(|scope| scopes.contains(scope));
        if needs_profile {
            let profile = self
                .profiles
                .find_profile(subject)
                .await?
                .ok_or_else(|| {
                    AppError::InvalidToken("the token subject no longer exists".to_owned())
                })?;
            apply_profile(&mut payload, profile, context);
        }

        if scopes.contains(Scope::ConnectionsRead) {
            payload.connections = Some(self.trust_connections(subject).await?);
        }

        if scopes.contains(Scope::JournalRead) {
            let entries = self
                .profiles
                .recent_public_journal_entries(subject, self.limits.journal_limit)
                .await?;
            payload.journal = Some(
                entries
                    .into_iter()
                    .filter(|entry| entry.visibility == Visibility::Public)
                    .take(self.limits.journal_limit)
                    .collect(),
            );
        }

        Ok(payload)
    }

    async fn trust_connections(&self, user_id: UserId) -> AppResult<Vec<Connection>> {
        let mut snapshot = self.graph.snapshot().await?;
        let edges: Vec<_> = snapshot
            .outgoing_edges(&[user_id])
            .await?
            .into_iter()
            .filter(|edge| edge.user_id == user_id && edge.level.is_trust_tier())
            .take(self.limits.connections_limit)
            .collect();

        let friend_ids: Vec<UserId> = edges.iter().map(|edge| edge.friend_id).collect();
        let mut users: HashMap<UserId, UserRef> = self
            .directory
            .find_many(&friend_ids)
            .await?
            .into_iter()
            .map(|user| (user.user_id, user))
            .collect();

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                users.remove(&edge.friend_id).map(|user| Connection {
                    user,
                    level: edge.level,
                })
            })
            .collect())
    }
}

fn apply_profile(payload: &mut UserInfo, profile: ProfileRecord, context: &TokenContext) {
    let scopes = &context.scopes;

    if scopes.contains(Scope::ProfileRead) {
        let shareable = profile.profile_visibility.is_shareable_with_apps();
        payload.profile = Some(BasicProfile {
            handle: profile.user.handle,
            name: profile.user.display_name,
            avatar_url: profile.user.avatar_url,
            bio: profile.bio.filter(|_| shareable),
            link: profile.link.filter(|_| shareable),
        });
    }

    if scopes.contains(Scope::ProfileEmail) {
        payload.email = profile.email;
    }

    if scopes.contains(Scope::HometownRead) {
        payload.hometown = profile
            .hometown
            .filter(|hometown| hometown.visibility.is_shareable_with_apps())
            .map(|hometown| Hometown {
                name: hometown.name,
                latitude: hometown.latitude,
                longitude: hometown.longitude,
            });
    }
}
