//! Ports onto the collaborators that own users, profiles, and friendships.
//!
//! This subsystem only reads through these ports; it never writes profile or
//! graph data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use trustline_core::{AppResult, UserId};
use trustline_domain::{FriendshipEdge, Visibility};

/// Minimal display identity of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// User identifier.
    pub user_id: UserId,
    /// Public handle.
    pub handle: String,
    /// Display name.
    pub display_name: String,
    /// Avatar URL, if set.
    pub avatar_url: Option<String>,
}

/// Identity lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by id.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRef>>;

    /// Finds a user by public handle.
    async fn find_by_handle(&self, handle: &str) -> AppResult<Option<UserRef>>;

    /// Resolves several users at once. Unknown ids are absent from the result.
    async fn find_many(&self, user_ids: &[UserId]) -> AppResult<Vec<UserRef>>;
}

/// Hometown descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct HometownRecord {
    /// Place name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
    /// Audience of the hometown fields.
    pub visibility: Visibility,
}

/// Profile fields as exposed by the profile collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    /// Display identity.
    pub user: UserRef,
    /// Free-form biography.
    pub bio: Option<String>,
    /// Personal link.
    pub link: Option<String>,
    /// Audience of the basic profile fields.
    pub profile_visibility: Visibility,
    /// Private contact email.
    pub email: Option<String>,
    /// Hometown, if set.
    pub hometown: Option<HometownRecord>,
}

/// Journal entry summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntryRecord {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Entry title.
    pub title: String,
    /// Short excerpt of the body.
    pub excerpt: String,
    /// Audience of the entry.
    pub visibility: Visibility,
    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
}

/// Profile and journal lookups.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Loads the profile of a user.
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<ProfileRecord>>;

    /// Lists the public journal entries of a user, most recent first.
    async fn recent_public_journal_entries(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> AppResult<Vec<JournalEntryRecord>>;
}

/// Entry point onto the friendship edge store.
#[async_trait]
pub trait FriendshipGraph: Send + Sync {
    /// Opens a read-only, point-in-time view of the edges.
    async fn snapshot(&self) -> AppResult<Box<dyn FriendshipSnapshot>>;
}

/// Consistent view of the friendship edges for the duration of one query.
#[async_trait]
pub trait FriendshipSnapshot: Send {
    /// Returns the outgoing edges of every source, in edge insertion order.
    ///
    /// Edges of every level are returned; callers decide what to traverse.
    async fn outgoing_edges(&mut self, sources: &[UserId]) -> AppResult<Vec<FriendshipEdge>>;
}
