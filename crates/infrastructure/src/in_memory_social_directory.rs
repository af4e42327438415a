use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use trustline_application::{
    FriendshipGraph, FriendshipSnapshot, JournalEntryRecord, ProfileRecord, ProfileSource,
    UserDirectory, UserRef,
};
use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::{FriendshipEdge, Visibility};

/// In-memory stand-in for the user, profile, journal, and friendship owners.
#[derive(Debug, Default)]
pub struct InMemorySocialDirectory {
    users: RwLock<Vec<UserRef>>,
    profiles: RwLock<HashMap<UserId, ProfileRecord>>,
    journal: RwLock<HashMap<UserId, Vec<JournalEntryRecord>>>,
    edges: RwLock<Vec<FriendshipEdge>>,
}

impl InMemorySocialDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, rejecting duplicate handles.
    pub async fn add_user(&self, user: UserRef) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|existing| existing.handle.eq_ignore_ascii_case(&user.handle))
        {
            return Err(AppError::Validation(format!(
                "handle '{}' is already taken",
                user.handle
            )));
        }

        users.push(user);
        Ok(())
    }

    /// Stores or replaces the profile of a user.
    pub async fn upsert_profile(&self, profile: ProfileRecord) {
        self.profiles
            .write()
            .await
            .insert(profile.user.user_id, profile);
    }

    /// Appends a journal entry.
    pub async fn add_journal_entry(&self, user_id: UserId, entry: JournalEntryRecord) {
        self.journal
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(entry);
    }

    /// Appends a directed friendship edge after every existing one.
    pub async fn add_friendship(&self, edge: FriendshipEdge) -> AppResult<()> {
        if edge.user_id == edge.friend_id {
            return Err(AppError::Validation(
                "a user cannot befriend themselves".to_owned(),
            ));
        }

        let mut edges = self.edges.write().await;
        if edges
            .iter()
            .any(|existing| existing.user_id == edge.user_id && existing.friend_id == edge.friend_id)
        {
            return Err(AppError::Validation(
                "friendship edge already exists".to_owned(),
            ));
        }

        edges.push(edge);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemorySocialDirectory {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRef>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> AppResult<Option<UserRef>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.handle.eq_ignore_ascii_case(handle))
            .cloned())
    }

    async fn find_many(&self, user_ids: &[UserId]) -> AppResult<Vec<UserRef>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|user| user_ids.contains(&user.user_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileSource for InMemorySocialDirectory {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<ProfileRecord>> {
        if let Some(profile) = self.profiles.read().await.get(&user_id) {
            return Ok(Some(profile.clone()));
        }

        // Users without a profile row read as an empty public profile.
        Ok(self.find_by_id(user_id).await?.map(|user| ProfileRecord {
            user,
            bio: None,
            link: None,
            profile_visibility: Visibility::Public,
            email: None,
            hometown: None,
        }))
    }

    async fn recent_public_journal_entries(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> AppResult<Vec<JournalEntryRecord>> {
        let mut entries: Vec<JournalEntryRecord> = self
            .journal
            .read()
            .await
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.visibility == Visibility::Public)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|left, right| right.published_at.cmp(&left.published_at));
        entries.truncate(limit);

        Ok(entries)
    }
}

#[async_trait]
impl FriendshipGraph for InMemorySocialDirectory {
    async fn snapshot(&self) -> AppResult<Box<dyn FriendshipSnapshot>> {
        Ok(Box::new(InMemoryFriendshipSnapshot {
            edges: self.edges.read().await.clone(),
        }))
    }
}

/// Copy of the edge list taken when the snapshot was opened.
struct InMemoryFriendshipSnapshot {
    edges: Vec<FriendshipEdge>,
}

#[async_trait]
impl FriendshipSnapshot for InMemoryFriendshipSnapshot {
    async fn outgoing_edges(&mut self, sources: &[UserId]) -> AppResult<Vec<FriendshipEdge>> {
        Ok(self
            .edges
            .iter()
            .filter(|edge| sources.contains(&edge.user_id))
            .copied()
            .collect())
    }
}
