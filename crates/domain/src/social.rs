use serde::{Deserialize, Serialize};
use trustline_core::{AppError, AppResult, UserId};

/// Maximum number of edges a degree-of-separation search may follow.
pub const MAX_CONNECTION_DEPTH: usize = 6;

/// Trust level attached to a friendship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipLevel {
    /// Closest trust tier.
    BestFriend,
    /// Close friend.
    CloseFriend,
    /// Regular friend.
    Friend,
    /// Loose acquaintance.
    Acquaintance,
    /// Private edge only the owner may see.
    Secret,
    /// Decoy edge marking someone the owner does not trust.
    Adversary,
}

impl FriendshipLevel {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestFriend => "best_friend",
            Self::CloseFriend => "close_friend",
            Self::Friend => "friend",
            Self::Acquaintance => "acquaintance",
            Self::Secret => "secret",
            Self::Adversary => "adversary",
        }
    }

    /// Parses a storage string into a friendship level.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "best_friend" => Ok(Self::BestFriend),
            "close_friend" => Ok(Self::CloseFriend),
            "friend" => Ok(Self::Friend),
            "acquaintance" => Ok(Self::Acquaintance),
            "secret" => Ok(Self::Secret),
            "adversary" => Ok(Self::Adversary),
            _ => Err(AppError::Validation(format!(
                "unknown friendship level '{value}'"
            ))),
        }
    }

    /// Returns whether the edge may ever be surfaced to a third party.
    ///
    /// Secret and adversary edges are neither listed nor traversed.
    #[must_use]
    pub fn is_trust_tier(&self) -> bool {
        !matches!(self, Self::Secret | Self::Adversary)
    }
}

/// Directed friendship edge owned by the social graph collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendshipEdge {
    /// Edge origin.
    pub user_id: UserId,
    /// Edge target.
    pub friend_id: UserId,
    /// Trust level assigned by the origin.
    pub level: FriendshipLevel,
}

/// Audience a profile field or entry is visible to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Anyone.
    Public,
    /// Accepted friends.
    Friends,
    /// The owner only.
    OnlyMe,
}

impl Visibility {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friends => "friends",
            Self::OnlyMe => "only_me",
        }
    }

    /// Parses a storage string into a visibility.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "public" => Ok(Self::Public),
            "friends" => Ok(Self::Friends),
            "only_me" => Ok(Self::OnlyMe),
            _ => Err(AppError::Validation(format!("unknown visibility '{value}'"))),
        }
    }

    /// Returns whether an application the owner authorized may read the value.
    #[must_use]
    pub fn is_shareable_with_apps(&self) -> bool {
        !matches!(self, Self::OnlyMe)
    }
}
