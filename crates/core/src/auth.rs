use serde::{Deserialize, Serialize};

use crate::UserId;

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    handle: String,
    display_name: String,
}

impl UserIdentity {
    /// Creates a user identity from a verified session login.
    #[must_use]
    pub fn new(user_id: UserId, handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            handle: handle.into(),
            display_name: display_name.into(),
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the public handle of the user.
    #[must_use]
    pub fn handle(&self) -> &str {
        self.handle.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}
