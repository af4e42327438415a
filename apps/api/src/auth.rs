mod bootstrap;
mod session;

pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler};

use trustline_core::{AppError, AppResult, UserIdentity};
use tower_sessions::Session;

pub const SESSION_USER_KEY: &str = "user_identity";
/// Absolute session creation timestamp.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";

/// Reads the signed-in user, if any, from the session.
pub async fn current_identity(session: &Session) -> AppResult<Option<UserIdentity>> {
    session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))
}
