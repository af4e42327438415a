use chrono::Duration;

/// Lifetimes of the credentials minted by the authorization server.
#[derive(Debug, Clone, Copy)]
pub struct OAuthSettings {
    /// Time an authorization code stays redeemable.
    pub authorization_code_ttl: Duration,
    /// Time an access token stays valid.
    pub access_token_ttl: Duration,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            authorization_code_ttl: Duration::minutes(10),
            access_token_ttl: Duration::hours(1),
        }
    }
}

/// Bounds applied to resource reads.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    /// Maximum connections listed by `/userinfo`.
    pub connections_limit: usize,
    /// Maximum journal entries listed by `/userinfo`.
    pub journal_limit: usize,
    /// Maximum distinct users a degree search may visit.
    pub max_visited_users: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            connections_limit: 50,
            journal_limit: 5,
            max_visited_users: 10_000,
        }
    }
}
