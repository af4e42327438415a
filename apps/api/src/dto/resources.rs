use serde::{Deserialize, Serialize};
use trustline_application::{
    Connection, ConnectionDegree, ConnectionTarget, JournalEntryRecord, UserInfo, UserRef,
};
use trustline_core::{AppError, AppResult, UserId};
use ts_rs::TS;

/// Scope-gated userinfo payload. Absent groups are omitted, never nulled.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-info-response.ts"
)]
pub struct UserInfoResponse {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub hometown: Option<HometownResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub connections: Option<Vec<ConnectionResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub journal: Option<Vec<JournalEntryResponse>>,
}

impl From<UserInfo> for UserInfoResponse {
    fn from(info: UserInfo) -> Self {
        let (handle, name, avatar_url, bio, link) = match info.profile {
            Some(profile) => (
                Some(profile.handle),
                Some(profile.name),
                profile.avatar_url,
                profile.bio,
                profile.link,
            ),
            None => (None, None, None, None, None),
        };

        Self {
            sub: info.subject.to_string(),
            handle,
            name,
            avatar_url,
            bio,
            link,
            email: info.email,
            hometown: info.hometown.map(|hometown| HometownResponse {
                name: hometown.name,
                latitude: hometown.latitude,
                longitude: hometown.longitude,
            }),
            connections: info
                .connections
                .map(|connections| connections.into_iter().map(Into::into).collect()),
            journal: info
                .journal
                .map(|entries| entries.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/hometown-response.ts"
)]
pub struct HometownResponse {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/connection-response.ts"
)]
pub struct ConnectionResponse {
    pub user_id: String,
    pub handle: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub level: String,
}

impl From<Connection> for ConnectionResponse {
    fn from(connection: Connection) -> Self {
        Self {
            user_id: connection.user.user_id.to_string(),
            handle: connection.user.handle,
            name: connection.user.display_name,
            avatar_url: connection.user.avatar_url,
            level: connection.level.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/journal-entry-response.ts"
)]
pub struct JournalEntryResponse {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: String,
}

impl From<JournalEntryRecord> for JournalEntryResponse {
    fn from(entry: JournalEntryRecord) -> Self {
        Self {
            id: entry.id.to_string(),
            title: entry.title,
            excerpt: entry.excerpt,
            published_at: entry.published_at.to_rfc3339(),
        }
    }
}

/// Query string of `GET /connection-degree`. Exactly one target is required.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectionDegreeQuery {
    pub user_id: Option<String>,
    pub handle: Option<String>,
}

impl ConnectionDegreeQuery {
    pub fn into_target(self) -> AppResult<ConnectionTarget> {
        match (self.user_id, self.handle) {
            (Some(user_id), None) => Ok(ConnectionTarget::UserId(UserId::parse(&user_id)?)),
            (None, Some(handle)) => Ok(ConnectionTarget::Handle(handle)),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "provide either user_id or handle, not both".to_owned(),
            )),
            (None, None) => Err(AppError::Validation(
                "user_id or handle is required".to_owned(),
            )),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/connection-degree-response.ts"
)]
pub struct ConnectionDegreeResponse {
    pub connected: bool,
    #[ts(type = "number | null")]
    pub degree: Option<usize>,
    pub path: Option<Vec<PathHopResponse>>,
}

impl From<ConnectionDegree> for ConnectionDegreeResponse {
    fn from(result: ConnectionDegree) -> Self {
        Self {
            connected: result.connected,
            degree: result.degree,
            path: result
                .path
                .map(|hops| hops.into_iter().map(PathHopResponse::from).collect()),
        }
    }
}

/// Minimal display identity of one hop.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/path-hop-response.ts"
)]
pub struct PathHopResponse {
    pub user_id: String,
    pub handle: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<UserRef> for PathHopResponse {
    fn from(user: UserRef) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            handle: user.handle,
            name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}
