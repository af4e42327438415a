//! Degree-of-separation queries over the friendship graph.

use std::collections::HashMap;
use std::sync::Arc;

use trustline_core::{AppError, AppResult, UserId};
use trustline_domain::Scope;

use crate::settings::ResourceLimits;
use crate::social_ports::{FriendshipGraph, UserDirectory, UserRef};
use crate::token_service::TokenContext;

mod search;


/// User whose distance from the token owner is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Target by identifier.
    UserId(UserId),
    /// Target by public handle.
    Handle(String),
}

/// Result of a degree query.
///
/// A target beyond the depth cap is a regular `connected: false` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDegree {
    /// Whether a path exists within the depth cap.
    pub connected: bool,
    /// Number of hops on the shortest path.
    pub degree: Option<usize>,
    /// Hops from the token owner to the target, both included.
    pub path: Option<Vec<UserRef>>,
}

impl ConnectionDegree {
    fn unreachable() -> Self {
        Self {
            connected: false,
            degree: None,
            path: None,
        }
    }
}

/// Application service answering `/connection-degree`.
#[derive(Clone)]
pub struct ConnectionGraphService {
    directory: Arc<dyn UserDirectory>,
    graph: Arc<dyn FriendshipGraph>,
    limits: ResourceLimits,
}

impl ConnectionGraphService {
    /// Creates a new connection graph service.
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        graph: Arc<dyn FriendshipGraph>,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            directory,
            graph,
            limits,
        }
    }

    /// Finds the shortest trust path from the token owner to the target.
    pub async fn degree(
        &self,
        context: &TokenContext,
        target: &ConnectionTarget,
    ) -> AppResult<ConnectionDegree> {
        context.require_scope(Scope::ConnectionsDegree)?;

        let origin = context.user_id;
        let target_id = self.resolve_target(target).await?;

        let hops = if origin == target_id {
            Some(vec![origin])
        } else {
            let mut snapshot = self.graph.snapshot().await?;
            search::shortest_path(
                snapshot.as_mut(),
                origin,
                target_id,
                self.limits.max_visited_users,
            )
            .await?
        };

        let Some(hops) = hops else {
            return Ok(ConnectionDegree::unreachable());
        };

        let path = self.enrich(&hops).await?;
        Ok(ConnectionDegree {
            connected: true,
            degree: Some(hops.len() - 1),
            path: Some(path),
        })
    }

    async fn resolve_target(&self, target: &ConnectionTarget) -> AppResult<UserId> {
        let user = match target {
            ConnectionTarget::UserId(user_id) => self.directory.find_by_id(*user_id).await?,
            ConnectionTarget::Handle(handle) => {
                let handle = handle.trim().trim_start_matches('@');
                if handle.is_empty() {
                    return Err(AppError::Validation("target handle is required".to_owned()));
                }
                self.directory.find_by_handle(handle).await?
            }
        };

        user.map(|user| user.user_id)
            .ok_or_else(|| AppError::NotFound("target user does not exist".to_owned()))
    }

    async fn enrich(&self, hops: &[UserId]) -> AppResult<Vec<UserRef>> {
        let mut users: HashMap<UserId, UserRef> = self
            .directory
            .find_many(hops)
            .await?
            .into_iter()
            .map(|user| (user.user_id, user))
            .collect();

        hops.iter()
            .map(|user_id| {
                users.remove(user_id).ok_or_else(|| {
                    AppError::Internal(format!("path user '{user_id}' is missing from directory"))
                })
            })
            .collect()
    }
}
