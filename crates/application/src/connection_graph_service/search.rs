use std::collections::{HashMap, HashSet};

use trustline_core::{AppResult, UserId};
use trustline_domain::{FriendshipEdge, MAX_CONNECTION_DEPTH};

use crate::social_ports::FriendshipSnapshot;

/// Level-synchronous BFS bounded by depth and by visited users.
///
/// Within a level, sources are expanded in discovery order and each source's
/// edges in insertion order, which fixes the winner among equal-length paths.
pub(super) async fn shortest_path(
    snapshot: &mut dyn FriendshipSnapshot,
    origin: UserId,
    target: UserId,
    max_visited: usize,
) -> AppResult<Option<Vec<UserId>>> {
    let mut visited = HashSet::from([origin]);
    let mut parents: HashMap<UserId, UserId> = HashMap::new();
    let mut frontier = vec![origin];

    for _ in 0..MAX_CONNECTION_DEPTH {
        let mut by_source: HashMap<UserId, Vec<FriendshipEdge>> = HashMap::new();
        for edge in snapshot.outgoing_edges(&frontier).await? {
            if edge.level.is_trust_tier() {
                by_source.entry(edge.user_id).or_default().push(edge);
            }
        }

        let mut next = Vec::new();
        for source in &frontier {
            for edge in by_source.remove(source).unwrap_or_default() {
                if !visited.insert(edge.friend_id) {
                    continue;
                }
                parents.insert(edge.friend_id, *source);

                if edge.friend_id == target {
                    return Ok(Some(unwind(&parents, origin, target)));
                }
                if visited.len() >= max_visited {
                    return Ok(None);
                }
                next.push(edge.friend_id);
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(None)
}

fn unwind(parents: &HashMap<UserId, UserId>, origin: UserId, target: UserId) -> Vec<UserId> {
    let mut path = vec![target];
    let mut current = target;
    while current != origin {
        let Some(parent) = parents.get(&current) else {
            break;
        };
        path.push(*parent);
        current = *parent;
    }
    path.reverse();
    path
}
