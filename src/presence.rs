//! Connection presence registry
//!
//! Tracks which room each connected user currently occupies. A user is
//! bound to at most one room: binding to a second room returns the previous
//! binding so the caller can run the leave sequence against it.
//!
//! All read-modify-write sequences go through one write lock, so a bind is
//! atomic relative to concurrent joins and disconnects of the same user.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::ids::{RoomId, UserId};

/// Registry of user-to-room bindings
#[derive(Default)]
pub struct PresenceRegistry {
    bindings: RwLock<HashMap<UserId, RoomId>>,
}

impl PresenceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a user to a room, returning any previous different-room binding
    ///
    /// Rebinding to the same room is idempotent and returns `None`. The
    /// swap is atomic: a concurrent lookup sees either the old or the new
    /// binding, never neither.
    pub async fn bind(&self, user_id: &UserId, room_id: &RoomId) -> Option<RoomId> {
        let mut bindings = self.bindings.write().await;

        let previous = bindings.insert(user_id.clone(), room_id.clone());
        match previous {
            Some(prev) if prev != *room_id => {
                tracing::debug!(user = %user_id, from = %prev, to = %room_id, "Rebound user");
                Some(prev)
            }
            _ => None,
        }
    }

    /// Remove a user's binding, returning the room it pointed to
    pub async fn unbind(&self, user_id: &UserId) -> Option<RoomId> {
        self.bindings.write().await.remove(user_id)
    }

    /// Remove a user's binding only if it points at the given room
    ///
    /// Returns whether a binding was removed. Atomic check-then-remove: a
    /// binding to a different room is never touched.
    pub async fn unbind_from(&self, user_id: &UserId, room_id: &RoomId) -> bool {
        let mut bindings = self.bindings.write().await;

        match bindings.get(user_id) {
            Some(bound) if bound == room_id => {
                bindings.remove(user_id);
                true
            }
            _ => false,
        }
    }

    /// Room the user is currently bound to, if any
    pub async fn lookup(&self, user_id: &UserId) -> Option<RoomId> {
        self.bindings.read().await.get(user_id).cloned()
    }

    /// Remove every binding pointing to a room, returning the affected users
    ///
    /// Used when a room is deleted out from under its members.
    pub async fn unbind_room(&self, room_id: &RoomId) -> Vec<UserId> {
        let mut bindings = self.bindings.write().await;

        let users: Vec<UserId> = bindings
            .iter()
            .filter(|(_, bound)| *bound == room_id)
            .map(|(user, _)| user.clone())
            .collect();

        for user in &users {
            bindings.remove(user);
        }

        users
    }

    /// Number of bound users
    pub async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }

    /// Whether no users are bound
    pub async fn is_empty(&self) -> bool {
        self.bindings.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_and_lookup() {
        let registry = PresenceRegistry::new();
        let user = UserId::new("u1");
        let room = RoomId::new("r1");

        assert!(registry.bind(&user, &room).await.is_none());
        assert_eq!(registry.lookup(&user).await, Some(room));
    }

    #[tokio::test]
    async fn test_rebind_returns_previous_room() {
        let registry = PresenceRegistry::new();
        let user = UserId::new("u1");
        let first = RoomId::new("r1");
        let second = RoomId::new("r2");

        registry.bind(&user, &first).await;
        let previous = registry.bind(&user, &second).await;

        assert_eq!(previous, Some(first));
        assert_eq!(registry.lookup(&user).await, Some(second));
    }

    #[tokio::test]
    async fn test_rebind_same_room_is_idempotent() {
        let registry = PresenceRegistry::new();
        let user = UserId::new("u1");
        let room = RoomId::new("r1");

        registry.bind(&user, &room).await;
        assert!(registry.bind(&user, &room).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unbind() {
        let registry = PresenceRegistry::new();
        let user = UserId::new("u1");
        let room = RoomId::new("r1");

        registry.bind(&user, &room).await;
        assert_eq!(registry.unbind(&user).await, Some(room));
        assert!(registry.lookup(&user).await.is_none());
        assert!(registry.unbind(&user).await.is_none());
    }

    #[tokio::test]
    async fn test_unbind_from_requires_matching_room() {
        let registry = PresenceRegistry::new();
        let user = UserId::new("u1");
        let room = RoomId::new("r1");

        registry.bind(&user, &room).await;

        assert!(!registry.unbind_from(&user, &RoomId::new("r2")).await);
        assert_eq!(registry.lookup(&user).await, Some(room.clone()));

        assert!(registry.unbind_from(&user, &room).await);
        assert!(registry.lookup(&user).await.is_none());
        assert!(!registry.unbind_from(&user, &room).await);
    }

    #[tokio::test]
    async fn test_unbind_room_clears_all_members() {
        let registry = PresenceRegistry::new();
        let room = RoomId::new("r1");
        let other = RoomId::new("r2");

        registry.bind(&UserId::new("u1"), &room).await;
        registry.bind(&UserId::new("u2"), &room).await;
        registry.bind(&UserId::new("u3"), &other).await;

        let mut affected = registry.unbind_room(&room).await;
        affected.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        assert_eq!(affected, vec![UserId::new("u1"), UserId::new("u2")]);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.lookup(&UserId::new("u3")).await, Some(other));
    }
}
