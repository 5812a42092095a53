//! Room state store implementation
//!
//! The authoritative table of per-room runtime state. Every mutation of a
//! room happens behind that room's write lock, and the mutations that must
//! stay ordered relative to their broadcast (chat, playback control) send
//! on the room's channel while still holding the lock, so per-room
//! broadcast order always matches acceptance order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::clock::PlaybackAction;
use crate::events::{OutboundEvent, VideoActionKind};
use crate::ids::{RoomId, UserId};

use super::config::StoreConfig;
use super::error::StoreError;
use super::state::{
    ChatMessage, ParticipantInfo, PlaybackState, RoomRuntimeState, RoomSnapshot,
};

/// Outcome of removing a participant from a room
#[derive(Debug, Clone)]
pub struct RemovedParticipant {
    /// Username of the removed participant
    pub username: String,
    /// Participants remaining after removal
    pub remaining: usize,
}

/// Central store for all active room state
///
/// Thread-safe via `RwLock`: an outer map lock plus one lock per room, so
/// traffic in one room does not serialize against another.
pub struct RoomStore {
    /// Map of room ID to runtime state
    rooms: RwLock<HashMap<RoomId, Arc<RwLock<RoomRuntimeState>>>>,

    /// Configuration
    config: StoreConfig,
}

impl RoomStore {
    /// Create a new store with default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a new store with custom configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create runtime state for a room if it does not exist
    ///
    /// Idempotent: an existing room keeps its state (including its video
    /// URL, which is immutable after creation).
    pub async fn ensure_room(&self, room_id: &RoomId, video_url: &str, now: f64) {
        let mut rooms = self.rooms.write().await;

        if !rooms.contains_key(room_id) {
            let state = RoomRuntimeState::new(video_url, now, &self.config);
            rooms.insert(room_id.clone(), Arc::new(RwLock::new(state)));

            tracing::info!(room = %room_id, video_url = video_url, "Room state created");
        }
    }

    /// Insert or refresh a participant entry
    ///
    /// Idempotent rejoin: an existing entry is overwritten. Returns the
    /// participant count after insertion.
    pub async fn add_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        info: ParticipantInfo,
    ) -> Result<usize, StoreError> {
        let rooms = self.rooms.read().await;

        let state_arc = rooms
            .get(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        let mut state = state_arc.write().await;
        state.participants.insert(user_id.clone(), info);
        let count = state.participant_count();

        tracing::info!(room = %room_id, user = %user_id, participants = count, "Participant added");

        Ok(count)
    }

    /// Remove a participant, evicting the room state if it empties
    ///
    /// Returns `None` if the room or participant was absent (no-op).
    pub async fn remove_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Option<RemovedParticipant> {
        // Outer write lock: eviction may remove the map entry
        let mut rooms = self.rooms.write().await;

        let state_arc = Arc::clone(rooms.get(room_id)?);
        let mut state = state_arc.write().await;

        let removed = state.participants.remove(user_id)?;
        let remaining = state.participant_count();

        tracing::info!(
            room = %room_id,
            user = %user_id,
            participants = remaining,
            "Participant removed"
        );

        drop(state);
        if remaining == 0 {
            rooms.remove(room_id);
            tracing::info!(room = %room_id, "Room state evicted (empty)");
        }

        Some(RemovedParticipant {
            username: removed.username,
            remaining,
        })
    }

    /// Record a chat message and broadcast it to the room
    ///
    /// The history trims to its configured bound; append and broadcast
    /// happen under the room's write lock to preserve event order.
    pub async fn record_chat(&self, room_id: &RoomId, msg: ChatMessage) -> Result<(), StoreError> {
        let rooms = self.rooms.read().await;

        let state_arc = rooms
            .get(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        let mut state = state_arc.write().await;
        let event = OutboundEvent::from_chat(&msg);
        state.push_chat(msg, self.config.chat_history_limit);
        let _ = state.send(event);

        Ok(())
    }

    /// Apply a playback control action and broadcast the sync event
    ///
    /// Mutation and broadcast happen under the room's write lock so that
    /// concurrent actions reach every member in the order they were applied.
    pub async fn apply_playback_action(
        &self,
        room_id: &RoomId,
        action: PlaybackAction,
        now: f64,
    ) -> Result<PlaybackState, StoreError> {
        let rooms = self.rooms.read().await;

        let state_arc = rooms
            .get(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        let mut state = state_arc.write().await;
        state.clock.apply(action, now);

        let result = PlaybackState {
            current_time: state.clock.position(),
            is_playing: state.clock.is_playing(),
        };

        let (kind, seek_time) = match action {
            PlaybackAction::Play => (VideoActionKind::Play, None),
            PlaybackAction::Pause => (VideoActionKind::Pause, None),
            PlaybackAction::Seek(time) => (VideoActionKind::Seek, Some(time)),
        };

        let _ = state.send(OutboundEvent::VideoSync {
            action: kind,
            current_time: result.current_time,
            is_playing: result.is_playing,
            time: seek_time,
            timestamp: now,
        });

        tracing::info!(
            room = %room_id,
            action = %kind,
            current_time = result.current_time,
            is_playing = result.is_playing,
            "Playback action applied"
        );

        Ok(result)
    }

    /// Read-only snapshot for a joining client, clock-extrapolated to `now`
    pub async fn snapshot(&self, room_id: &RoomId, now: f64) -> Option<RoomSnapshot> {
        let rooms = self.rooms.read().await;

        let state_arc = rooms.get(room_id)?;
        let state = state_arc.read().await;

        Some(state.snapshot(now, self.config.chat_snapshot_limit))
    }

    /// Subscribe to a room's broadcast channel
    pub async fn subscribe(
        &self,
        room_id: &RoomId,
    ) -> Result<broadcast::Receiver<OutboundEvent>, StoreError> {
        let rooms = self.rooms.read().await;

        let state_arc = rooms
            .get(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        let state = state_arc.read().await;
        Ok(state.subscribe())
    }

    /// Broadcast an event to everyone in a room
    ///
    /// No-op for an unknown room. Returns the number of receivers.
    pub async fn broadcast(&self, room_id: &RoomId, event: OutboundEvent) -> usize {
        let rooms = self.rooms.read().await;

        if let Some(state_arc) = rooms.get(room_id) {
            let state = state_arc.read().await;
            state.send(event)
        } else {
            0
        }
    }

    /// Remove a room's state unconditionally
    ///
    /// Returns whether state existed.
    pub async fn delete_room(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.write().await;

        let existed = rooms.remove(room_id).is_some();
        if existed {
            tracing::info!(room = %room_id, "Room state deleted");
        }
        existed
    }

    /// Participant count for a room, if its state exists
    pub async fn participant_count(&self, room_id: &RoomId) -> Option<usize> {
        let rooms = self.rooms.read().await;

        if let Some(state_arc) = rooms.get(room_id) {
            let state = state_arc.read().await;
            Some(state.participant_count())
        } else {
            None
        }
    }

    /// Whether runtime state exists for a room
    pub async fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.read().await.contains_key(room_id)
    }

    /// Total number of active rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Role;

    fn participant(name: &str, role: Role, now: f64) -> ParticipantInfo {
        ParticipantInfo {
            username: name.to_string(),
            role,
            joined_at: now,
        }
    }

    #[tokio::test]
    async fn test_ensure_room_idempotent() {
        let store = RoomStore::new();
        let room = RoomId::new("1");

        store.ensure_room(&room, "http://v/1", 100.0).await;
        store.ensure_room(&room, "http://v/other", 200.0).await;

        assert_eq!(store.room_count().await, 1);
        let snap = store.snapshot(&room, 200.0).await.unwrap();
        // First creation wins; the URL is immutable
        assert_eq!(snap.video_url, "http://v/1");
        assert_eq!(snap.current_time, 0.0);
        assert!(!snap.is_playing);
    }

    #[tokio::test]
    async fn test_add_participant_requires_room() {
        let store = RoomStore::new();
        let room = RoomId::new("1");

        let result = store
            .add_participant(&room, &UserId::new("u1"), participant("alice", Role::Owner, 0.0))
            .await;

        assert!(matches!(result, Err(StoreError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_rejoin_overwrites_entry() {
        let store = RoomStore::new();
        let room = RoomId::new("1");
        let user = UserId::new("u1");

        store.ensure_room(&room, "http://v/1", 0.0).await;
        let count = store
            .add_participant(&room, &user, participant("alice", Role::Owner, 0.0))
            .await
            .unwrap();
        assert_eq!(count, 1);

        let count = store
            .add_participant(&room, &user, participant("alice", Role::Owner, 5.0))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_last_leave_evicts_room() {
        let store = RoomStore::new();
        let room = RoomId::new("1");
        let user = UserId::new("u1");

        store.ensure_room(&room, "http://v/1", 0.0).await;
        store
            .add_participant(&room, &user, participant("alice", Role::Owner, 0.0))
            .await
            .unwrap();

        let removed = store.remove_participant(&room, &user).await.unwrap();
        assert_eq!(removed.username, "alice");
        assert_eq!(removed.remaining, 0);

        // State is gone; snapshot behaves as not-found
        assert!(!store.contains(&room).await);
        assert!(store.snapshot(&room, 10.0).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_absent_participant_is_noop() {
        let store = RoomStore::new();
        let room = RoomId::new("1");

        assert!(store.remove_participant(&room, &UserId::new("ghost")).await.is_none());

        store.ensure_room(&room, "http://v/1", 0.0).await;
        store
            .add_participant(&room, &UserId::new("u1"), participant("alice", Role::Owner, 0.0))
            .await
            .unwrap();

        assert!(store.remove_participant(&room, &UserId::new("ghost")).await.is_none());
        assert_eq!(store.participant_count(&room).await, Some(1));
    }

    #[tokio::test]
    async fn test_chat_bound_keeps_most_recent_hundred() {
        let store = RoomStore::new();
        let room = RoomId::new("1");
        let user = UserId::new("u1");

        store.ensure_room(&room, "http://v/1", 0.0).await;
        store
            .add_participant(&room, &user, participant("alice", Role::Owner, 0.0))
            .await
            .unwrap();

        for i in 0..150 {
            let msg =
                ChatMessage::new(user.clone(), "alice", &format!("m{}", i), i as f64, 500).unwrap();
            store.record_chat(&room, msg).await.unwrap();
        }

        let snap = store.snapshot(&room, 200.0).await.unwrap();
        // Snapshot shows the last 50 of the retained 100, in send order
        assert_eq!(snap.chat_messages.len(), 50);
        assert_eq!(snap.chat_messages[0].message, "m100");
        assert_eq!(snap.chat_messages[49].message, "m149");
    }

    #[tokio::test]
    async fn test_playback_action_broadcasts_in_order() {
        let store = RoomStore::new();
        let room = RoomId::new("1");

        store.ensure_room(&room, "http://v/1", 1000.0).await;
        store
            .add_participant(&room, &UserId::new("u1"), participant("alice", Role::Owner, 1000.0))
            .await
            .unwrap();

        let mut rx = store.subscribe(&room).await.unwrap();

        store
            .apply_playback_action(&room, PlaybackAction::Seek(100.0), 1000.0)
            .await
            .unwrap();
        let result = store
            .apply_playback_action(&room, PlaybackAction::Play, 1000.0)
            .await
            .unwrap();
        assert!(result.is_playing);
        assert_eq!(result.current_time, 100.0);

        match rx.recv().await.unwrap() {
            OutboundEvent::VideoSync { action, time, .. } => {
                assert_eq!(action, VideoActionKind::Seek);
                assert_eq!(time, Some(100.0));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            OutboundEvent::VideoSync { action, is_playing, .. } => {
                assert_eq!(action, VideoActionKind::Play);
                assert!(is_playing);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_snapshot_extrapolates_while_playing() {
        let store = RoomStore::new();
        let room = RoomId::new("1");

        store.ensure_room(&room, "http://v/1", 1000.0).await;
        store
            .add_participant(&room, &UserId::new("u1"), participant("alice", Role::Owner, 1000.0))
            .await
            .unwrap();
        store
            .apply_playback_action(&room, PlaybackAction::Play, 1000.0)
            .await
            .unwrap();

        let snap = store.snapshot(&room, 1010.0).await.unwrap();
        assert!(snap.is_playing);
        assert!((snap.current_time - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_delete_room_drops_state() {
        let store = RoomStore::new();
        let room = RoomId::new("1");

        store.ensure_room(&room, "http://v/1", 0.0).await;
        assert!(store.delete_room(&room).await);
        assert!(!store.delete_room(&room).await);
        assert!(store.snapshot(&room, 1.0).await.is_none());
    }

    #[tokio::test]
    async fn test_operations_on_missing_room_signal_not_found() {
        let store = RoomStore::new();
        let room = RoomId::new("missing");
        let msg = ChatMessage::new(UserId::new("u1"), "alice", "hi", 0.0, 500).unwrap();

        assert!(matches!(
            store.record_chat(&room, msg).await,
            Err(StoreError::RoomNotFound(_))
        ));
        assert!(matches!(
            store
                .apply_playback_action(&room, PlaybackAction::Play, 0.0)
                .await,
            Err(StoreError::RoomNotFound(_))
        ));
        assert!(matches!(
            store.subscribe(&room).await,
            Err(StoreError::RoomNotFound(_))
        ));
        assert_eq!(store.broadcast(&room, OutboundEvent::Error { message: "x".into() }).await, 0);
    }
}
