//! Room runtime state types
//!
//! This module defines the per-room state held by the store: the shared
//! playback clock, the participant roster, the bounded chat history, and
//! the broadcast channel used to fan events out to everyone in the room.

use std::collections::{HashMap, VecDeque};

use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::clock::PlaybackClock;
use crate::error::SyncError;
use crate::events::OutboundEvent;
use crate::ids::UserId;

use super::config::StoreConfig;

/// Participant role within a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Moderator,
    Participant,
}

/// Roster entry for one participant
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantInfo {
    pub username: String,
    pub role: Role,
    /// Wall-clock instant (unix seconds) the participant joined
    pub joined_at: f64,
}

/// A single chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// `"{user_id}_{millis}"`, unique and monotonic per sender
    pub id: String,
    pub user_id: UserId,
    pub username: String,
    pub message: String,
    /// Wall-clock send instant in unix seconds
    pub timestamp: f64,
    /// `HH:MM` in server-local time at the send instant
    pub formatted_time: String,
}

impl ChatMessage {
    /// Build a message, validating the text
    ///
    /// The text is trimmed; empty or over-length text is rejected.
    pub fn new(
        user_id: UserId,
        username: &str,
        text: &str,
        now: f64,
        max_len: usize,
    ) -> Result<Self, SyncError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SyncError::Validation("Message is empty".into()));
        }
        if text.chars().count() > max_len {
            return Err(SyncError::Validation(format!(
                "Message exceeds {} characters",
                max_len
            )));
        }

        let millis = (now * 1000.0) as i64;
        Ok(Self {
            id: format!("{}_{}", user_id, millis),
            user_id,
            username: username.to_string(),
            message: text.to_string(),
            timestamp: now,
            formatted_time: format_clock_time(now),
        })
    }
}

/// Render a unix-seconds instant as `HH:MM` in server-local time
fn format_clock_time(now: f64) -> String {
    chrono::Local
        .timestamp_opt(now as i64, 0)
        .single()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Read-only projection of a room for a newly joined client
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub video_url: String,
    /// Clock-extrapolated playback position
    pub current_time: f64,
    pub is_playing: bool,
    pub participants: HashMap<UserId, ParticipantInfo>,
    /// Most recent messages, capped at the snapshot limit, in send order
    pub chat_messages: Vec<ChatMessage>,
}

/// Resulting playback state after a control action
#[derive(Debug, Clone, Copy)]
pub struct PlaybackState {
    pub current_time: f64,
    pub is_playing: bool,
}

/// Runtime state for a single active room
///
/// Created lazily on first join, destroyed when the last participant leaves
/// or the room is deleted. Owned exclusively by the store; all access is
/// serialized behind the store's per-room lock.
pub struct RoomRuntimeState {
    /// Stream URL from room metadata, immutable after creation
    pub(super) video_url: String,

    /// Shared playback clock
    pub(super) clock: PlaybackClock,

    /// Active participants keyed by user ID
    pub(super) participants: HashMap<UserId, ParticipantInfo>,

    /// Bounded chat history, oldest first
    pub(super) chat_history: VecDeque<ChatMessage>,

    /// Broadcast sender for fan-out to everyone in the room
    pub(super) tx: broadcast::Sender<OutboundEvent>,
}

impl RoomRuntimeState {
    pub(super) fn new(video_url: &str, now: f64, config: &StoreConfig) -> Self {
        let (tx, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            video_url: video_url.to_string(),
            clock: PlaybackClock::new(now),
            participants: HashMap::new(),
            chat_history: VecDeque::new(),
            tx,
        }
    }

    /// Number of active participants
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Subscribe to this room's broadcast channel
    pub(super) fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.tx.subscribe()
    }

    /// Send an event to all subscribers
    ///
    /// Returns the number of receivers, or 0 if nobody is listening.
    pub(super) fn send(&self, event: OutboundEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Append a chat message, trimming the history to its bound
    pub(super) fn push_chat(&mut self, msg: ChatMessage, limit: usize) {
        self.chat_history.push_back(msg);
        while self.chat_history.len() > limit {
            self.chat_history.pop_front();
        }
    }

    /// Project the room into a snapshot for a joining client
    pub(super) fn snapshot(&self, now: f64, snapshot_limit: usize) -> RoomSnapshot {
        let skip = self.chat_history.len().saturating_sub(snapshot_limit);

        RoomSnapshot {
            video_url: self.video_url.clone(),
            current_time: self.clock.effective_time(now),
            is_playing: self.clock.is_playing(),
            participants: self.participants.clone(),
            chat_messages: self.chat_history.iter().skip(skip).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_trims_and_validates() {
        let msg =
            ChatMessage::new(UserId::new("u1"), "alice", "  hello  ", 1700000000.0, 500).unwrap();

        assert_eq!(msg.message, "hello");
        assert_eq!(msg.id, "u1_1700000000000");
        assert_eq!(msg.formatted_time.len(), 5);
        assert_eq!(msg.formatted_time.as_bytes()[2], b':');
    }

    #[test]
    fn test_chat_message_rejects_empty() {
        let result = ChatMessage::new(UserId::new("u1"), "alice", "   ", 0.0, 500);

        assert!(matches!(result, Err(SyncError::Validation(_))));
    }

    #[test]
    fn test_chat_message_rejects_oversized() {
        let text = "x".repeat(501);
        let result = ChatMessage::new(UserId::new("u1"), "alice", &text, 0.0, 500);

        assert!(matches!(result, Err(SyncError::Validation(_))));

        let text = "x".repeat(500);
        assert!(ChatMessage::new(UserId::new("u1"), "alice", &text, 0.0, 500).is_ok());
    }

    #[test]
    fn test_chat_ids_monotonic_per_user() {
        let a = ChatMessage::new(UserId::new("u1"), "alice", "first", 1000.000, 500).unwrap();
        let b = ChatMessage::new(UserId::new("u1"), "alice", "second", 1000.050, 500).unwrap();

        assert!(b.id > a.id);
    }

    #[test]
    fn test_history_trim_keeps_most_recent() {
        let config = StoreConfig::default().chat_history_limit(3);
        let mut state = RoomRuntimeState::new("http://v", 0.0, &config);

        for i in 0..5 {
            let msg = ChatMessage::new(UserId::new("u1"), "alice", &format!("m{}", i), i as f64, 500)
                .unwrap();
            state.push_chat(msg, config.chat_history_limit);
        }

        let texts: Vec<_> = state.chat_history.iter().map(|m| m.message.clone()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_snapshot_caps_chat() {
        let config = StoreConfig::default();
        let mut state = RoomRuntimeState::new("http://v", 0.0, &config);

        for i in 0..80 {
            let msg = ChatMessage::new(UserId::new("u1"), "alice", &format!("m{}", i), i as f64, 500)
                .unwrap();
            state.push_chat(msg, config.chat_history_limit);
        }

        let snap = state.snapshot(100.0, config.chat_snapshot_limit);
        assert_eq!(snap.chat_messages.len(), 50);
        assert_eq!(snap.chat_messages[0].message, "m30");
        assert_eq!(snap.chat_messages[49].message, "m79");
    }
}
