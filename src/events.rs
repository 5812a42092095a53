//! Wire event types
//!
//! Typed payloads for the client/server event protocol. Inbound events are
//! what a transport decodes from a client frame; outbound events are what
//! the dispatcher sends back to one connection or broadcasts to a room.
//!
//! Outbound events are cheap to clone and encode to `bytes::Bytes`, so a
//! transport can serialize once and fan the same buffer out to every
//! subscriber.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::ids::{RoomId, UserId};
use crate::room::{ChatMessage, ParticipantInfo, Role};

/// Playback control verbs accepted from the room owner
///
/// This is a closed set: an unrecognized action string fails decoding
/// instead of silently passing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoActionKind {
    Play,
    Pause,
    Seek,
}

impl std::fmt::Display for VideoActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoActionKind::Play => write!(f, "play"),
            VideoActionKind::Pause => write!(f, "pause"),
            VideoActionKind::Seek => write!(f, "seek"),
        }
    }
}

/// Client-to-server events
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    VideoAction {
        room_id: RoomId,
        action: VideoActionKind,
        time: Option<f64>,
    },
    ChatMessage {
        room_id: RoomId,
        message: String,
    },
    KickUser {
        room_id: RoomId,
        user_id: UserId,
    },
    DeleteRoom {
        room_id: RoomId,
    },
}

impl InboundEvent {
    /// Decode an inbound event from a JSON frame
    pub fn from_json(frame: &[u8]) -> Result<Self, SyncError> {
        serde_json::from_slice(frame)
            .map_err(|err| SyncError::Validation(format!("malformed event: {}", err)))
    }
}

/// Server-to-client events
///
/// Some are delivered privately to one connection (`Connected`, `Error`,
/// `RoomState`), the rest are broadcast to every connection in a room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    Connected {
        status: String,
        message: String,
        user_id: UserId,
        username: String,
    },
    Error {
        message: String,
    },
    UserJoined {
        user_id: UserId,
        username: String,
        role: Role,
        participants_count: usize,
    },
    RoomState {
        video_url: String,
        current_time: f64,
        is_playing: bool,
        participants: HashMap<UserId, ParticipantInfo>,
        chat_messages: Vec<ChatMessage>,
        user_role: Role,
        room_owner_id: UserId,
        timestamp: f64,
    },
    UserLeft {
        user_id: UserId,
        username: String,
        participants_count: usize,
    },
    VideoSync {
        action: VideoActionKind,
        current_time: f64,
        is_playing: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        time: Option<f64>,
        timestamp: f64,
    },
    NewMessage {
        id: String,
        user_id: UserId,
        username: String,
        message: String,
        timestamp: f64,
        formatted_time: String,
    },
    UserKicked {
        user_id: UserId,
        username: String,
        message: String,
    },
    RoomDeleted {
        message: String,
        redirect: String,
    },
}

impl OutboundEvent {
    /// Build the connection acknowledgment for an authenticated identity
    pub fn connected(user_id: UserId, username: &str) -> Self {
        OutboundEvent::Connected {
            status: "success".into(),
            message: format!("Connected as {}", username),
            user_id,
            username: username.to_string(),
        }
    }

    /// Build the private `error` event for a failed operation
    pub fn from_error(err: &SyncError) -> Self {
        OutboundEvent::Error {
            message: err.client_message(),
        }
    }

    /// Build the broadcast payload for a chat message
    pub fn from_chat(msg: &ChatMessage) -> Self {
        OutboundEvent::NewMessage {
            id: msg.id.clone(),
            user_id: msg.user_id.clone(),
            username: msg.username.clone(),
            message: msg.message.clone(),
            timestamp: msg.timestamp,
            formatted_time: msg.formatted_time.clone(),
        }
    }

    /// Encode to a reference-counted JSON frame
    ///
    /// All variants hold a closed set of serializable fields, so encoding
    /// failure indicates a bug; it is logged and yields an empty frame
    /// rather than panicking in the broadcast path.
    pub fn to_bytes(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(buf) => Bytes::from(buf),
            Err(err) => {
                tracing::error!(error = %err, "Failed to encode outbound event");
                Bytes::new()
            }
        }
    }
}
