//! Client session state machine
//!
//! Tracks one connection's lifecycle from authentication to disconnect.

use crate::ids::{RoomId, UserId};

/// Authenticated identity established by the external session layer
///
/// The transport resolves this before any event is accepted; a connection
/// without one is refused outright.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: UserId,
    pub username: String,
}

/// Connection lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No authenticated identity; the connection must be refused
    Unauthenticated,
    /// Authenticated, not in any room
    Connected,
    /// Joined to a room
    InRoom(RoomId),
    /// Connection torn down
    Disconnected,
}

/// Per-connection session state
#[derive(Debug, Clone)]
pub struct ClientSession {
    user_id: UserId,
    username: String,
    phase: SessionPhase,
}

impl ClientSession {
    /// Create a session for an authenticated connection
    pub fn connected(identity: AuthIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            username: identity.username,
            phase: SessionPhase::Connected,
        }
    }

    /// The authenticated user
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The authenticated username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Current phase
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Room this session is currently in, if any
    pub fn room(&self) -> Option<&RoomId> {
        match &self.phase {
            SessionPhase::InRoom(room) => Some(room),
            _ => None,
        }
    }

    /// Transition into a room (also covers switching rooms)
    pub fn enter_room(&mut self, room_id: RoomId) {
        self.phase = SessionPhase::InRoom(room_id);
    }

    /// Transition back to connected after leaving a room
    pub fn leave_room(&mut self) {
        if matches!(self.phase, SessionPhase::InRoom(_)) {
            self.phase = SessionPhase::Connected;
        }
    }

    /// Mark the session disconnected
    pub fn disconnect(&mut self) {
        self.phase = SessionPhase::Disconnected;
    }
}
