//! Crate error types
//!
//! One taxonomy for every failure a dispatched event can produce. Each error
//! is terminal for its event: it is reported to the initiating client only
//! and never mutates or broadcasts room state.

use crate::ids::RoomId;
use crate::room::StoreError;

/// Result alias for dispatcher and store operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type for room synchronization operations
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// No authenticated identity on the connection
    Unauthenticated,
    /// Event arrived on a session that already disconnected
    SessionClosed,
    /// User is not an active member of the room
    NotAMember(RoomId),
    /// Caller is not the room owner
    NotOwner(RoomId),
    /// Caller is not currently in the room it is targeting
    NotInRoom(RoomId),
    /// Owner attempted to kick themselves
    SelfKick,
    /// Malformed or out-of-bounds client input
    Validation(String),
    /// Room does not resolve in the external metadata layer
    RoomNotFound(RoomId),
    /// Unexpected internal failure
    Internal(String),
}

impl SyncError {
    /// Client-facing message for the `error` event
    ///
    /// Internal errors are deliberately generic; detail goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            SyncError::Unauthenticated => "Not authenticated".into(),
            SyncError::SessionClosed => "Connection is closed".into(),
            SyncError::NotAMember(_) => "No permission for this room".into(),
            SyncError::NotOwner(_) => "Only the room owner can do that".into(),
            SyncError::NotInRoom(_) => "You are not in this room".into(),
            SyncError::SelfKick => "You cannot kick yourself".into(),
            SyncError::Validation(reason) => reason.clone(),
            SyncError::RoomNotFound(_) => "Room not found".into(),
            SyncError::Internal(_) => "Internal server error".into(),
        }
    }

    /// Whether this error denies an action on authorization grounds
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            SyncError::NotAMember(_)
                | SyncError::NotOwner(_)
                | SyncError::NotInRoom(_)
                | SyncError::SelfKick
        )
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Unauthenticated => write!(f, "connection has no authenticated identity"),
            SyncError::SessionClosed => write!(f, "session already disconnected"),
            SyncError::NotAMember(room) => write!(f, "not an active member of room {}", room),
            SyncError::NotOwner(room) => write!(f, "not the owner of room {}", room),
            SyncError::NotInRoom(room) => write!(f, "not currently in room {}", room),
            SyncError::SelfKick => write!(f, "owner cannot kick themselves"),
            SyncError::Validation(reason) => write!(f, "invalid input: {}", reason),
            SyncError::RoomNotFound(room) => write!(f, "room not found: {}", room),
            SyncError::Internal(detail) => write!(f, "internal error: {}", detail),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(room) => SyncError::RoomNotFound(room),
        }
    }
}
