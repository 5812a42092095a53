//! Room store error types

use crate::ids::RoomId;

/// Error type for store operations
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No runtime state exists for the room
    RoomNotFound(RoomId),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::RoomNotFound(room) => write!(f, "Room state not found: {}", room),
        }
    }
}

impl std::error::Error for StoreError {}
