//! Room store configuration

/// Configuration for the room state store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum chat messages retained per room (oldest trimmed on overflow)
    pub chat_history_limit: usize,

    /// Maximum chat messages included in a room-state snapshot
    pub chat_snapshot_limit: usize,

    /// Maximum chat message length in characters
    pub max_message_len: usize,

    /// Capacity of each room's broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chat_history_limit: 100,
            chat_snapshot_limit: 50,
            max_message_len: 500,
            broadcast_capacity: 256,
        }
    }
}

impl StoreConfig {
    /// Set the retained chat history limit
    pub fn chat_history_limit(mut self, limit: usize) -> Self {
        self.chat_history_limit = limit;
        self
    }

    /// Set the snapshot chat limit
    pub fn chat_snapshot_limit(mut self, limit: usize) -> Self {
        self.chat_snapshot_limit = limit;
        self
    }

    /// Set the maximum chat message length
    pub fn max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    /// Set the broadcast channel capacity
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }
}
