//! External room directory seam
//!
//! Room metadata and membership records live outside this core, in whatever
//! persistence layer the embedding application uses. The dispatcher only
//! ever consults them through this trait, which keeps the core unit-testable
//! without a database.

use crate::error::Result;
use crate::ids::{RoomId, UserId};
use crate::room::Role;

/// Room metadata as stored by the external collaborator
#[derive(Debug, Clone)]
pub struct RoomRecord {
    pub id: RoomId,
    /// The room owner, sole authority for playback control, kicks, deletion
    pub owner_id: UserId,
    /// URL of the external video stream watched in this room
    pub stream_url: String,
    /// Inactive rooms behave as nonexistent
    pub is_active: bool,
}

/// Interface to the external room metadata and membership store
///
/// Implementations are expected to be cheap, time-bounded calls; failures
/// surface as `SyncError::Internal` and abort the single event being
/// processed.
#[allow(async_fn_in_trait)]
pub trait RoomDirectory: Send + Sync + 'static {
    /// Fetch a room's metadata by ID
    async fn room_by_id(&self, room_id: &RoomId) -> Result<Option<RoomRecord>>;

    /// Role of an active member of a room, or `None` if not a member
    async fn active_member(&self, room_id: &RoomId, user_id: &UserId) -> Result<Option<Role>>;

    /// Mark one membership record inactive
    async fn deactivate_membership(&self, room_id: &RoomId, user_id: &UserId) -> Result<()>;

    /// Mark a room inactive
    async fn deactivate_room(&self, room_id: &RoomId) -> Result<()>;
}
