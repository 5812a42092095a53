//! # roomsync
//!
//! Synchronization core for shared watch-together rooms: one owner drives
//! playback of an external video stream and every other participant's
//! player follows, with a participant roster and a bounded chat history
//! per room.
//!
//! This crate is transport-agnostic. A WebSocket (or any other) layer
//! authenticates the connection, decodes frames into
//! [`events::InboundEvent`] values and drives the [`dispatch::Dispatcher`];
//! room metadata and membership records live behind the
//! [`dispatch::RoomDirectory`] trait.
//!
//! # Architecture
//!
//! ```text
//!   client frame ──► transport ──► Dispatcher::dispatch(session, event, now)
//!                                      │
//!                     ┌────────────────┼───────────────────┐
//!                     ▼                ▼                   ▼
//!              RoomDirectory    PresenceRegistry       RoomStore
//!              (external       (UserId → RoomId)   (per-room clock,
//!               metadata &                          roster, chat,
//!               membership)                         broadcast::Tx)
//!                                                       │
//!                                      per-room fan-out ─┴─► every member
//! ```
//!
//! The store serializes all mutation of one room behind that room's write
//! lock; chat and playback mutations broadcast while still holding it, so
//! members observe them in acceptance order. While a room is playing, the
//! stored position is an anchor: the true position is always re-derived
//! through [`clock::PlaybackClock`].
//!
//! ```
//! use roomsync::clock::PlaybackClock;
//!
//! let mut clock = PlaybackClock::new(1000.0);
//! clock.seek(100.0, 1000.0);
//! clock.play(1000.0);
//! assert_eq!(clock.effective_time(1005.0), 105.0);
//! ```

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod ids;
pub mod presence;
pub mod room;

pub use clock::{unix_now, PlaybackAction, PlaybackClock};
pub use dispatch::{
    AuthIdentity, ClientSession, DispatchOutcome, Dispatcher, JoinedRoom, RoomDirectory,
    RoomRecord, SessionPhase,
};
pub use error::{Result, SyncError};
pub use events::{InboundEvent, OutboundEvent, VideoActionKind};
pub use ids::{RoomId, UserId};
pub use presence::PresenceRegistry;
pub use room::{
    ChatMessage, ParticipantInfo, PlaybackState, Role, RoomSnapshot, RoomStore, StoreConfig,
    StoreError,
};
