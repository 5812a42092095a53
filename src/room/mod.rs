//! Room state store
//!
//! The authoritative, concurrently accessed table of per-room playback,
//! roster and chat state. Events are fanned out to room members over
//! `tokio::sync::broadcast`, one channel per room.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<RoomStore>
//!                  ┌────────────────────────────┐
//!                  │ rooms: HashMap<RoomId,     │
//!                  │   RoomRuntimeState {       │
//!                  │     clock, participants,   │
//!                  │     chat_history,          │
//!                  │     tx: broadcast::Tx,     │
//!                  │   }                        │
//!                  │ >                          │
//!                  └─────────────┬──────────────┘
//!                                │
//!         ┌──────────────────────┼──────────────────────┐
//!         │                      │                      │
//!         ▼                      ▼                      ▼
//!     [Owner]               [Member]               [Member]
//!  apply_playback_action()  event_rx.recv()        event_rx.recv()
//!         │                      │                      │
//!         └──► video_sync / new_message ──► transport ──► client
//! ```
//!
//! Chat and playback mutations send their broadcast while still holding the
//! room's write lock, so per-room delivery order matches acceptance order.

pub mod config;
pub mod error;
pub mod state;
pub mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use state::{ChatMessage, ParticipantInfo, PlaybackState, Role, RoomSnapshot};
pub use store::{RemovedParticipant, RoomStore};
