//! Event dispatching
//!
//! The dispatcher is the crate's root abstraction: a transport decodes a
//! client frame into an [`InboundEvent`](crate::events::InboundEvent) and
//! hands it to [`Dispatcher::dispatch`] together with the connection's
//! [`ClientSession`]. The dispatcher consults the external
//! [`RoomDirectory`] for metadata and membership, mutates the room store
//! and presence registry, and broadcasts the results.

pub mod directory;
pub mod dispatcher;
pub mod session;

pub use directory::{RoomDirectory, RoomRecord};
pub use dispatcher::{DispatchOutcome, Dispatcher, JoinedRoom};
pub use session::{AuthIdentity, ClientSession, SessionPhase};
