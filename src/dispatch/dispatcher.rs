//! Event dispatcher
//!
//! The state machine that applies inbound client events to the room store
//! and presence registry, enforcing authentication, membership and
//! ownership, and broadcasting the results to every connection in the room.
//!
//! The dispatcher holds no per-connection state itself; the transport owns
//! one `ClientSession` per connection and passes it to every call, together
//! with the wall-clock instant the event was accepted.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::clock::PlaybackAction;
use crate::error::{Result, SyncError};
use crate::events::{InboundEvent, OutboundEvent, VideoActionKind};
use crate::ids::{RoomId, UserId};
use crate::presence::PresenceRegistry;
use crate::room::{ChatMessage, ParticipantInfo, RoomStore};

use super::directory::{RoomDirectory, RoomRecord};
use super::session::{AuthIdentity, ClientSession, SessionPhase};

/// Result of a successful `join_room`
pub struct JoinedRoom {
    /// Receiver for everything broadcast to the room from now on
    pub subscription: broadcast::Receiver<OutboundEvent>,
    /// Private `room_state` snapshot for the joining connection only
    pub state: OutboundEvent,
}

/// Result of a successfully dispatched event
pub enum DispatchOutcome {
    /// Handled; anything to deliver was broadcast to the room
    Done,
    /// The connection joined a room
    Joined(JoinedRoom),
}

/// Event dispatcher over a room store, presence registry and directory
pub struct Dispatcher<D: RoomDirectory> {
    directory: Arc<D>,
    store: Arc<RoomStore>,
    presence: Arc<PresenceRegistry>,
}

impl<D: RoomDirectory> Dispatcher<D> {
    /// Create a dispatcher
    pub fn new(directory: Arc<D>, store: Arc<RoomStore>, presence: Arc<PresenceRegistry>) -> Self {
        Self {
            directory,
            store,
            presence,
        }
    }

    /// The room state store
    pub fn store(&self) -> &Arc<RoomStore> {
        &self.store
    }

    /// The presence registry
    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    /// Accept a new connection
    ///
    /// A connection without an authenticated identity is refused: the
    /// transport should close it on `Unauthenticated`. On success the
    /// returned ack is delivered to the connection.
    pub fn connect(&self, identity: Option<AuthIdentity>) -> Result<(ClientSession, OutboundEvent)> {
        let identity = identity.ok_or(SyncError::Unauthenticated)?;

        tracing::info!(user = %identity.user_id, username = %identity.username, "User connected");

        let ack = OutboundEvent::connected(identity.user_id.clone(), &identity.username);
        Ok((ClientSession::connected(identity), ack))
    }

    /// Apply one inbound event
    ///
    /// Every error is terminal for this event only and should be surfaced
    /// to the initiating connection as an `error` event, never broadcast.
    pub async fn dispatch(
        &self,
        session: &mut ClientSession,
        event: InboundEvent,
        now: f64,
    ) -> Result<DispatchOutcome> {
        if *session.phase() == SessionPhase::Disconnected {
            return Err(SyncError::SessionClosed);
        }

        match event {
            InboundEvent::JoinRoom { room_id } => self
                .join_room(session, &room_id, now)
                .await
                .map(DispatchOutcome::Joined),
            InboundEvent::LeaveRoom { room_id } => {
                self.leave_room(session, &room_id).await;
                Ok(DispatchOutcome::Done)
            }
            InboundEvent::VideoAction {
                room_id,
                action,
                time,
            } => {
                self.video_action(session, &room_id, action, time, now)
                    .await?;
                Ok(DispatchOutcome::Done)
            }
            InboundEvent::ChatMessage { room_id, message } => {
                self.chat_message(session, &room_id, &message, now).await?;
                Ok(DispatchOutcome::Done)
            }
            InboundEvent::KickUser { room_id, user_id } => {
                self.kick_user(session, &room_id, &user_id).await?;
                Ok(DispatchOutcome::Done)
            }
            InboundEvent::DeleteRoom { room_id } => {
                self.delete_room(session, &room_id, now).await?;
                Ok(DispatchOutcome::Done)
            }
        }
    }

    /// Join a room, leaving any previously joined room first
    pub async fn join_room(
        &self,
        session: &mut ClientSession,
        room_id: &RoomId,
        now: f64,
    ) -> Result<JoinedRoom> {
        let user_id = session.user_id().clone();

        let record = self.lookup_room(room_id).await?;
        let role = self
            .directory
            .active_member(room_id, &user_id)
            .await?
            .ok_or_else(|| SyncError::NotAMember(room_id.clone()))?;

        // Atomically swap the binding; run the leave sequence on any
        // previous room without touching the new binding.
        if let Some(previous) = self.presence.bind(&user_id, room_id).await {
            self.remove_and_notify(&previous, &user_id).await;
        }

        self.store
            .ensure_room(room_id, &record.stream_url, now)
            .await;

        // Subscribe before announcing so the joiner sees its own user_joined
        let subscription = self.store.subscribe(room_id).await?;

        let count = self
            .store
            .add_participant(
                room_id,
                &user_id,
                ParticipantInfo {
                    username: session.username().to_string(),
                    role,
                    joined_at: now,
                },
            )
            .await?;

        self.store
            .broadcast(
                room_id,
                OutboundEvent::UserJoined {
                    user_id: user_id.clone(),
                    username: session.username().to_string(),
                    role,
                    participants_count: count,
                },
            )
            .await;

        let snapshot = self
            .store
            .snapshot(room_id, now)
            .await
            .ok_or_else(|| SyncError::Internal("room state vanished during join".into()))?;

        session.enter_room(room_id.clone());

        tracing::info!(room = %room_id, user = %user_id, role = ?role, "User joined room");

        Ok(JoinedRoom {
            subscription,
            state: OutboundEvent::RoomState {
                video_url: snapshot.video_url,
                current_time: snapshot.current_time,
                is_playing: snapshot.is_playing,
                participants: snapshot.participants,
                chat_messages: snapshot.chat_messages,
                user_role: role,
                room_owner_id: record.owner_id,
                timestamp: now,
            },
        })
    }

    /// Leave a room explicitly
    ///
    /// Acts only when the user's binding actually points at the targeted
    /// room; a leave naming some other room changes nothing, so the roster
    /// of the room the user really occupies stays intact.
    pub async fn leave_room(&self, session: &mut ClientSession, room_id: &RoomId) {
        let user_id = session.user_id().clone();

        if !self.presence.unbind_from(&user_id, room_id).await {
            tracing::debug!(room = %room_id, user = %user_id, "Leave ignored: not bound to room");
            return;
        }

        self.remove_and_notify(room_id, &user_id).await;
        session.leave_room();

        tracing::info!(room = %room_id, user = %user_id, "User left room");
    }

    /// Handle an abrupt disconnect
    ///
    /// Identical to an explicit leave of whatever room the user occupied;
    /// cleanup runs to completion even though no client awaits the result.
    pub async fn disconnect(&self, session: &mut ClientSession) {
        let user_id = session.user_id().clone();

        if let Some(room_id) = self.presence.unbind(&user_id).await {
            self.remove_and_notify(&room_id, &user_id).await;
        }
        session.disconnect();

        tracing::info!(user = %user_id, "User disconnected");
    }

    /// Apply an owner's playback control and broadcast the sync event
    pub async fn video_action(
        &self,
        session: &ClientSession,
        room_id: &RoomId,
        action: VideoActionKind,
        time: Option<f64>,
        now: f64,
    ) -> Result<()> {
        let user_id = session.user_id();

        self.require_in_room(user_id, room_id).await?;

        let record = self.lookup_room(room_id).await?;
        if record.owner_id != *user_id {
            return Err(SyncError::NotOwner(room_id.clone()));
        }

        let action = match action {
            VideoActionKind::Play => PlaybackAction::Play,
            VideoActionKind::Pause => PlaybackAction::Pause,
            VideoActionKind::Seek => {
                let target =
                    time.ok_or_else(|| SyncError::Validation("Seek requires a target time".into()))?;
                PlaybackAction::Seek(target)
            }
        };

        self.store.apply_playback_action(room_id, action, now).await?;
        Ok(())
    }

    /// Record and broadcast a chat message
    pub async fn chat_message(
        &self,
        session: &ClientSession,
        room_id: &RoomId,
        text: &str,
        now: f64,
    ) -> Result<()> {
        let user_id = session.user_id();

        self.require_in_room(user_id, room_id).await?;

        let msg = ChatMessage::new(
            user_id.clone(),
            session.username(),
            text,
            now,
            self.store.config().max_message_len,
        )?;

        self.store.record_chat(room_id, msg).await?;

        tracing::debug!(room = %room_id, user = %user_id, "Chat message recorded");
        Ok(())
    }

    /// Remove another user from the room (owner only)
    ///
    /// The target's membership record is marked inactive and their registry
    /// binding is cleared; their connection stays open.
    pub async fn kick_user(
        &self,
        session: &ClientSession,
        room_id: &RoomId,
        target: &UserId,
    ) -> Result<()> {
        let user_id = session.user_id();

        let record = self.lookup_room(room_id).await?;
        if record.owner_id != *user_id {
            return Err(SyncError::NotOwner(room_id.clone()));
        }
        if target == user_id {
            return Err(SyncError::SelfKick);
        }

        self.directory.deactivate_membership(room_id, target).await?;

        if let Some(removed) = self.store.remove_participant(room_id, target).await {
            // The target still holds its subscription, so it receives this
            self.store
                .broadcast(
                    room_id,
                    OutboundEvent::UserKicked {
                        user_id: target.clone(),
                        username: removed.username.clone(),
                        message: format!("{} was removed from the room", removed.username),
                    },
                )
                .await;

            self.presence.unbind(target).await;
        }

        tracing::info!(room = %room_id, user = %target, by = %user_id, "User kicked");
        Ok(())
    }

    /// Delete a room (owner only)
    ///
    /// Deactivates the room and its current members' records, notifies the
    /// room, drops its runtime state and clears every member's binding.
    pub async fn delete_room(
        &self,
        session: &mut ClientSession,
        room_id: &RoomId,
        now: f64,
    ) -> Result<()> {
        let user_id = session.user_id().clone();

        let record = self.lookup_room(room_id).await?;
        if record.owner_id != user_id {
            return Err(SyncError::NotOwner(room_id.clone()));
        }

        // Best effort: one failed record must not strand a half-deleted
        // room, so the runtime teardown below always runs.
        if let Some(snapshot) = self.store.snapshot(room_id, now).await {
            for member in snapshot.participants.keys() {
                if let Err(err) = self.directory.deactivate_membership(room_id, member).await {
                    tracing::warn!(
                        room = %room_id,
                        user = %member,
                        error = %err,
                        "Failed to deactivate membership"
                    );
                }
            }
        }
        if let Err(err) = self.directory.deactivate_room(room_id).await {
            tracing::warn!(room = %room_id, error = %err, "Failed to deactivate room record");
        }

        self.store
            .broadcast(
                room_id,
                OutboundEvent::RoomDeleted {
                    message: "The room was closed by its owner".into(),
                    redirect: "/dashboard".into(),
                },
            )
            .await;

        self.store.delete_room(room_id).await;
        self.presence.unbind_room(room_id).await;

        if session.room() == Some(room_id) {
            session.leave_room();
        }

        tracing::info!(room = %room_id, by = %user_id, "Room deleted");
        Ok(())
    }

    /// Resolve a room that exists and is active
    async fn lookup_room(&self, room_id: &RoomId) -> Result<RoomRecord> {
        match self.directory.room_by_id(room_id).await? {
            Some(record) if record.is_active => Ok(record),
            _ => Err(SyncError::RoomNotFound(room_id.clone())),
        }
    }

    /// Require the user's registry binding to match the targeted room
    async fn require_in_room(&self, user_id: &UserId, room_id: &RoomId) -> Result<()> {
        match self.presence.lookup(user_id).await {
            Some(bound) if bound == *room_id => Ok(()),
            _ => Err(SyncError::NotInRoom(room_id.clone())),
        }
    }

    /// Remove a participant and broadcast `user_left` to whoever remains
    async fn remove_and_notify(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        if let Some(removed) = self.store.remove_participant(room_id, user_id).await {
            self.store
                .broadcast(
                    room_id,
                    OutboundEvent::UserLeft {
                        user_id: user_id.clone(),
                        username: removed.username,
                        participants_count: removed.remaining,
                    },
                )
                .await;
            true
        } else {
            false
        }
    }
}
