use std::sync::Arc;

use wschat_core::error::{Result, WsChatError};
use wschat_core::protocol::text::{ChatMessage, SystemNotice};

use crate::realtime::{ClientId, LeaveOutcome, RealtimeCore};

/// Room chat: join/leave notices and message fan-out.
pub struct ChatService {
    core: Arc<RealtimeCore>,
}

impl ChatService {
    pub fn new(core: Arc<RealtimeCore>) -> Self {
        Self { core }
    }

    /// Move the client into `room` and announce it to every member, joiner included.
    pub fn join(&self, client: ClientId, room: &str, username: &str) -> Result<()> {
        self.core.registry.join(client, room, username)?;
        tracing::info!(client = %client, room, username, "joined room");

        let notice = SystemNotice::joined(username).to_bytes()?;
        self.core.publish_room(room, &notice);
        Ok(())
    }

    /// Remove the client from `room`; the remaining members (if any) get a notice.
    pub fn leave(&self, client: ClientId, room: &str, username: &str) -> Result<()> {
        match self.core.registry.leave(client, room) {
            LeaveOutcome::Remaining => {
                tracing::info!(client = %client, room, username, "left room");
                let notice = SystemNotice::left(username).to_bytes()?;
                self.core.publish_room(room, &notice);
            }
            LeaveOutcome::RoomClosed => {
                tracing::info!(client = %client, room, username, "left room, room closed");
            }
            LeaveOutcome::NotMember => {
                tracing::debug!(client = %client, room, "leave for a room the client is not in");
            }
        }
        Ok(())
    }

    /// Fan a chat line out to every member of `room`, sender included.
    ///
    /// Only registered clients may post; an evicted client's late frames are dropped.
    pub fn message(
        &self,
        client: ClientId,
        room: &str,
        username: &str,
        message: &str,
    ) -> Result<()> {
        if !self.core.registry.contains(client) {
            return Err(WsChatError::UnknownClient(client.0));
        }
        let out = ChatMessage { username, message }.to_bytes()?;
        let delivery = self.core.publish_room(room, &out);
        tracing::debug!(client = %client, room, delivered = delivery.delivered, "chat message");
        Ok(())
    }

    /// Connection teardown: drop the client everywhere and tell its room.
    pub fn disconnect(&self, client: ClientId) -> Result<()> {
        if let Some(departed) = self.core.disconnect(client) {
            let notice = SystemNotice::left(&departed.username).to_bytes()?;
            self.core.publish_room(&departed.room, &notice);
        }
        Ok(())
    }
}
