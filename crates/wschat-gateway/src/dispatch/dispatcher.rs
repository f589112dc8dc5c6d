use std::sync::Arc;
use std::time::Instant;

use wschat_core::protocol::text::{Envelope, Inbound};

use crate::realtime::{ClientId, RealtimeCore};
use crate::services::ChatService;

/// Routes decoded chat envelopes to their handler.
///
/// The action set is closed, so routing is an exhaustive match rather than a
/// lookup table. Nothing here ever answers the client: bad input is logged
/// and dropped.
pub struct Dispatcher {
    chat: ChatService,
    core: Arc<RealtimeCore>,
}

impl Dispatcher {
    pub fn new(core: Arc<RealtimeCore>) -> Self {
        Self {
            chat: ChatService::new(Arc::clone(&core)),
            core,
        }
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    /// Parse and route one data frame payload.
    pub fn dispatch_payload(&self, client: ClientId, payload: &[u8]) {
        let metrics = self.core.metrics();

        let env = match Envelope::parse(payload) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(client = %client, error = %e, "discarding unparsable message");
                metrics.parse_errors.inc(&[]);
                return;
            }
        };

        let Some(msg) = Inbound::from_envelope(&env) else {
            let action = env.action().map(|a| a.as_str()).unwrap_or("unknown");
            tracing::debug!(
                client = %client,
                action = ?env.action_name(),
                "discarding invalid message"
            );
            metrics.dropped_messages.inc(&[("action", action)]);
            return;
        };

        self.dispatch(client, msg);
    }

    pub fn dispatch(&self, client: ClientId, msg: Inbound) {
        let started = Instant::now();
        let action = msg.action().as_str();

        let res = match msg {
            Inbound::Join { room, username } => self.chat.join(client, &room, &username),
            Inbound::Leave { room, username } => self.chat.leave(client, &room, &username),
            Inbound::Message {
                room,
                username,
                message,
            } => self.chat.message(client, &room, &username, &message),
        };

        let metrics = self.core.metrics();
        metrics.messages.inc(&[("action", action)]);
        metrics
            .dispatch_duration
            .observe(&[("action", action)], started.elapsed());

        if let Err(e) = res {
            tracing::debug!(
                client = %client,
                action,
                code = e.code(),
                error = %e,
                "handler dropped message"
            );
        }
    }
}
