use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc;

/// Process-unique connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sending side of a client's bounded outbound queue.
/// The registry holds the only sender; dropping it closes the mailbox.
pub type Mailbox = mpsc::Sender<Bytes>;

/// Result of one fan-out pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Mailboxes that accepted the payload.
    pub delivered: usize,
    /// Mailboxes already closed by a dead writer (skipped).
    pub closed: usize,
    /// Clients whose mailbox was full; they are gone from the registry.
    pub evicted: Vec<ClientId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Client is unknown or not in that room; nothing changed.
    NotMember,
    /// Client was the last member; the room is gone.
    RoomClosed,
    /// Other members remain.
    Remaining,
}

/// What a torn-down client leaves behind when its room still has members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departed {
    pub room: String,
    pub username: String,
}
