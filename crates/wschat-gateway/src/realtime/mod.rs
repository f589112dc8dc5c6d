//! Realtime runtime (membership + egress engine) for the chat gateway.
//!
//! `RoomRegistry` owns every client's mailbox and room membership behind one
//! lock; `RealtimeCore` wraps it with logging and metrics; `Broadcaster` feeds
//! the process-wide fan-out queue.

pub mod core;
pub mod types;

pub use self::core::{Broadcaster, RealtimeCore, RoomRegistry};
pub use types::{ClientId, Delivery, Departed, LeaveOutcome, Mailbox};
