//! wsChat gateway library entry.
//!
//! Wires the hand-rolled WebSocket transport, the dispatcher, the room
//! registry and the chat service into one server. Consumed by the binary
//! (`main.rs`) and by the integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod services;
pub mod transport;
