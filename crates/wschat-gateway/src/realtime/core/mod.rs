//! Realtime core components for the gateway runtime.
//!
//! Room registry, the egress wrapper shared by services, and the global
//! broadcast drainer.

mod broadcast;
mod realtime;
mod registry;

pub use broadcast::Broadcaster;
pub use realtime::RealtimeCore;
pub use registry::{RegistrySnapshot, RoomRegistry};
