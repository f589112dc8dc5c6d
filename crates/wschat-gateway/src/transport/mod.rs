//! Transport layer (hand-rolled WebSocket).
//!
//! `upgrade` turns an HTTP request into a raw duplex stream, `codec` frames
//! that stream with the core frame codec, and `ws` runs the per-client
//! reader/writer pumps.

pub mod codec;
pub mod upgrade;
pub mod ws;
