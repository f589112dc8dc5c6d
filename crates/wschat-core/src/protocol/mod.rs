//! Protocol modules.
//!
//! - `frame`: RFC 6455 frame decode/encode over byte buffers.
//! - `handshake`: the `Sec-WebSocket-Accept` token.
//! - `text`: the JSON chat envelope carried inside text frames, plus the
//!   outbound payload shapes.
//!
//! All parsers are panic-free: malformed input is reported as `WsChatError`
//! instead of panicking or indexing raw buffers out of bounds.

pub mod frame;
pub mod handshake;
pub mod text;
