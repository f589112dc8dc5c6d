//! Upgrade handshake token.

use base64::{engine::general_purpose, Engine as _};
use sha1::{Digest, Sha1};

/// Fixed GUID appended to the client key (RFC 6455 section 1.3).
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// `base64(sha1(key + GUID))`, the value of `Sec-WebSocket-Accept`.
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    general_purpose::STANDARD.encode(hasher.finalize())
}
