//! Shared error type across wsChat crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, WsChatError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum WsChatError {
    /// Upgrade request could not be turned into a WebSocket connection.
    #[error("handshake failed: {0}")]
    Handshake(String),
    /// Frame shape the engine does not speak (fragmentation).
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(String),
    /// Declared payload length is not representable or exceeds the limit.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(u64),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Client id is not (or no longer) registered.
    #[error("unknown client: {0}")]
    UnknownClient(u64),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl WsChatError {
    /// Stable code used in logs, metric labels and tests.
    pub fn code(&self) -> &'static str {
        match self {
            WsChatError::Handshake(_) => "HANDSHAKE",
            WsChatError::UnsupportedFrame(_) => "UNSUPPORTED_FRAME",
            WsChatError::FrameTooLarge(_) => "FRAME_TOO_LARGE",
            WsChatError::Io(_) => "IO",
            WsChatError::BadRequest(_) => "BAD_REQUEST",
            WsChatError::UnknownClient(_) => "UNKNOWN_CLIENT",
            WsChatError::UnsupportedVersion => "UNSUPPORTED_VERSION",
            WsChatError::Internal(_) => "INTERNAL",
        }
    }
}
