//! wsChat core: transport-agnostic protocol primitives and the shared error type.
//!
//! This crate defines the wire-level contracts used by the gateway: the
//! WebSocket frame codec, the upgrade accept token, and the chat message
//! envelope. It carries no runtime or socket dependencies, so every parser in
//! here works on plain byte buffers and can be unit tested or fuzzed directly.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `WsChatError`/`Result` so a malformed
//! frame from one peer never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, WsChatError};
