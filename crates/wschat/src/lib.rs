//! Top-level facade crate for wsChat.
//!
//! Re-exports the protocol core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use wschat_core::*;
}

pub mod gateway {
    pub use wschat_gateway::*;
}
