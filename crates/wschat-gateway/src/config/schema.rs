use std::net::SocketAddr;

use serde::Deserialize;
use wschat_core::error::{Result, WsChatError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WsChatError::UnsupportedVersion);
        }

        self.gateway.validate()?;

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory served for every path other than `/ws`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Per-client outbound queue length; a full queue evicts the client.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Length of the process-wide broadcast queue.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: default_static_dir(),
            mailbox_capacity: default_mailbox_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1..=65536).contains(&self.mailbox_capacity) {
            return Err(WsChatError::BadRequest(
                "gateway.mailbox_capacity must be between 1 and 65536".into(),
            ));
        }
        if !(1..=65536).contains(&self.broadcast_capacity) {
            return Err(WsChatError::BadRequest(
                "gateway.broadcast_capacity must be between 1 and 65536".into(),
            ));
        }
        if !(125..=MAX_FRAME_BYTES_CEILING).contains(&self.max_frame_bytes) {
            return Err(WsChatError::BadRequest(
                "gateway.max_frame_bytes must be between 125 and 1073741824".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            WsChatError::BadRequest(format!("gateway.listen must be a valid SocketAddr: {e}"))
        })
    }
}

const MAX_FRAME_BYTES_CEILING: u64 = 1 << 30;

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_static_dir() -> String {
    "client".into()
}
fn default_mailbox_capacity() -> usize {
    256
}
fn default_broadcast_capacity() -> usize {
    1024
}
fn default_max_frame_bytes() -> u64 {
    16 * 1024 * 1024
}
