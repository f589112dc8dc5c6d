//! wsChat gateway binary.
//!
//! - `GET /ws`: WebSocket upgrade, room chat over JSON text frames
//! - every other path: static files from `gateway.static_dir`
//!
//! Usage: `wschat-gateway [config.yaml]` (defaults to `wschat.yaml`; built-in
//! defaults apply when that file does not exist).

use std::path::Path;

use tracing_subscriber::{fmt, EnvFilter};

use wschat_core::error::Result;
use wschat_gateway::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "wschat.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = if Path::new(&path).exists() {
        config::load_from_file(&path)?
    } else {
        tracing::warn!(%path, "config file not found, using defaults");
        config::GatewayConfig::default()
    };
    let listen = cfg.gateway.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;

    tracing::info!(%listen, "wschat-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    router::serve(listener, state).await
}
