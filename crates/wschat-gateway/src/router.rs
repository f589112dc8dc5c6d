//! Axum router wiring.
//!
//! `/ws` is the upgrade endpoint, `/healthz` and `/metrics` are operational,
//! and everything else falls through to the static client directory.

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use wschat_core::error::Result;

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.cfg().gateway.static_dir);

    Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .fallback_service(static_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
