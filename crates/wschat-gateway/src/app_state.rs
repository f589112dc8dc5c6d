//! Shared application state for the chat gateway.
//!
//! Wires the room registry, dispatcher, global broadcaster and metrics
//! together. Construction spawns the broadcast drainer, so it must run inside
//! a tokio runtime.

use std::sync::Arc;

use wschat_core::error::Result;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::obs::GatewayMetrics;
use crate::realtime::{Broadcaster, RealtimeCore};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<GatewayConfig>,
    realtime: Arc<RealtimeCore>,
    dispatcher: Arc<Dispatcher>,
    broadcaster: Broadcaster,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(GatewayMetrics::default());
        let realtime = Arc::new(RealtimeCore::new(Arc::clone(&metrics)));
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&realtime)));

        let (broadcaster, _drainer) =
            Broadcaster::spawn(Arc::clone(&realtime), cfg.gateway.broadcast_capacity);

        Ok(Self {
            cfg: Arc::new(cfg),
            realtime,
            dispatcher,
            broadcaster,
            metrics,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.cfg
    }

    pub fn realtime(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.realtime)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Process-wide broadcast queue (reaches every client, any room).
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Gauges computed at scrape time from the registry.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let registry = &self.realtime.registry;
        vec![
            ("wschat_clients", registry.client_count() as u64),
            ("wschat_rooms", registry.room_count() as u64),
        ]
    }
}
