use std::sync::Arc;

use bytes::Bytes;

use crate::obs::GatewayMetrics;
use crate::realtime::core::RoomRegistry;
use crate::realtime::types::{ClientId, Delivery, Departed, Mailbox};

/// RealtimeCore: egress engine (room publish / global broadcast) on top of
/// the registry, reporting evictions to logs and metrics.
pub struct RealtimeCore {
    pub registry: Arc<RoomRegistry>,
    metrics: Arc<GatewayMetrics>,
}

impl RealtimeCore {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
            metrics,
        }
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    pub fn connect(&self, mailbox: Mailbox) -> ClientId {
        let id = self.registry.register(mailbox);
        self.metrics.connections_total.inc(&[]);
        self.metrics.connections_active.inc(&[]);
        id
    }

    pub fn disconnect(&self, id: ClientId) -> Option<Departed> {
        self.metrics.connections_active.dec(&[]);
        self.registry.disconnect(id)
    }

    pub fn publish_room(&self, room: &str, payload: &Bytes) -> Delivery {
        let delivery = self.registry.publish_room(room, payload);
        self.note_evictions(&delivery, "room");
        delivery
    }

    pub fn broadcast_all(&self, payload: &Bytes) -> Delivery {
        let delivery = self.registry.broadcast_all(payload);
        self.note_evictions(&delivery, "global");
        delivery
    }

    fn note_evictions(&self, delivery: &Delivery, path: &str) {
        for id in &delivery.evicted {
            tracing::warn!(client = %id, path, "mailbox full, client evicted");
        }
        if !delivery.evicted.is_empty() {
            self.metrics
                .evictions
                .add(&[("path", path)], delivery.evicted.len() as u64);
        }
    }
}
