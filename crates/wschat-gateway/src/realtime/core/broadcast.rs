use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use wschat_core::error::{Result, WsChatError};

use crate::realtime::core::RealtimeCore;

/// Handle to the process-wide broadcast queue.
///
/// One dedicated task drains the queue and fans every payload out to all
/// connected clients, irrespective of room membership.
#[derive(Clone)]
pub struct Broadcaster {
    tx: mpsc::Sender<Bytes>,
}

impl Broadcaster {
    /// Create the queue and spawn its drainer. Requires a tokio runtime.
    pub fn spawn(core: Arc<RealtimeCore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(drain(core, rx));
        (Self { tx }, handle)
    }

    /// Queue a payload, waiting for space if the queue is full.
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        self.tx
            .send(payload)
            .await
            .map_err(|_| WsChatError::Internal("broadcast queue closed".into()))
    }

    /// Queue a payload without waiting.
    pub fn try_send(&self, payload: Bytes) -> Result<()> {
        self.tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                WsChatError::Internal("broadcast queue full".into())
            }
            mpsc::error::TrySendError::Closed(_) => {
                WsChatError::Internal("broadcast queue closed".into())
            }
        })
    }
}

async fn drain(core: Arc<RealtimeCore>, mut rx: mpsc::Receiver<Bytes>) {
    while let Some(payload) = rx.recv().await {
        let delivery = core.broadcast_all(&payload);
        tracing::debug!(delivered = delivery.delivered, "global broadcast");
    }
    tracing::debug!("broadcast queue closed, drainer exiting");
}
