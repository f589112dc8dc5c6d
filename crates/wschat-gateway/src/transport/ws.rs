//! WebSocket endpoint and per-client connection pumps.
//!
//! Responsibilities:
//! - Negotiate the upgrade and take over the raw stream
//! - Register the client with a bounded mailbox
//! - Reader pump (this task): decode frames, hand data payloads to the dispatcher
//! - Writer pump (spawned): drain the mailbox as text frames
//! - Teardown when the reader stops: deregister, announce, close the stream
//!
//! There is no read timeout and no ping/pong; closing the stream is the only
//! way a session ends.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::Instrument;

use crate::app_state::AppState;
use crate::realtime::ClientId;
use crate::transport::codec::WsFrameCodec;
use crate::transport::upgrade::{self, Negotiated, Rejected};

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, mut req: Request) -> Response {
    let Negotiated {
        response,
        on_upgrade,
    } = match upgrade::negotiate(&mut req) {
        Ok(n) => n,
        Err(Rejected { reason, error }) => {
            let reason = reason.as_str();
            tracing::warn!(
                reason,
                code = error.code(),
                error = %error,
                "websocket upgrade rejected"
            );
            app.metrics()
                .handshake_failures
                .inc(&[("reason", reason)]);
            return (StatusCode::BAD_REQUEST, error.to_string()).into_response();
        }
    };

    tokio::spawn(async move {
        match upgrade::take_over(on_upgrade).await {
            Ok(stream) => run_session(app, stream).await,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "websocket takeover failed");
                app.metrics()
                    .handshake_failures
                    .inc(&[("reason", "takeover_failed")]);
            }
        }
    });

    response
}

// --------------------
// Session
// --------------------

/// Run one client over an already-upgraded stream until its reader stops.
pub async fn run_session<S>(app: AppState, stream: S)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let gw = &app.cfg().gateway;
    let codec = WsFrameCodec::new(gw.max_frame_bytes);
    let (mailbox, outbox) = mpsc::channel::<Bytes>(gw.mailbox_capacity);

    let client = app.realtime().connect(mailbox);
    let span = tracing::info_span!("session", client = %client);

    async move {
        tracing::info!("client connected");

        let (rd, wr) = tokio::io::split(stream);
        let writer =
            tokio::spawn(write_pump(FramedWrite::new(wr, codec), outbox).in_current_span());

        read_pump(&app, client, FramedRead::new(rd, codec)).await;

        // Deregistering drops the only mailbox sender; aborting the writer
        // releases the write half so the stream actually closes.
        if let Err(e) = app.dispatcher().chat().disconnect(client) {
            tracing::debug!(error = %e, "leave notice not sent");
        }
        writer.abort();
        let _ = writer.await;

        tracing::info!("client disconnected");
    }
    .instrument(span)
    .await
}

async fn read_pump<R>(app: &AppState, client: ClientId, mut frames: FramedRead<R, WsFrameCodec>)
where
    R: AsyncRead + Unpin,
{
    let dispatcher = app.dispatcher();
    let metrics = app.metrics();
    let realtime = app.realtime();

    while let Some(next) = frames.next().await {
        let frame = match next {
            Ok(frame) => frame,
            Err(e) => {
                tracing::info!(code = e.code(), error = %e, "frame decode failed, closing");
                metrics.decode_errors.inc(&[("code", e.code())]);
                return;
            }
        };
        metrics.frames_in.inc(&[]);

        // Eviction already removed the client; stop reading so teardown closes the stream.
        if !realtime.registry.contains(client) {
            tracing::info!("client was evicted, closing");
            return;
        }

        if !frame.is_data() {
            tracing::debug!(opcode = frame.opcode, "ignoring non-data frame");
            continue;
        }
        dispatcher.dispatch_payload(client, &frame.payload);
    }

    tracing::debug!("peer closed the stream");
}

async fn write_pump<W>(mut frames: FramedWrite<W, WsFrameCodec>, mut outbox: mpsc::Receiver<Bytes>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(payload) = outbox.recv().await {
        // `send` flushes after every frame.
        if let Err(e) = frames.send(payload).await {
            tracing::debug!(error = %e, "write failed, writer stopping");
            return;
        }
    }

    // Mailbox closed: the client was torn down or evicted.
    let _ = frames.get_mut().shutdown().await;
}
