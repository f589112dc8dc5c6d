//! HTTP -> WebSocket upgrade negotiation.
//!
//! The 101 response is produced here and written by hyper; the raw stream is
//! then taken over through hyper's `OnUpgrade` handle, which `axum::serve`
//! installs on every request it accepts.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Response, StatusCode};
use hyper::upgrade::{OnUpgrade, Upgraded};
use hyper_util::rt::TokioIo;

use wschat_core::error::{Result, WsChatError};
use wschat_core::protocol::handshake::accept_key;

/// A validated upgrade: the response to send plus the takeover handle.
pub struct Negotiated {
    pub response: Response<Body>,
    pub on_upgrade: OnUpgrade,
}

/// Why an upgrade request was answered with 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingKey,
    InvalidKey,
    TakeoverUnsupported,
    Internal,
}

impl RejectReason {
    /// Label value for `wschat_handshake_failures_total{reason}`.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::MissingKey => "missing_key",
            RejectReason::InvalidKey => "invalid_key",
            RejectReason::TakeoverUnsupported => "takeover_unsupported",
            RejectReason::Internal => "internal",
        }
    }
}

#[derive(Debug)]
pub struct Rejected {
    pub reason: RejectReason,
    pub error: WsChatError,
}

impl Rejected {
    fn new(reason: RejectReason, msg: &str) -> Self {
        Self {
            reason,
            error: WsChatError::Handshake(msg.into()),
        }
    }
}

/// Build the `101 Switching Protocols` response for a client key.
pub fn accept_response(key: &str) -> Result<Response<Body>> {
    Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(header::UPGRADE, "websocket")
        .header(header::CONNECTION, "Upgrade")
        .header(header::SEC_WEBSOCKET_ACCEPT, accept_key(key))
        .body(Body::empty())
        .map_err(|e| WsChatError::Internal(format!("build upgrade response: {e}")))
}

fn websocket_key(headers: &HeaderMap) -> std::result::Result<&str, Rejected> {
    headers
        .get(header::SEC_WEBSOCKET_KEY)
        .ok_or_else(|| Rejected::new(RejectReason::MissingKey, "missing Sec-WebSocket-Key"))?
        .to_str()
        .map_err(|_| {
            Rejected::new(
                RejectReason::InvalidKey,
                "Sec-WebSocket-Key is not valid ASCII",
            )
        })
}

/// Validate the request and claim its takeover handle.
///
/// hyper only attaches the takeover handle to requests that carry an
/// `Upgrade` header, so a plain GET is rejected here.
pub fn negotiate<B>(req: &mut Request<B>) -> std::result::Result<Negotiated, Rejected> {
    let key = websocket_key(req.headers())?;
    let response = accept_response(key).map_err(|error| Rejected {
        reason: RejectReason::Internal,
        error,
    })?;
    let on_upgrade = req.extensions_mut().remove::<OnUpgrade>().ok_or_else(|| {
        Rejected::new(
            RejectReason::TakeoverUnsupported,
            "connection takeover unsupported",
        )
    })?;
    Ok(Negotiated {
        response,
        on_upgrade,
    })
}

/// Resolve once hyper has flushed the 101 and released the connection.
pub async fn take_over(on_upgrade: OnUpgrade) -> Result<TokioIo<Upgraded>> {
    let upgraded = on_upgrade
        .await
        .map_err(|e| WsChatError::Handshake(format!("connection takeover failed: {e}")))?;
    Ok(TokioIo::new(upgraded))
}
