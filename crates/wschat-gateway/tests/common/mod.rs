//! Raw WebSocket client used by the session and end-to-end tests.
//!
//! Plays the browser side by hand: masked frames out, unmasked frames in,
//! decoded with the same core codec the server uses.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use wschat_core::protocol::frame::{decode_frame, encode_client_frame, Frame, OPCODE_TEXT};
use wschat_core::protocol::handshake::accept_key;
use wschat_gateway::app_state::AppState;
use wschat_gateway::config::{GatewayConfig, GatewaySection};
use wschat_gateway::router;

pub const WAIT: Duration = Duration::from_secs(3);
const MASK: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];

pub fn config(mailbox_capacity: usize) -> GatewayConfig {
    GatewayConfig {
        version: 1,
        gateway: GatewaySection {
            mailbox_capacity,
            ..GatewaySection::default()
        },
    }
}

pub struct RawClient<S> {
    stream: S,
    buf: BytesMut,
}

impl<S> RawClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: BytesMut::new(),
        }
    }

    pub async fn send_json(&mut self, v: Value) {
        self.send_text(v.to_string().as_bytes()).await;
    }

    pub async fn send_text(&mut self, payload: &[u8]) {
        let mut out = BytesMut::new();
        encode_client_frame(OPCODE_TEXT, payload, MASK, &mut out);
        self.send_raw(&out).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
        self.stream.flush().await.unwrap();
    }

    async fn read_frame(&mut self) -> Option<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, u64::MAX).unwrap() {
                return Some(frame);
            }
            match self.stream.read_buf(&mut self.buf).await {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }
        }
    }

    pub async fn recv_json(&mut self) -> Value {
        let frame = timeout(WAIT, self.read_frame())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream closed while waiting for a frame");
        assert_eq!(frame.opcode, OPCODE_TEXT);
        assert!(!frame.masked, "server frames are never masked");
        serde_json::from_slice(&frame.payload).unwrap()
    }

    /// Nothing arrives within a short window.
    pub async fn expect_silence(&mut self) {
        let got = timeout(Duration::from_millis(150), self.read_frame()).await;
        assert!(got.is_err(), "unexpected frame: {got:?}");
    }

    /// The server closed its side of the stream.
    pub async fn expect_closed(&mut self) {
        let got = timeout(WAIT, self.read_frame())
            .await
            .expect("timed out waiting for close");
        assert!(got.is_none(), "expected close, got {got:?}");
    }
}

pub fn join(room: &str, username: &str) -> Value {
    serde_json::json!({"action": "join", "room": room, "username": username})
}

pub fn leave(room: &str, username: &str) -> Value {
    serde_json::json!({"action": "leave", "room": room, "username": username})
}

pub fn message(room: &str, username: &str, text: &str) -> Value {
    serde_json::json!({"action": "message", "room": room, "username": username, "message": text})
}

pub fn joined_notice(username: &str) -> Value {
    serde_json::json!({"username": "Server", "type": "join", "message": format!("{username} joined the room")})
}

pub fn left_notice(username: &str) -> Value {
    serde_json::json!({"username": "Server", "type": "leave", "message": format!("{username} left the room")})
}

/// Poll `cond` until it holds or the wait budget runs out.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "condition never held");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Start a full HTTP server on an ephemeral port.
pub async fn start_server(cfg: GatewayConfig) -> (SocketAddr, AppState) {
    let state = AppState::new(cfg).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(router::serve(listener, state.clone()));
    (addr, state)
}

pub const SAMPLE_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

/// Send a raw HTTP request and return the response head plus any bytes after it.
pub async fn http_request(stream: &mut TcpStream, request: &str) -> (String, BytesMut) {
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = BytesMut::new();
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8(buf.split_to(end + 4).to_vec()).unwrap();
            return (head, buf);
        }
        let n = timeout(WAIT, stream.read_buf(&mut buf))
            .await
            .expect("timed out reading response")
            .unwrap();
        assert!(n > 0, "connection closed before response head");
    }
}

pub fn upgrade_request(key: Option<&str>) -> String {
    let mut req = String::from(
        "GET /ws HTTP/1.1\r\nHost: localhost\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Version: 13\r\n",
    );
    if let Some(key) = key {
        req.push_str(&format!("Sec-WebSocket-Key: {key}\r\n"));
    }
    req.push_str("\r\n");
    req
}

/// Connect and complete the upgrade handshake.
pub async fn connect(addr: SocketAddr) -> RawClient<TcpStream> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (head, rest) = http_request(&mut stream, &upgrade_request(Some(SAMPLE_KEY))).await;

    assert!(head.starts_with("HTTP/1.1 101"), "{head}");
    let lower = head.to_ascii_lowercase();
    assert!(lower.contains("upgrade: websocket"), "{head}");
    assert!(lower.contains("connection: upgrade"), "{head}");
    assert!(
        head.contains(&accept_key(SAMPLE_KEY)),
        "missing accept token: {head}"
    );

    let mut client = RawClient::new(stream);
    client.buf = rest;
    client
}
