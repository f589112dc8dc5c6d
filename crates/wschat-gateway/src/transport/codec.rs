//! Stream adapter: drives the core frame codec from `FramedRead`/`FramedWrite`.
//!
//! Inbound: every frame is decoded (masked or not) with the configured payload
//! ceiling. Outbound: every item is one unmasked text frame.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use wschat_core::error::WsChatError;
use wschat_core::protocol::frame::{decode_frame, encode_frame, Frame, OPCODE_TEXT};

#[derive(Debug, Clone, Copy)]
pub struct WsFrameCodec {
    max_frame_bytes: u64,
}

impl WsFrameCodec {
    pub fn new(max_frame_bytes: u64) -> Self {
        Self { max_frame_bytes }
    }
}

impl Decoder for WsFrameCodec {
    type Item = Frame;
    type Error = WsChatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, WsChatError> {
        decode_frame(src, self.max_frame_bytes)
    }
}

impl Encoder<Bytes> for WsFrameCodec {
    type Error = WsChatError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), WsChatError> {
        encode_frame(OPCODE_TEXT, &item, dst);
        Ok(())
    }
}
