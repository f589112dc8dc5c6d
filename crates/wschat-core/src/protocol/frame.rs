//! WebSocket frame codec (RFC 6455 subset, panic-free).
//!
//! Parsing rules:
//! - Never index the input buffer; read through a `Buf` cursor and check
//!   `remaining()` before every fixed-width read.
//! - An incomplete frame yields `Ok(None)` and leaves the buffer untouched so
//!   the caller can read more bytes and retry.
//! - A complete frame is always consumed, even when it is then rejected, so a
//!   caller that chooses to continue stays aligned on frame boundaries.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WsChatError};

pub const OPCODE_CONTINUATION: u8 = 0x0;
pub const OPCODE_TEXT: u8 = 0x1;
pub const OPCODE_BINARY: u8 = 0x2;
pub const OPCODE_CLOSE: u8 = 0x8;
pub const OPCODE_PING: u8 = 0x9;
pub const OPCODE_PONG: u8 = 0xA;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_BITS: u8 = 0x0F;
const LEN_BITS: u8 = 0x7F;

/// Largest length that fits in the 7-bit field.
const LEN_INLINE_MAX: usize = 125;
/// Marker: 16-bit extended length follows.
const LEN_16: u8 = 126;
/// Marker: 64-bit extended length follows.
const LEN_64: u8 = 127;

/// 2 header bytes + 8 extended length bytes + 4 mask bytes.
pub const MAX_HEADER_LEN: usize = 14;

/// One decoded frame. `payload` is already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: u8,
    pub masked: bool,
    pub mask: Option<[u8; 4]>,
    pub payload: Bytes,
}

impl Frame {
    pub fn is_data(&self) -> bool {
        self.opcode == OPCODE_TEXT || self.opcode == OPCODE_BINARY
    }
}

/// Decode one frame from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` does not yet hold a complete frame.
/// Declared payloads above `max_payload`, and 64-bit lengths above `i64::MAX`,
/// fail with `FrameTooLarge` as soon as the length is known.
/// Frames with FIN=0 fail with `UnsupportedFrame` once fully buffered; no
/// partial payload is returned.
pub fn decode_frame(buf: &mut BytesMut, max_payload: u64) -> Result<Option<Frame>> {
    let mut cur: &[u8] = &buf[..];

    if cur.remaining() < 2 {
        return Ok(None);
    }
    let b0 = cur.get_u8();
    let b1 = cur.get_u8();

    let fin = b0 & FIN_BIT != 0;
    let opcode = b0 & OPCODE_BITS;
    let masked = b1 & MASK_BIT != 0;

    let len = match b1 & LEN_BITS {
        LEN_16 => {
            if cur.remaining() < 2 {
                return Ok(None);
            }
            u64::from(cur.get_u16())
        }
        LEN_64 => {
            if cur.remaining() < 8 {
                return Ok(None);
            }
            let n = cur.get_u64();
            if n > i64::MAX as u64 {
                return Err(WsChatError::FrameTooLarge(n));
            }
            n
        }
        n => u64::from(n),
    };

    if len > max_payload {
        return Err(WsChatError::FrameTooLarge(len));
    }
    let len = usize::try_from(len).map_err(|_| WsChatError::FrameTooLarge(len))?;

    let mask = if masked {
        if cur.remaining() < 4 {
            return Ok(None);
        }
        let mut key = [0u8; 4];
        cur.copy_to_slice(&mut key);
        Some(key)
    } else {
        None
    };

    if cur.remaining() < len {
        return Ok(None);
    }

    let header_len = buf.len() - cur.remaining();
    buf.advance(header_len);
    let mut payload = buf.split_to(len);

    if let Some(key) = mask {
        apply_mask(&mut payload, key);
    }

    if !fin {
        return Err(WsChatError::UnsupportedFrame(
            "fragmented messages are not supported".into(),
        ));
    }

    Ok(Some(Frame {
        fin,
        opcode,
        masked,
        mask,
        payload: payload.freeze(),
    }))
}

/// XOR `payload` in place with the 4-byte masking key.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (b, k) in payload.iter_mut().zip(key.iter().cycle()) {
        *b ^= k;
    }
}

/// Encode one unmasked, unfragmented frame (server -> client).
pub fn encode_frame(opcode: u8, payload: &[u8], dst: &mut BytesMut) {
    put_header(opcode, payload.len(), None, dst);
    dst.put_slice(payload);
}

/// Encode one masked frame the way a client sends it.
///
/// The server never emits these; this exists for tools and tests that play
/// the client side of the connection.
pub fn encode_client_frame(opcode: u8, payload: &[u8], key: [u8; 4], dst: &mut BytesMut) {
    put_header(opcode, payload.len(), Some(key), dst);
    let start = dst.len();
    dst.put_slice(payload);
    apply_mask(&mut dst[start..], key);
}

fn put_header(opcode: u8, len: usize, mask: Option<[u8; 4]>, dst: &mut BytesMut) {
    dst.reserve(MAX_HEADER_LEN + len);
    dst.put_u8(FIN_BIT | (opcode & OPCODE_BITS));

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    if len <= LEN_INLINE_MAX {
        dst.put_u8(mask_bit | len as u8);
    } else if let Ok(n) = u16::try_from(len) {
        dst.put_u8(mask_bit | LEN_16);
        dst.put_u16(n);
    } else {
        dst.put_u8(mask_bit | LEN_64);
        dst.put_u64(len as u64);
    }

    if let Some(key) = mask {
        dst.put_slice(&key);
    }
}
