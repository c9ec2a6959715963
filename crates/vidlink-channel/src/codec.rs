use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ChannelError, Result};

/// Frame header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "VL" (0x56 0x4C).
pub const MAGIC: [u8; 2] = [0x56, 0x4C];

/// Default maximum payload size: 8 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 8 * 1024 * 1024;

/// Encode one frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Payload          │
/// │ 0x56 0x4C    │ (4B LE)   │ (Length bytes)   │
/// │ "VL"         │           │                  │
/// └──────────────┴───────────┴─────────────────┘
/// ```
///
/// There is no channel-id field: a vidlink channel carries exactly one
/// conversation.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(ChannelError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    if src[0..2] != MAGIC {
        return Err(ChannelError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes(src[2..6].try_into().unwrap()) as usize;

    if payload_len > max_payload {
        return Err(ChannelError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Length-prefixed frame codec for `tokio_util::codec::Framed`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_payload_size: usize,
}

impl FrameCodec {
    /// Codec with the default payload limit.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    /// Codec with an explicit payload limit, applied in both directions.
    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }

    /// The configured payload limit.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = ChannelError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        decode_frame(src, self.max_payload_size)
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = ChannelError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.max_payload_size {
            return Err(ChannelError::PayloadTooLarge {
                size: item.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(&item, dst)
    }
}
