//! Varint length-prefixed framing for the TLS byte stream.
//!
//! Each protocol message is preceded by its byte length encoded as a varint:
//! `[varint length][payload]`. The same framing is used on both the pairing
//! (6467) and remote-control (6466) connections.
//!
//! These functions are synchronous and work on byte slices. The async reader
//! and writer live in the transport crate.

use bytes::BytesMut;

use crate::error::{ProtoError, Result};
use crate::wire::encode_varint;

/// Maximum allowed message size (64 KiB). Protocol messages are tiny; this
/// bounds allocation from a malformed length prefix.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// A u32 varint never needs more than 5 bytes (35 bits).
pub const MAX_VARINT_LEN: usize = 5;

/// Try to decode a varint from the start of `buf`.
///
/// Returns `Ok(Some((value, bytes_consumed)))` for a complete varint,
/// `Ok(None)` if `buf` ends before the terminating byte, or `Err` if the
/// varint runs past 5 bytes or overflows 32 bits.
pub fn decode_varint(buf: &[u8]) -> Result<Option<(u32, usize)>> {
    let mut value: u64 = 0;
    for (i, byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(ProtoError::MalformedVarint(format!(
                "longer than {MAX_VARINT_LEN} bytes"
            )));
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            let value = u32::try_from(value)
                .map_err(|_| ProtoError::MalformedVarint(format!("{value} overflows u32")))?;
            return Ok(Some((value, i + 1)));
        }
    }
    if buf.len() >= MAX_VARINT_LEN {
        return Err(ProtoError::MalformedVarint(format!(
            "longer than {MAX_VARINT_LEN} bytes"
        )));
    }
    Ok(None)
}

/// Prefix `payload` with its varint length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    check_size(payload.len())?;
    let prefix = encode_varint(payload.len() as u32);
    let mut buf = Vec::with_capacity(prefix.len() + payload.len());
    buf.extend_from_slice(&prefix);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Append a framed `payload` to `buf`.
///
/// Useful for building up multiple messages in a single write.
pub fn encode_frame_into(payload: &[u8], buf: &mut BytesMut) -> Result<()> {
    check_size(payload.len())?;
    let prefix = encode_varint(payload.len() as u32);
    buf.reserve(prefix.len() + payload.len());
    buf.extend_from_slice(&prefix);
    buf.extend_from_slice(payload);
    Ok(())
}

/// Try to decode one framed message from the start of `buf`.
///
/// Returns `Ok(Some((payload, bytes_consumed)))` if a complete frame is
/// available, `Ok(None)` if more data is needed, or `Err` on malformed data.
pub fn decode_frame(buf: &[u8]) -> Result<Option<(&[u8], usize)>> {
    let Some((len, prefix_len)) = decode_varint(buf)? else {
        return Ok(None);
    };
    let len = len as usize;
    check_size(len)?;

    let total_needed = prefix_len + len;
    if buf.len() < total_needed {
        return Ok(None);
    }
    Ok(Some((&buf[prefix_len..total_needed], total_needed)))
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtoError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}
