//! Narrow byte-pattern scanners over otherwise unparsed peer responses.
//!
//! Each scanner extracts exactly one field the handshake needs. There is no
//! general decoder: these patterns are the whole contract.

use crate::codec::decode_varint;
use crate::error::{ProtoError, Result};

/// Pattern preceding the peer's preferred encoding type in an options
/// response: field 2, length 4, then field 1 (varint).
const ENCODING_PATTERN: [u8; 3] = [0x12, 0x04, 0x08];

/// Tag byte of field 2 (varint), the status field of pairing messages.
const STATUS_TAG: u8 = 0x10;

/// Tag byte of remote outer field 2 (set-active).
const SET_ACTIVE_TAG: u8 = 0x12;

/// Tag byte of remote outer field 8 (ping request).
const PING_REQUEST_TAG: u8 = 0x42;

/// Learn the peer's encoding type by finding `12 04 08 [type]`.
///
/// Returns 0 (hexadecimal) when the pattern is absent.
pub fn scan_encoding_type(response: &[u8]) -> u32 {
    response
        .windows(ENCODING_PATTERN.len() + 1)
        .find(|w| w[..ENCODING_PATTERN.len()] == ENCODING_PATTERN)
        .map(|w| u32::from(w[ENCODING_PATTERN.len()]))
        .unwrap_or(0)
}

/// Read the pairing status: the first `0x10` followed by a 1- or 2-byte varint.
///
/// A status varint longer than 2 bytes has never been observed from a peer
/// and is reported as an error rather than decoded.
pub fn scan_status(response: &[u8]) -> Result<u32> {
    let pos = response
        .iter()
        .position(|&b| b == STATUS_TAG)
        .ok_or_else(|| ProtoError::UnparseableResponse("no status field (0x10)".into()))?;

    let rest = &response[pos + 1..];
    let first = *rest
        .first()
        .ok_or_else(|| ProtoError::UnparseableResponse("status tag without value".into()))?;
    if first & 0x80 == 0 {
        return Ok(u32::from(first));
    }

    let second = *rest
        .get(1)
        .ok_or_else(|| ProtoError::UnparseableResponse("truncated status varint".into()))?;
    if second & 0x80 != 0 {
        return Err(ProtoError::UnparseableResponse(
            "status varint longer than 2 bytes".into(),
        ));
    }
    Ok(u32::from(first & 0x7F) | (u32::from(second) << 7))
}

/// True if the message is a remote set-active request (outer field 2, tag `0x12`).
pub fn is_set_active_request(message: &[u8]) -> bool {
    message.first() == Some(&SET_ACTIVE_TAG)
}

/// If the message is a ping request (outer field 8, tag `0x42`), return its
/// field-1 value so it can be echoed back.
///
/// Matches `42 [len] 08 [varint]`; the varint is limited to 5 bytes.
pub fn scan_ping_request(message: &[u8]) -> Option<u32> {
    if message.first() != Some(&PING_REQUEST_TAG) {
        return None;
    }
    let inner = message.get(2..)?;
    if inner.first() != Some(&0x08) {
        return None;
    }
    decode_varint(&inner[1..])
        .ok()
        .flatten()
        .map(|(value, _)| value)
}
