//! Minimal tag/wire-type encoder for the protocol's protobuf-shaped messages.
//!
//! Only the subset the message catalog needs is implemented: varints,
//! length-delimited strings/bytes, and embedded messages. Every function
//! returns a fresh buffer; nothing is mutated in place.
//!
//! ```text
//! field = varint((field_number << 3) | wire_type) || value
//! ```

/// Wire types used by this protocol. Fixed32/64 and groups never appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum WireType {
    Varint = 0,
    LengthDelimited = 2,
}

/// Encode `value` as a base-128 varint (7 data bits per byte, low group first).
pub fn encode_varint(mut value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out
}

/// Encode a field tag: `(field_number << 3) | wire_type` as a varint.
pub fn encode_tag(field_number: u32, wire_type: WireType) -> Vec<u8> {
    encode_varint((field_number << 3) | wire_type as u32)
}

/// Encode a varint field.
pub fn encode_uint32(field_number: u32, value: u32) -> Vec<u8> {
    let mut out = encode_tag(field_number, WireType::Varint);
    out.extend_from_slice(&encode_varint(value));
    out
}

/// Encode a length-delimited byte field. An empty value is still written
/// (tag + zero length); callers omit optional empty fields themselves.
pub fn encode_bytes(field_number: u32, value: &[u8]) -> Vec<u8> {
    let mut out = encode_tag(field_number, WireType::LengthDelimited);
    out.extend_from_slice(&encode_varint(value.len() as u32));
    out.extend_from_slice(value);
    out
}

/// Encode a UTF-8 string field.
pub fn encode_string(field_number: u32, value: &str) -> Vec<u8> {
    encode_bytes(field_number, value.as_bytes())
}

/// Wrap an already-encoded inner message as a length-delimited field.
pub fn encode_embedded_message(field_number: u32, payload: &[u8]) -> Vec<u8> {
    encode_bytes(field_number, payload)
}
