//! Message catalog: the fixed set of outbound messages this client sends.
//!
//! The layouts are reverse-engineered from the peer, not compiled from a
//! schema, and must be reproduced byte-for-byte. Every pairing message shares
//! the same outer shape:
//!
//! ```text
//! 10 C8 01          field 2  status = 200
//! 08 02             field 1  protocol version = 2
//! <tag> <len> ...   exactly one of fields 10 / 20 / 30 / 40
//! ```
//!
//! Remote-control messages have no preamble; the outer field number alone
//! identifies the message.

use crate::error::status;
use crate::keycode::{Direction, KeyCode};
use crate::wire::{encode_bytes, encode_embedded_message, encode_string, encode_uint32};

/// Pairing protocol version sent in field 1.
pub const PROTOCOL_VERSION: u32 = 2;

/// Encoding type requested in the options message (hexadecimal).
pub const ENCODING_TYPE_HEXADECIMAL: u32 = 0;

/// Number of symbols in the on-screen PIN.
pub const ENCODING_SYMBOL_LENGTH: u32 = 6;

/// Preferred / client role: input device.
pub const ROLE_TYPE_INPUT: u32 = 1;

/// Outer field numbers of pairing phase payloads.
pub mod pairing_field {
    pub const PAIRING_REQUEST: u32 = 10;
    pub const OPTIONS: u32 = 20;
    pub const CONFIGURATION: u32 = 30;
    pub const SECRET: u32 = 40;
}

/// Outer field numbers of remote-control messages.
pub mod remote_field {
    pub const CONFIGURE: u32 = 1;
    pub const SET_ACTIVE: u32 = 2;
    pub const PING_REQUEST: u32 = 8;
    pub const PING_RESPONSE: u32 = 9;
    pub const KEY_INJECT: u32 = 10;
}

/// Remote-session feature bits advertised by both sides.
pub mod features {
    pub const PING: u32 = 1;
    pub const KEY: u32 = 2;
    pub const POWER: u32 = 32;
    pub const VOLUME: u32 = 64;
    pub const APP_LINK: u32 = 512;

    /// The fixed set this client negotiates (611).
    pub const ACTIVE: u32 = PING | KEY | POWER | VOLUME | APP_LINK;
}

/// Device description carried in the remote-configure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo<'a> {
    pub package_name: &'a str,
    pub app_version: &'a str,
}

/// Wrap a phase payload in the status + version preamble.
fn pairing_message(field: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = encode_uint32(2, status::OK);
    out.extend_from_slice(&encode_uint32(1, PROTOCOL_VERSION));
    out.extend_from_slice(&encode_embedded_message(field, payload));
    out
}

fn encoding(encoding_type: u32) -> Vec<u8> {
    let mut out = encode_uint32(1, encoding_type);
    out.extend_from_slice(&encode_uint32(2, ENCODING_SYMBOL_LENGTH));
    out
}

/// Field 10: announce the client. Empty names are omitted entirely.
pub fn pairing_request(service_name: &str, client_name: &str) -> Vec<u8> {
    let mut inner = Vec::new();
    if !service_name.is_empty() {
        inner.extend_from_slice(&encode_string(1, service_name));
    }
    if !client_name.is_empty() {
        inner.extend_from_slice(&encode_string(2, client_name));
    }
    pairing_message(pairing_field::PAIRING_REQUEST, &inner)
}

/// Field 20: offer a 6-symbol hexadecimal encoding, prefer the input role.
pub fn options_request() -> Vec<u8> {
    let mut inner = encode_embedded_message(2, &encoding(ENCODING_TYPE_HEXADECIMAL));
    inner.extend_from_slice(&encode_uint32(3, ROLE_TYPE_INPUT));
    pairing_message(pairing_field::OPTIONS, &inner)
}

/// Field 30: confirm the encoding type the peer chose.
pub fn configuration_request(encoding_type: u32) -> Vec<u8> {
    let mut inner = encode_embedded_message(1, &encoding(encoding_type));
    inner.extend_from_slice(&encode_uint32(2, ROLE_TYPE_INPUT));
    pairing_message(pairing_field::CONFIGURATION, &inner)
}

/// Field 40: the derived pairing secret.
pub fn secret_message(secret: &[u8; 32]) -> Vec<u8> {
    let inner = encode_bytes(1, secret);
    pairing_message(pairing_field::SECRET, &inner)
}

/// Outer field 1: describe this client and its feature set.
pub fn remote_configure(device: &DeviceInfo<'_>) -> Vec<u8> {
    let mut info = encode_uint32(3, 1);
    info.extend_from_slice(&encode_string(4, "1"));
    info.extend_from_slice(&encode_string(5, device.package_name));
    info.extend_from_slice(&encode_string(6, device.app_version));

    let mut inner = encode_uint32(1, features::ACTIVE);
    inner.extend_from_slice(&encode_embedded_message(2, &info));
    encode_embedded_message(remote_field::CONFIGURE, &inner)
}

/// Outer field 2: accept the peer's activation request.
pub fn remote_set_active() -> Vec<u8> {
    let inner = encode_uint32(1, features::ACTIVE);
    encode_embedded_message(remote_field::SET_ACTIVE, &inner)
}

/// Outer field 9: answer a ping, echoing its value.
pub fn remote_ping_response(val1: u32) -> Vec<u8> {
    let inner = encode_uint32(1, val1);
    encode_embedded_message(remote_field::PING_RESPONSE, &inner)
}

/// Outer field 10: a key event.
pub fn remote_key_inject(key: KeyCode, direction: Direction) -> Vec<u8> {
    let mut inner = encode_uint32(1, key.code());
    inner.extend_from_slice(&encode_uint32(2, direction.code()));
    encode_embedded_message(remote_field::KEY_INJECT, &inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: [u8; 5] = [0x10, 0xC8, 0x01, 0x08, 0x02];

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn feature_mask_is_611() {
        assert_eq!(features::ACTIVE, 611);
    }

    #[test]
    fn pairing_request_layout() {
        let msg = pairing_request("Shield TV", "MediaControl");
        assert!(msg.starts_with(&PREAMBLE));
        assert!(contains(&msg, b"Shield TV"));
        assert!(contains(&msg, b"MediaControl"));

        let mut expected = PREAMBLE.to_vec();
        expected.extend_from_slice(&[0x52, 25, 0x0A, 9]);
        expected.extend_from_slice(b"Shield TV");
        expected.extend_from_slice(&[0x12, 12]);
        expected.extend_from_slice(b"MediaControl");
        assert_eq!(msg, expected);
    }

    #[test]
    fn pairing_request_omits_empty_names() {
        let msg = pairing_request("", "client");
        let mut expected = PREAMBLE.to_vec();
        expected.extend_from_slice(&[0x52, 8, 0x12, 6]);
        expected.extend_from_slice(b"client");
        assert_eq!(msg, expected);

        let msg = pairing_request("", "");
        let mut expected = PREAMBLE.to_vec();
        expected.extend_from_slice(&[0x52, 0]);
        assert_eq!(msg, expected);
    }

    #[test]
    fn options_request_layout() {
        let mut expected = PREAMBLE.to_vec();
        // field 20, len 8: { 2: { 1: 0, 2: 6 }, 3: 1 }
        expected.extend_from_slice(&[0xA2, 0x01, 8, 0x12, 4, 0x08, 0x00, 0x10, 0x06, 0x18, 0x01]);
        assert_eq!(options_request(), expected);
    }

    #[test]
    fn configuration_request_uses_given_encoding() {
        let mut expected = PREAMBLE.to_vec();
        // field 30, len 8: { 1: { 1: 3, 2: 6 }, 2: 1 }
        expected.extend_from_slice(&[0xF2, 0x01, 8, 0x0A, 4, 0x08, 0x03, 0x10, 0x06, 0x10, 0x01]);
        assert_eq!(configuration_request(3), expected);
    }

    #[test]
    fn secret_message_layout() {
        let secret = [0xABu8; 32];
        let msg = secret_message(&secret);
        assert!(msg.starts_with(&PREAMBLE));
        assert_eq!(&msg[5..10], &[0xC2, 0x02, 34, 0x0A, 32]);
        assert_eq!(&msg[10..], &secret);
    }

    #[test]
    fn remote_configure_layout() {
        let msg = remote_configure(&DeviceInfo {
            package_name: "pkg",
            app_version: "1.0",
        });
        // info = 18 01 22 01 '1' 2A 03 'pkg' 32 03 '1.0' (15 bytes)
        let mut info = vec![0x18, 0x01, 0x22, 0x01, b'1', 0x2A, 0x03];
        info.extend_from_slice(b"pkg");
        info.extend_from_slice(&[0x32, 0x03]);
        info.extend_from_slice(b"1.0");

        let mut inner = vec![0x08, 0xE3, 0x04, 0x12, info.len() as u8];
        inner.extend_from_slice(&info);

        let mut expected = vec![0x0A, inner.len() as u8];
        expected.extend_from_slice(&inner);
        assert_eq!(msg, expected);
    }

    #[test]
    fn remote_set_active_layout() {
        assert_eq!(remote_set_active(), vec![0x12, 0x03, 0x08, 0xE3, 0x04]);
    }

    #[test]
    fn remote_ping_response_layout() {
        assert_eq!(remote_ping_response(7), vec![0x4A, 0x02, 0x08, 0x07]);
    }

    #[test]
    fn key_inject_layout() {
        assert_eq!(
            remote_key_inject(KeyCode::PlayPause, Direction::Short),
            vec![0x52, 0x04, 0x08, 85, 0x10, 0x03]
        );
        assert_eq!(
            remote_key_inject(KeyCode::Wakeup, Direction::Down),
            vec![0x52, 0x05, 0x08, 0xE0, 0x01, 0x10, 0x01]
        );
    }
}
