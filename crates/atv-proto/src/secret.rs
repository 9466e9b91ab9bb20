//! Pairing secret derivation.
//!
//! The secret proves to the peer that the user read the on-screen PIN and
//! binds both certificates to the pairing:
//!
//! ```text
//! secret = SHA-256(client_modulus || client_exponent
//!                  || server_modulus || server_exponent
//!                  || pin[1] || pin[2])
//! ```
//!
//! The PIN is 6 hex characters decoded to 3 bytes. Only the last two feed the
//! hash; the first is the peer's check byte, equal to `secret[0]` when the
//! PIN was typed correctly.

use data_encoding::HEXLOWER_PERMISSIVE;
use sha2::{Digest, Sha256};

use crate::error::{ProtoError, Result};

/// Length of a PKCS#1 `RSAPublicKey` DER blob for a 2048-bit key with a
/// 3-byte exponent.
pub const RSA_2048_PUBLIC_KEY_BLOB_LEN: usize = 270;

/// Bytes before the modulus: SEQUENCE header (4) + INTEGER header (4).
const MODULUS_OFFSET: usize = 8;

/// Bytes after the modulus: INTEGER header (2) + exponent (3).
const TRAILER_LEN: usize = 5;

const EXPONENT_LEN: usize = 3;

/// Normalised RSA modulus length for a 2048-bit key.
pub const MODULUS_LEN: usize = 256;

/// Number of characters in the on-screen PIN.
pub const PIN_LENGTH: usize = 6;

/// Modulus and exponent of one RSA public key, as big-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaComponents {
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
}

/// Split an exported RSA-2048 public key blob into modulus and exponent.
///
/// The blob layout is fixed: 8-byte header, modulus, then a 5-byte trailer
/// ending in the 3-byte exponent. A 257-byte modulus with a leading `0x00`
/// (sign padding) is normalised to 256 bytes. Any other blob length means a
/// key size this protocol does not support and is rejected.
pub fn extract_rsa_components(blob: &[u8]) -> Result<RsaComponents> {
    if blob.len() != RSA_2048_PUBLIC_KEY_BLOB_LEN {
        return Err(ProtoError::InvalidPublicKey(format!(
            "expected {RSA_2048_PUBLIC_KEY_BLOB_LEN}-byte RSA-2048 public key, got {} bytes",
            blob.len()
        )));
    }

    let mut modulus = &blob[MODULUS_OFFSET..blob.len() - TRAILER_LEN];
    if modulus.len() > MODULUS_LEN && modulus[0] == 0x00 {
        modulus = &modulus[1..];
    }
    let exponent = &blob[blob.len() - EXPONENT_LEN..];

    Ok(RsaComponents {
        modulus: modulus.to_vec(),
        exponent: exponent.to_vec(),
    })
}

/// A validated 6-character hexadecimal PIN.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin {
    bytes: [u8; 3],
}

impl Pin {
    /// Parse a PIN: exactly 6 characters from `[0-9a-fA-F]`.
    pub fn parse(pin: &str) -> Result<Self> {
        if pin.len() != PIN_LENGTH {
            return Err(ProtoError::InvalidPin(format!(
                "expected {PIN_LENGTH} characters, got {}",
                pin.chars().count()
            )));
        }
        if !pin.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ProtoError::InvalidPin(
                "only hexadecimal characters are allowed".into(),
            ));
        }

        let decoded = HEXLOWER_PERMISSIVE
            .decode(pin.as_bytes())
            .map_err(|e| ProtoError::InvalidPin(format!("hex decode: {e}")))?;
        let bytes: [u8; 3] = decoded
            .try_into()
            .map_err(|_| ProtoError::InvalidPin("expected 3 decoded bytes".into()))?;
        Ok(Self { bytes })
    }

    /// The peer's check byte (`pin[0]`).
    pub fn check_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// The two bytes that participate in the hash (`pin[1..3]`).
    pub fn hashed_bytes(&self) -> [u8; 2] {
        [self.bytes[1], self.bytes[2]]
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pin(******)")
    }
}

/// Derive the 32-byte pairing secret. Component order is fixed by the peer.
pub fn derive_secret(client: &RsaComponents, server: &RsaComponents, pin: &Pin) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(&client.modulus);
    hasher.update(&client.exponent);
    hasher.update(&server.modulus);
    hasher.update(&server.exponent);
    hasher.update(pin.hashed_bytes());
    hasher.finalize().into()
}

/// True if the first secret byte matches the PIN's check byte.
///
/// A mismatch means the peer will almost certainly reject the secret.
pub fn pin_checksum_matches(secret: &[u8; 32], pin: &Pin) -> bool {
    secret[0] == pin.check_byte()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_blob() -> Vec<u8> {
        let mut blob = vec![0x30, 0x82, 0x01, 0x0A, 0x02, 0x82, 0x01, 0x01];
        blob.push(0x00);
        blob.extend((0..256).map(|i| (i as u8) | 0x80));
        blob.extend_from_slice(&[0x02, 0x03]);
        blob.extend_from_slice(&[0x01, 0x00, 0x01]);
        blob
    }

    fn components(seed: u8) -> RsaComponents {
        RsaComponents {
            modulus: vec![seed; MODULUS_LEN],
            exponent: vec![0x01, 0x00, 0x01],
        }
    }

    #[test]
    fn extracts_normalised_modulus_and_exponent() {
        let blob = synthetic_blob();
        assert_eq!(blob.len(), 270);

        let c = extract_rsa_components(&blob).expect("extraction should succeed");
        assert_eq!(c.modulus.len(), 256);
        assert_eq!(c.modulus[0], 0x80);
        assert_eq!(c.modulus, blob[9..265].to_vec());
        assert_eq!(c.exponent, vec![0x01, 0x00, 0x01]);
    }

    #[test]
    fn filler_bytes_are_not_interpreted() {
        let mut blob = synthetic_blob();
        blob[265] = 0xEE;
        blob[266] = 0xEE;
        let c = extract_rsa_components(&blob).expect("extraction should succeed");
        assert_eq!(c.exponent, vec![0x01, 0x00, 0x01]);
    }

    #[test]
    fn modulus_without_sign_padding_keeps_all_bytes() {
        let mut blob = synthetic_blob();
        blob[8] = 0x7F;
        let c = extract_rsa_components(&blob).expect("extraction should succeed");
        assert_eq!(c.modulus.len(), 257);
        assert_eq!(c.modulus[0], 0x7F);
    }

    #[test]
    fn rejects_other_key_sizes() {
        assert!(matches!(
            extract_rsa_components(&[0u8; 140]),
            Err(ProtoError::InvalidPublicKey(_))
        ));
        assert!(matches!(
            extract_rsa_components(&[0u8; 526]),
            Err(ProtoError::InvalidPublicKey(_))
        ));
        assert!(extract_rsa_components(&[]).is_err());
    }

    #[test]
    fn pin_accepts_hex_any_case() {
        for pin in ["000000", "4D292B", "4d292b", "aBcDeF", "123abc"] {
            assert!(Pin::parse(pin).is_ok(), "{pin} should be valid");
        }
        let pin = Pin::parse("4D292B").expect("PIN should parse");
        assert_eq!(pin.check_byte(), 0x4D);
        assert_eq!(pin.hashed_bytes(), [0x29, 0x2B]);
        assert_eq!(Pin::parse("4d292b").unwrap(), pin);
    }

    #[test]
    fn pin_rejects_bad_length_or_characters() {
        for pin in ["", "12345", "1234567", "12345G", "zzzzzz", "12 345", "12345\u{e9}"] {
            assert!(
                matches!(Pin::parse(pin), Err(ProtoError::InvalidPin(_))),
                "{pin:?} should be rejected"
            );
        }
    }

    #[test]
    fn pin_debug_does_not_leak() {
        let pin = Pin::parse("ABCDEF").unwrap();
        assert_eq!(format!("{pin:?}"), "Pin(******)");
    }

    #[test]
    fn derivation_is_deterministic() {
        let pin = Pin::parse("A1B2C3").unwrap();
        let a = derive_secret(&components(1), &components(2), &pin);
        let b = derive_secret(&components(1), &components(2), &pin);
        assert_eq!(a, b);
    }

    #[test]
    fn derivation_matches_manual_hash() {
        let client = components(1);
        let server = components(2);
        let pin = Pin::parse("00BEEF").unwrap();

        let mut input = Vec::new();
        input.extend_from_slice(&client.modulus);
        input.extend_from_slice(&client.exponent);
        input.extend_from_slice(&server.modulus);
        input.extend_from_slice(&server.exponent);
        input.extend_from_slice(&[0xBE, 0xEF]);
        let expected: [u8; 32] = Sha256::digest(&input).into();

        assert_eq!(derive_secret(&client, &server, &pin), expected);
    }

    #[test]
    fn bit_flips_change_the_secret() {
        let client = components(1);
        let server = components(2);
        let pin = Pin::parse("A1B2C3").unwrap();
        let baseline = derive_secret(&client, &server, &pin);

        for index in [0usize, 17, 128, 255] {
            let mut flipped = client.clone();
            flipped.modulus[index] ^= 0x01;
            assert_ne!(derive_secret(&flipped, &server, &pin), baseline);

            let mut flipped = server.clone();
            flipped.modulus[index] ^= 0x80;
            assert_ne!(derive_secret(&client, &flipped, &pin), baseline);
        }

        let mut flipped = client.clone();
        flipped.exponent[2] ^= 0x02;
        assert_ne!(derive_secret(&flipped, &server, &pin), baseline);

        let mut flipped = server.clone();
        flipped.exponent[0] ^= 0x04;
        assert_ne!(derive_secret(&client, &flipped, &pin), baseline);

        assert_ne!(derive_secret(&client, &server, &Pin::parse("A1B3C3").unwrap()), baseline);
        assert_ne!(derive_secret(&client, &server, &Pin::parse("A1B2C2").unwrap()), baseline);
    }

    #[test]
    fn check_byte_does_not_affect_secret() {
        let client = components(1);
        let server = components(2);
        let a = derive_secret(&client, &server, &Pin::parse("00B2C3").unwrap());
        let b = derive_secret(&client, &server, &Pin::parse("FFB2C3").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn swapping_certificates_changes_the_secret() {
        let pin = Pin::parse("A1B2C3").unwrap();
        assert_ne!(
            derive_secret(&components(1), &components(2), &pin),
            derive_secret(&components(2), &components(1), &pin)
        );
    }

    #[test]
    fn checksum_matches_first_secret_byte() {
        let client = components(3);
        let server = components(4);
        let probe = Pin::parse("00A0B0").unwrap();
        let secret = derive_secret(&client, &server, &probe);

        let good = Pin::parse(&format!("{:02X}A0B0", secret[0])).unwrap();
        assert!(pin_checksum_matches(&secret, &good));

        let bad = Pin::parse(&format!("{:02X}A0B0", secret[0].wrapping_add(1))).unwrap();
        assert!(!pin_checksum_matches(&secret, &bad));
    }
}
