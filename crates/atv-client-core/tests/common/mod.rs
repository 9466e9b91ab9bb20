//! Shared helpers for the integration tests: identities, a scripted peer,
//! canned peer responses.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use atv_client_core::ClientConfig;
use atv_proto::codec::{decode_varint, encode_frame};
use atv_proto::identity::ClientIdentity;
use atv_proto::secret::{Pin, derive_secret};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reference epoch: 2025-01-01 00:00:00 UTC.
pub const JAN_1_2025: i64 = 1735689600;

/// Init tracing subscriber (idempotent across tests via try_init).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_test_writer()
        .try_init();
}

/// RSA key generation is slow; every test shares the same two identities.
pub fn client_identity() -> &'static ClientIdentity {
    static IDENTITY: OnceLock<ClientIdentity> = OnceLock::new();
    IDENTITY.get_or_init(|| {
        ClientIdentity::generate("atv-remote-rs", JAN_1_2025).expect("client identity gen")
    })
}

pub fn server_identity() -> &'static ClientIdentity {
    static IDENTITY: OnceLock<ClientIdentity> = OnceLock::new();
    IDENTITY.get_or_init(|| {
        ClientIdentity::generate("BRAVIA 4K", JAN_1_2025).expect("server identity gen")
    })
}

/// A PIN whose check byte matches the secret for this client/server pair.
pub fn matching_pin(client: &ClientIdentity, server: &ClientIdentity) -> String {
    let probe = Pin::parse("00C0DE").expect("probe PIN");
    let secret = derive_secret(
        &client.rsa_components().expect("client components"),
        &server.rsa_components().expect("server components"),
        &probe,
    );
    format!("{:02X}C0DE", secret[0])
}

/// The secret the peer expects for `pin`.
pub fn expected_secret(client: &ClientIdentity, server: &ClientIdentity, pin: &str) -> [u8; 32] {
    derive_secret(
        &client.rsa_components().expect("client components"),
        &server.rsa_components().expect("server components"),
        &Pin::parse(pin).expect("valid PIN"),
    )
}

/// Config with short waits so the best-effort steps do not slow tests down.
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        optional_message_timeout_ms: 50,
        settle_delay_ms: 10,
        ..ClientConfig::default()
    }
}

/// rustls server config presenting `identity`.
pub fn server_tls_config(identity: &ClientIdentity) -> Arc<rustls::ServerConfig> {
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .expect("protocol versions")
    .with_no_client_auth()
    .with_single_cert(identity.certificate_chain(), identity.private_key())
    .expect("server cert config");
    Arc::new(config)
}

// ---------------------------------------------------------------------------
// Canned peer responses
// ---------------------------------------------------------------------------

const OK_PREAMBLE: [u8; 5] = [0x08, 0x02, 0x10, 0xC8, 0x01];

fn with_ok_preamble(body: &[u8]) -> Vec<u8> {
    let mut out = OK_PREAMBLE.to_vec();
    out.extend_from_slice(body);
    out
}

/// Ack to the pairing request (field 11, empty).
pub fn pairing_ack() -> Vec<u8> {
    with_ok_preamble(&[0x5A, 0x00])
}

/// Options response preferring `encoding_type` for output.
pub fn options_response(encoding_type: u8) -> Vec<u8> {
    with_ok_preamble(&[0xA2, 0x01, 0x08, 0x12, 0x04, 0x08, encoding_type, 0x10, 0x06, 0x18, 0x01])
}

/// Ack to the configuration (field 31, empty).
pub fn configuration_ack() -> Vec<u8> {
    with_ok_preamble(&[0xFA, 0x01, 0x00])
}

/// Secret accepted (field 41, empty).
pub fn secret_ack() -> Vec<u8> {
    with_ok_preamble(&[0xCA, 0x02, 0x00])
}

/// The peer's own configure announcement on the remote port.
pub fn peer_configure() -> Vec<u8> {
    vec![
        0x0A, 0x11, 0x08, 0xEE, 0x04, 0x12, 0x0C, 0x18, 0x01, 0x22, 0x01, 0x31, 0x2A, 0x05,
        b'B', b'R', b'A', b'V', b'I',
    ]
}

/// The peer asking this client to become active.
pub fn peer_set_active_request() -> Vec<u8> {
    vec![0x12, 0x03, 0x08, 0xEE, 0x04]
}

// ---------------------------------------------------------------------------
// Scripted peer
// ---------------------------------------------------------------------------

/// The device side of a connection, driven by the test.
pub struct Peer<S> {
    stream: S,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Peer<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Read one frame; `None` once the client has gone away.
    pub async fn read_frame(&mut self) -> Option<Vec<u8>> {
        let mut prefix = Vec::new();
        let len = loop {
            let byte = self.stream.read_u8().await.ok()?;
            prefix.push(byte);
            if let Some((len, _)) = decode_varint(&prefix).expect("client sent a malformed varint")
            {
                break len as usize;
            }
        };
        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).await.ok()?;
        Some(payload)
    }

    pub async fn expect_frame(&mut self) -> Vec<u8> {
        self.read_frame()
            .await
            .expect("peer expected a frame from the client")
    }

    pub async fn write_frame(&mut self, payload: &[u8]) {
        let framed = encode_frame(payload).expect("frame should encode");
        self.stream
            .write_all(&framed)
            .await
            .expect("peer write should succeed");
        self.stream.flush().await.expect("peer flush should succeed");
    }

    /// Write bytes with no length prefix.
    pub async fn write_raw(&mut self, bytes: &[u8]) {
        self.stream
            .write_all(bytes)
            .await
            .expect("peer write should succeed");
        self.stream.flush().await.expect("peer flush should succeed");
    }

    /// Play the device side of a pairing run that accepts the secret.
    /// Returns the four messages the client sent.
    pub async fn accept_pairing(&mut self, encoding_type: u8) -> Vec<Vec<u8>> {
        let mut received = Vec::new();
        received.push(self.expect_frame().await);
        self.write_frame(&pairing_ack()).await;
        received.push(self.expect_frame().await);
        self.write_frame(&options_response(encoding_type)).await;
        received.push(self.expect_frame().await);
        self.write_frame(&configuration_ack()).await;
        received.push(self.expect_frame().await);
        self.write_frame(&secret_ack()).await;
        received
    }
}
