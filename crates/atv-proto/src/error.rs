//! Error types and status constants for the Android TV remote protocol.
//!
//! This module defines the Rust-native error type used inside the
//! `atv-proto` crate boundary. Network-facing failures (timeouts, refused
//! connections) belong to the transport crate; everything here is local.

use thiserror::Error;

/// Errors that can occur within the `atv-proto` crate.
#[derive(Debug, Error)]
pub enum ProtoError {
    // --- Identity ---
    #[error("failed to generate RSA keypair: {0}")]
    KeyGeneration(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("failed to generate X.509 certificate: {0}")]
    CertificateGeneration(String),

    #[error("PEM import failed: {0}")]
    PemImport(String),

    #[error("no client identity in store")]
    IdentityMissing,

    // --- Pairing secret ---
    #[error("invalid PIN: {0}")]
    InvalidPin(String),

    #[error("invalid RSA public key blob: {0}")]
    InvalidPublicKey(String),

    // --- TLS / certificates ---
    #[error("certificate parse failed: {0}")]
    CertificateParse(String),

    #[error("TLS configuration error: {0}")]
    TlsConfiguration(String),

    // --- Wire format ---
    #[error("malformed varint: {0}")]
    MalformedVarint(String),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("unparseable response: {0}")]
    UnparseableResponse(String),

    #[error("unknown key name: {0}")]
    UnknownKey(String),
}

/// Result type alias using [`ProtoError`].
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Pairing status codes carried in field 2 of every pairing message.
pub mod status {
    pub const OK: u32 = 200;
    pub const ERROR: u32 = 400;
    pub const BAD_CONFIGURATION: u32 = 401;
    pub const BAD_SECRET: u32 = 402;

    /// Short description of a status code for diagnostics.
    pub fn describe(code: u32) -> &'static str {
        match code {
            OK => "ok",
            ERROR => "error",
            BAD_CONFIGURATION => "bad configuration",
            BAD_SECRET => "bad secret (wrong PIN)",
            _ => "unrecognised status",
        }
    }
}
