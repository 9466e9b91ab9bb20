//! Error types for the client transport and session orchestrators.
//!
//! Callers must be able to tell "device off" ([`ClientError::Timeout`]) from
//! "device unpaired or wrong PIN" ([`ClientError::ProtocolRejection`]); the
//! predicates below exist for that.

use atv_proto::error::ProtoError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed caller input (PIN, host). No network I/O was attempted.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("timed out: {0}")]
    Timeout(String),

    /// The peer answered, but with a non-success pairing status.
    #[error("peer rejected pairing (status {status})")]
    ProtocolRejection { status: u32 },

    /// A required input was missing (peer certificate, client identity).
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("protocol error: {0}")]
    Protocol(#[source] ProtoError),
}

impl ClientError {
    /// True for a bounded wait that expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }

    /// True if the peer responded and refused.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::ProtocolRejection { .. })
    }
}

impl From<ProtoError> for ClientError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::InvalidPin(reason) => ClientError::Validation(format!("PIN: {reason}")),
            ProtoError::IdentityMissing => ClientError::Precondition(err.to_string()),
            other => ClientError::Protocol(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
