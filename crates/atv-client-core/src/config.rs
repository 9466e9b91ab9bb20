//! Client configuration.
//!
//! All tunables of the pairing and remote sessions live in [`ClientConfig`].
//! It deserialises from TOML with every field optional; missing fields take
//! the reference defaults below.
//!
//! ```toml
//! remote_timeout_ms = 2000
//! client_name = "living-room-remote"
//!
//! [device]
//! package_name = "living-room-remote"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TLS port of the pairing service.
pub const DEFAULT_PAIRING_PORT: u16 = 6467;

/// TLS port of the remote-control service.
pub const DEFAULT_REMOTE_PORT: u16 = 6466;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("{0} must be a non-zero port")]
    InvalidPort(&'static str),

    #[error("{0} must be greater than 0 ms")]
    InvalidTimeout(&'static str),
}

/// Device description sent in the remote-configure message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Product / package name shown by the peer.
    pub package_name: String,

    /// Version string.
    pub app_version: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            package_name: "atv-remote-rs".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Ports, timeouts and names used by both orchestrators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub pairing_port: u16,
    pub remote_port: u16,

    /// TCP connect plus TLS handshake.
    pub connect_timeout_ms: u64,

    /// Each pairing response.
    pub pairing_timeout_ms: u64,

    /// The peer's initial configure message on the remote connection.
    pub remote_timeout_ms: u64,

    /// Best-effort wait for a set-active request after configuring.
    pub optional_message_timeout_ms: u64,

    /// Delay before closing the remote connection after the last key.
    pub settle_delay_ms: u64,

    /// Service name announced in the pairing request.
    pub service_name: String,

    /// Client name announced in the pairing request, also the certificate CN.
    pub client_name: String,

    pub device: DeviceConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pairing_port: DEFAULT_PAIRING_PORT,
            remote_port: DEFAULT_REMOTE_PORT,
            connect_timeout_ms: 5_000,
            pairing_timeout_ms: 5_000,
            remote_timeout_ms: 3_000,
            optional_message_timeout_ms: 1_000,
            settle_delay_ms: 200,
            service_name: "atvremote".to_string(),
            client_name: "atv-remote-rs".to_string(),
            device: DeviceConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero ports and zero timeouts. The settle delay may be zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairing_port == 0 {
            return Err(ConfigError::InvalidPort("pairing_port"));
        }
        if self.remote_port == 0 {
            return Err(ConfigError::InvalidPort("remote_port"));
        }
        for (name, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("pairing_timeout_ms", self.pairing_timeout_ms),
            ("remote_timeout_ms", self.remote_timeout_ms),
            ("optional_message_timeout_ms", self.optional_message_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidTimeout(name));
            }
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn pairing_timeout(&self) -> Duration {
        Duration::from_millis(self.pairing_timeout_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn optional_message_timeout(&self) -> Duration {
        Duration::from_millis(self.optional_message_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
