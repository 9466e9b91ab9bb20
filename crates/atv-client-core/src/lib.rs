//! Android TV Remote Protocol v2 client core.
//!
//! The networking engine on top of `atv-proto`:
//!
//! - Framed TLS transport with peer certificate capture
//! - Pairing orchestrator (port 6467)
//! - Remote-control session (port 6466)
//! - Client configuration

pub mod config;
pub mod error;
pub mod pairing;
pub mod remote;
pub mod transport;

pub use config::ClientConfig;
pub use error::ClientError;
pub use pairing::{FixedPin, FnPinProvider, PairingOutcome, PinProvider, pair};
pub use remote::{RemoteSession, send_key_press};
pub use transport::FramedTransport;
