//! Android TV Remote Protocol v2 primitives.
//!
//! Synchronous, I/O-free layer used by `atv-client-core`:
//!
//! - Protobuf-style wire encoding and varint framing
//! - The outbound message catalog and narrow response scanners
//! - Key codes
//! - Pairing secret derivation from the two RSA certificates and the PIN
//! - RSA client identity and the rustls client config

pub mod codec;
pub mod error;
pub mod identity;
pub mod keycode;
pub mod messages;
pub mod scan;
pub mod secret;
pub mod tls;
pub mod wire;

pub use error::{ProtoError, Result};
pub use keycode::{Direction, KeyCode};
