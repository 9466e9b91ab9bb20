//! Client identity primitives: RSA keypair, self-signed certificate, store.
//!
//! The client presents one long-lived RSA-2048 certificate on both ports.
//! Pairing authorises that certificate's public key on the peer, so the
//! identity must survive between runs; [`IdentityStore`] is the seam for that.

pub mod certificate;
pub mod client;
pub mod keypair;
pub mod store;

pub use certificate::Certificate;
pub use client::ClientIdentity;
pub use keypair::RsaKeypair;
pub use store::{IdentityStore, MemoryIdentityStore, load_or_create};
