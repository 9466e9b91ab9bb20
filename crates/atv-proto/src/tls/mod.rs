//! TLS primitives shared by the pairing and remote connections:
//!
//! - Certificate key extraction (RSA public key from X.509 DER)
//! - A server verifier for self-signed peers
//! - The client config builder

pub mod cert_extract;
pub mod config;
pub mod verifier;

pub use cert_extract::extract_rsa_public_key;
pub use config::build_client_tls_config;
pub use verifier::AcceptAnyServerCert;
