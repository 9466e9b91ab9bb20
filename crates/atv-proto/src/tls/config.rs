//! TLS configuration builder for the pairing and remote connections.
//!
//! The builder enforces:
//! - Ring crypto provider
//! - Safe default protocol versions (TLS 1.2 and 1.3; peers typically
//!   negotiate 1.2)
//! - The client identity presented as client certificate
//! - [`AcceptAnyServerCert`] for the peer's self-signed certificate

use std::sync::Arc;

use rustls::client::danger::ServerCertVerifier;

use crate::error::{ProtoError, Result};
use crate::identity::ClientIdentity;
use crate::tls::verifier::AcceptAnyServerCert;

/// Build a `rustls::ClientConfig` presenting `identity` for client auth.
pub fn build_client_tls_config(identity: &ClientIdentity) -> Result<rustls::ClientConfig> {
    let verifier: Arc<dyn ServerCertVerifier> = Arc::new(AcceptAnyServerCert::new());

    rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| ProtoError::TlsConfiguration(format!("TLS version config: {e}")))?
    .dangerous()
    .with_custom_certificate_verifier(verifier)
    .with_client_auth_cert(identity.certificate_chain(), identity.private_key())
    .map_err(|e| ProtoError::TlsConfiguration(format!("client cert config: {e}")))
}
