//! Extract the RSA public key from X.509 DER certificates.
//!
//! After the TLS handshake the transport holds the peer's leaf certificate
//! as DER. Pairing needs the raw PKCS#1 `RSAPublicKey` from both the client
//! and the peer certificate to derive the secret.
//!
//! Reference: `x509-parser` crate (rusticata, MIT/Apache-2.0)

use oid_registry::OID_PKCS1_RSAENCRYPTION;
use x509_parser::prelude::*;

use crate::error::{ProtoError, Result};

/// Extract the PKCS#1 `RSAPublicKey` DER blob from a DER-encoded X.509
/// certificate.
///
/// Returns an error if:
/// - The certificate cannot be parsed
/// - The key algorithm is not rsaEncryption (1.2.840.113549.1.1.1)
pub fn extract_rsa_public_key(cert_der: &[u8]) -> Result<Vec<u8>> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| ProtoError::CertificateParse(format!("X.509 parse error: {e}")))?;

    let spki = cert.public_key();
    if spki.algorithm.algorithm != OID_PKCS1_RSAENCRYPTION {
        return Err(ProtoError::CertificateParse(format!(
            "expected rsaEncryption key (1.2.840.113549.1.1.1), got {}",
            spki.algorithm.algorithm
        )));
    }

    // For RSA the BIT STRING content is the DER RSAPublicKey itself.
    Ok(spki.subject_public_key.as_ref().to_vec())
}
