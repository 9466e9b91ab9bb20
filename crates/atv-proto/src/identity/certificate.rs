//! Self-signed X.509 certificate generation for the TLS client identity.
//!
//! The client wraps its RSA key in a long-lived self-signed certificate. The
//! peer never validates it against a CA; it authorises the certificate by
//! its public key once pairing succeeds, so rotating the certificate means
//! pairing again.
//!
//! Reference: `rcgen` crate (rustls team, MIT/Apache-2.0)
//! <https://github.com/rustls/rcgen>

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair as RcgenKeyPair, PKCS_RSA_SHA256};
use rustls_pki_types::PrivatePkcs8KeyDer;
use time::OffsetDateTime;

use crate::error::{ProtoError, Result};
use crate::identity::keypair::RsaKeypair;

/// Certificate validity duration in days (10 years).
const VALIDITY_DAYS: i64 = 3650;

/// A self-signed X.509 certificate wrapping an RSA identity key.
pub struct Certificate {
    cert_der: Vec<u8>,
}

impl Certificate {
    /// Generate a new self-signed certificate for the given keypair.
    ///
    /// The certificate is valid for 10 years starting from `now_epoch_secs`
    /// and carries `common_name` as its subject CN.
    pub fn generate(keypair: &RsaKeypair, common_name: &str, now_epoch_secs: i64) -> Result<Self> {
        let pkcs8_der = keypair.to_pkcs8_der()?;
        let pkcs8_typed = PrivatePkcs8KeyDer::from(pkcs8_der);
        let rcgen_keypair =
            RcgenKeyPair::from_pkcs8_der_and_sign_algo(&pkcs8_typed, &PKCS_RSA_SHA256)
                .map_err(|e| ProtoError::CertificateGeneration(e.to_string()))?;

        let not_after_epoch = now_epoch_secs + VALIDITY_DAYS * 86400;

        let not_before = OffsetDateTime::from_unix_timestamp(now_epoch_secs)
            .map_err(|e| ProtoError::CertificateGeneration(format!("invalid not_before: {e}")))?;
        let not_after = OffsetDateTime::from_unix_timestamp(not_after_epoch)
            .map_err(|e| ProtoError::CertificateGeneration(format!("invalid not_after: {e}")))?;

        let mut params = CertificateParams::new(vec![])
            .map_err(|e| ProtoError::CertificateGeneration(format!("invalid cert params: {e}")))?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;
        params.not_before = not_before;
        params.not_after = not_after;

        let cert = params
            .self_signed(&rcgen_keypair)
            .map_err(|e| ProtoError::CertificateGeneration(e.to_string()))?;

        Ok(Self {
            cert_der: cert.der().to_vec(),
        })
    }

    /// The DER-encoded certificate.
    pub fn into_der(self) -> Vec<u8> {
        self.cert_der
    }
}
