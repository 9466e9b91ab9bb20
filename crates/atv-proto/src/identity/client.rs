//! The loaded client identity: certificate + private key, ready for TLS.
//!
//! A [`ClientIdentity`] is what the transport presents as its client
//! certificate and what pairing reads its RSA components from. It can be
//! generated fresh, or imported from / exported to PEM so the caller can
//! persist it wherever it likes.

use data_encoding::{BASE64, Encoding};
use rcgen::{KeyPair as RcgenKeyPair, PKCS_RSA_SHA256};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

use crate::error::{ProtoError, Result};
use crate::identity::certificate::Certificate;
use crate::identity::keypair::RsaKeypair;
use crate::secret::{RsaComponents, extract_rsa_components};
use crate::tls::cert_extract::extract_rsa_public_key;

/// Certificate + PKCS#8 private key of this client.
#[derive(Clone)]
pub struct ClientIdentity {
    certificate_der: Vec<u8>,
    private_key_der: Vec<u8>,
}

impl ClientIdentity {
    /// Generate a new RSA-2048 key and a self-signed certificate for it.
    pub fn generate(common_name: &str, now_epoch_secs: i64) -> Result<Self> {
        let keypair = RsaKeypair::generate()?;
        let cert = Certificate::generate(&keypair, common_name, now_epoch_secs)?;
        Self::from_parts(cert.into_der(), keypair.to_pkcs8_der()?)
    }

    /// Build an identity from DER parts.
    ///
    /// The certificate must carry an RSA-2048 public key; anything else
    /// could never complete pairing and is rejected up front.
    pub fn from_parts(certificate_der: Vec<u8>, private_key_pkcs8_der: Vec<u8>) -> Result<Self> {
        let blob = extract_rsa_public_key(&certificate_der)?;
        extract_rsa_components(&blob)?;
        RsaKeypair::from_pkcs8_der(&private_key_pkcs8_der)?;
        Ok(Self {
            certificate_der,
            private_key_der: private_key_pkcs8_der,
        })
    }

    /// Import an identity from PEM text.
    ///
    /// The key may be PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`);
    /// PKCS#1 keys are converted to PKCS#8.
    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self> {
        let certificate_der = rustls_pemfile::certs(&mut certificate_pem.as_bytes())
            .next()
            .ok_or_else(|| ProtoError::PemImport("no CERTIFICATE block".into()))?
            .map_err(|e| ProtoError::PemImport(format!("certificate: {e}")))?
            .to_vec();

        let key = rustls_pemfile::private_key(&mut private_key_pem.as_bytes())
            .map_err(|e| ProtoError::PemImport(format!("private key: {e}")))?
            .ok_or_else(|| ProtoError::PemImport("no private key block".into()))?;

        let private_key_der = match key {
            PrivateKeyDer::Pkcs8(pkcs8) => pkcs8.secret_pkcs8_der().to_vec(),
            PrivateKeyDer::Pkcs1(pkcs1) => {
                RsaKeypair::from_pkcs1_der(pkcs1.secret_pkcs1_der())?.to_pkcs8_der()?
            }
            _ => {
                return Err(ProtoError::PemImport(
                    "unsupported private key type (expected RSA)".into(),
                ));
            }
        };

        Self::from_parts(certificate_der, private_key_der)
    }

    /// Export as `(certificate_pem, private_key_pem)`.
    pub fn to_pem(&self) -> Result<(String, String)> {
        let key_pem = RcgenKeyPair::from_pkcs8_der_and_sign_algo(
            &PrivatePkcs8KeyDer::from(self.private_key_der.as_slice()),
            &PKCS_RSA_SHA256,
        )
        .map_err(|e| ProtoError::InvalidPrivateKey(e.to_string()))?
        .serialize_pem();
        Ok((pem_encode("CERTIFICATE", &self.certificate_der), key_pem))
    }

    /// DER-encoded client certificate.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// Certificate in the form rustls expects for a client auth chain.
    pub fn certificate_chain(&self) -> Vec<CertificateDer<'static>> {
        vec![CertificateDer::from(self.certificate_der.clone())]
    }

    /// Private key in the form rustls expects.
    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.private_key_der.clone()))
    }

    /// The exported public key blob (PKCS#1 `RSAPublicKey` DER).
    pub fn public_key_blob(&self) -> Result<Vec<u8>> {
        extract_rsa_public_key(&self.certificate_der)
    }

    /// Modulus and exponent used in the pairing secret.
    pub fn rsa_components(&self) -> Result<RsaComponents> {
        extract_rsa_components(&self.public_key_blob()?)
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("certificate_der", &format_args!("{} bytes", self.certificate_der.len()))
            .finish_non_exhaustive()
    }
}

/// PEM-armour `der` with 64-column base64 lines.
fn pem_encode(label: &str, der: &[u8]) -> String {
    let body = pem_base64().encode(der);
    format!("-----BEGIN {label}-----\n{body}-----END {label}-----\n")
}

fn pem_base64() -> Encoding {
    let mut spec = BASE64.specification();
    spec.wrap.width = 64;
    spec.wrap.separator.push('\n');
    spec.encoding().unwrap_or_else(|_| BASE64.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_1_2025: i64 = 1735689600;

    #[test]
    fn generated_identity_exposes_rsa_components() {
        let identity = ClientIdentity::generate("atvremote", JAN_1_2025).expect("identity gen");
        let c = identity.rsa_components().expect("components should extract");
        assert_eq!(c.modulus.len(), 256);
        assert_eq!(c.exponent, vec![0x01, 0x00, 0x01]);
        assert_eq!(identity.certificate_chain().len(), 1);
    }

    #[test]
    fn pem_roundtrip_preserves_identity() {
        let identity = ClientIdentity::generate("atvremote", JAN_1_2025).expect("identity gen");
        let (cert_pem, key_pem) = identity.to_pem().expect("PEM export should succeed");
        assert!(cert_pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(cert_pem.lines().all(|line| line.len() <= 64));
        assert!(key_pem.contains("PRIVATE KEY"));

        let restored = ClientIdentity::from_pem(&cert_pem, &key_pem).expect("PEM import should succeed");
        assert_eq!(restored.certificate_der(), identity.certificate_der());
        assert_eq!(
            restored.rsa_components().unwrap(),
            identity.rsa_components().unwrap()
        );
    }

    #[test]
    fn pem_without_blocks_rejected() {
        assert!(matches!(
            ClientIdentity::from_pem("", ""),
            Err(ProtoError::PemImport(_))
        ));
    }

    #[test]
    fn from_parts_rejects_garbage_certificate() {
        assert!(ClientIdentity::from_parts(vec![0u8; 16], vec![0u8; 16]).is_err());
    }
}
