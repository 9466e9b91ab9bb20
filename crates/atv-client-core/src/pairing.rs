//! Pairing orchestrator (port 6467).
//!
//! Pairing authorises the client certificate on the peer. The exchange is
//! four request/response rounds over one TLS connection:
//!
//! 1. Pairing request → ack
//! 2. Options (hexadecimal, 6 symbols, input role) → peer's preferred encoding
//! 3. Configuration with the negotiated encoding → ack; the peer shows a PIN
//! 4. Secret derived from both certificates and the PIN → status
//!
//! Only the final status is interpreted. Nothing is retried here.

use std::future::Future;
use std::sync::Arc;

use atv_proto::error::status;
use atv_proto::identity::{ClientIdentity, IdentityStore, load_or_create};
use atv_proto::messages;
use atv_proto::scan::{scan_encoding_type, scan_status};
use atv_proto::secret::{Pin, derive_secret, extract_rsa_components, pin_checksum_matches};
use atv_proto::tls::extract_rsa_public_key;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{FramedTransport, validate_host};

/// Steps of a pairing run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    Connect,
    SendPairingRequest,
    AwaitAck,
    SendOptions,
    AwaitOptionsResponse,
    SendConfiguration,
    AwaitConfigAck,
    AwaitPin,
    SendSecret,
    AwaitSecretResponse,
    Done,
    Failed,
}

/// Result of a successful pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingOutcome {
    /// Encoding type the peer chose in the options round.
    pub encoding_type: u32,
    /// Status of the secret response (always 200).
    pub status: u32,
}

/// Source of the PIN the peer displays.
///
/// Called once per pairing run, after the configuration ack, when the PIN is
/// on screen. An error (e.g. the user cancelled) aborts pairing.
pub trait PinProvider: Send {
    fn provide_pin(&mut self) -> impl Future<Output = Result<String>> + Send;
}

/// A PIN known up front.
#[derive(Clone)]
pub struct FixedPin(pub String);

impl PinProvider for FixedPin {
    async fn provide_pin(&mut self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Adapts an async closure into a [`PinProvider`].
pub struct FnPinProvider<F>(pub F);

impl<F, Fut> PinProvider for FnPinProvider<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<String>> + Send,
{
    fn provide_pin(&mut self) -> impl Future<Output = Result<String>> + Send {
        (self.0)()
    }
}

/// A PIN delivered from another task, e.g. a UI prompt.
///
/// Dropping the sender counts as cancellation.
impl PinProvider for oneshot::Receiver<String> {
    async fn provide_pin(&mut self) -> Result<String> {
        self.await
            .map_err(|_| ClientError::Validation("PIN entry cancelled".into()))
    }
}

/// Pair with `host`, creating the client identity first if the store has none.
///
/// Identity creation (RSA key generation) runs on the blocking thread pool.
/// The transport is closed on every path.
pub async fn pair<P: PinProvider>(
    host: &str,
    store: Arc<dyn IdentityStore>,
    pins: &mut P,
    config: &ClientConfig,
) -> Result<PairingOutcome> {
    validate_host(host)?;
    let identity = load_identity(store, &config.client_name).await?;

    let mut transport =
        FramedTransport::open(host, config.pairing_port, &identity, config.connect_timeout())
            .await?;
    let result = PairingSession::run(&mut transport, &identity, pins, config).await;
    transport.close().await;

    if let Ok(outcome) = &result {
        info!(host, encoding_type = outcome.encoding_type, "paired");
    }
    result
}

/// Load the identity, generating it off the async runtime when missing.
async fn load_identity(store: Arc<dyn IdentityStore>, common_name: &str) -> Result<ClientIdentity> {
    let common_name = common_name.to_string();
    let identity = tokio::task::spawn_blocking(move || load_or_create(store.as_ref(), &common_name))
        .await
        .map_err(|e| ClientError::Precondition(format!("identity creation did not finish: {e}")))??;
    Ok(identity)
}

/// One pairing run over an open transport.
pub struct PairingSession<'a> {
    transport: &'a mut FramedTransport,
    identity: &'a ClientIdentity,
    config: &'a ClientConfig,
    state: PairingState,
    encoding_type: u32,
}

impl<'a> PairingSession<'a> {
    /// Drive all pairing rounds over `transport`.
    ///
    /// The transport must have captured the peer certificate. On failure the
    /// transport is closed before the error is returned.
    pub async fn run<P: PinProvider>(
        transport: &'a mut FramedTransport,
        identity: &'a ClientIdentity,
        pins: &mut P,
        config: &'a ClientConfig,
    ) -> Result<PairingOutcome> {
        let mut session = Self {
            transport,
            identity,
            config,
            state: PairingState::Connect,
            encoding_type: messages::ENCODING_TYPE_HEXADECIMAL,
        };

        match session.drive(pins).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(state = ?session.state, error = %e, "pairing failed");
                session.transport.close().await;
                Err(e)
            }
        }
    }

    async fn drive<P: PinProvider>(&mut self, pins: &mut P) -> Result<PairingOutcome> {
        let peer_certificate = self.transport.peer_certificate().ok_or_else(|| {
            ClientError::Precondition("no peer certificate captured from the TLS handshake".into())
        })?;
        let server = extract_rsa_components(&extract_rsa_public_key(peer_certificate)?)?;
        let client = self.identity.rsa_components()?;

        self.state = PairingState::SendPairingRequest;
        self.transport
            .send_framed(&messages::pairing_request(
                &self.config.service_name,
                &self.config.client_name,
            ))
            .await?;

        self.state = PairingState::AwaitAck;
        self.await_response().await?;

        self.state = PairingState::SendOptions;
        self.transport.send_framed(&messages::options_request()).await?;

        self.state = PairingState::AwaitOptionsResponse;
        let options = self.await_response().await?;
        self.encoding_type = scan_encoding_type(&options);
        debug!(encoding_type = self.encoding_type, "negotiated encoding");

        self.state = PairingState::SendConfiguration;
        self.transport
            .send_framed(&messages::configuration_request(self.encoding_type))
            .await?;

        self.state = PairingState::AwaitConfigAck;
        self.await_response().await?;

        self.state = PairingState::AwaitPin;
        let pin = Pin::parse(pins.provide_pin().await?.trim())?;

        self.state = PairingState::SendSecret;
        let secret = derive_secret(&client, &server, &pin);
        if !pin_checksum_matches(&secret, &pin) {
            warn!("PIN check byte does not match the derived secret; the peer will likely reject it");
        }
        self.transport
            .send_framed(&messages::secret_message(&secret))
            .await?;

        self.state = PairingState::AwaitSecretResponse;
        let response = self.await_response().await?;
        let code = scan_status(&response)?;
        if code != status::OK {
            debug!(status = code, reason = status::describe(code), "secret refused");
            return Err(ClientError::ProtocolRejection { status: code });
        }

        Ok(PairingOutcome {
            encoding_type: self.encoding_type,
            status: code,
        })
    }

    async fn await_response(&mut self) -> Result<Vec<u8>> {
        let response = self
            .transport
            .receive_framed(self.config.pairing_timeout())
            .await?;
        debug!(state = ?self.state, len = response.len(), "pairing response");
        Ok(response)
    }
}
