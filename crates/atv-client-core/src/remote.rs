//! Remote-control session (port 6466).
//!
//! A session connects with the paired identity, waits for the peer's
//! configure announcement, answers with this client's own, and then sends
//! key events. Some peers follow up with a set-active request; waiting for it
//! is best-effort and its absence is not an error.
//!
//! Every failure after the host is validated is reported as
//! [`ClientError::Timeout`]: on this port an unresponsive or broken peer
//! means "device off", never "device unpaired".

use std::time::Duration;

use atv_proto::identity::ClientIdentity;
use atv_proto::messages::{self, DeviceInfo};
use atv_proto::scan::{is_set_active_request, scan_ping_request};
use atv_proto::{Direction, KeyCode};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{FramedTransport, OptionalMessage, validate_host};

/// Steps of a remote session, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Connect,
    AwaitPeerConfigure,
    SendConfigureResponse,
    OptionalSetActiveHandshake,
    SendKeyPress,
    Done,
    Failed,
}

/// Fold any failure into the timeout class, keeping caller-input errors.
fn into_timeout(err: ClientError) -> ClientError {
    match err {
        ClientError::Timeout(_) | ClientError::Validation(_) | ClientError::Precondition(_) => err,
        other => ClientError::Timeout(format!("remote session: {other}")),
    }
}

/// A handshaken remote-control connection. Send any number of keys, then
/// [`close`](Self::close).
#[derive(Debug)]
pub struct RemoteSession {
    transport: FramedTransport,
    settle_delay: Duration,
    state: RemoteState,
}

impl RemoteSession {
    /// Connect to `host` on the remote port and run the handshake.
    pub async fn connect(
        host: &str,
        identity: &ClientIdentity,
        config: &ClientConfig,
    ) -> Result<Self> {
        validate_host(host)?;
        let transport =
            FramedTransport::open(host, config.remote_port, identity, config.connect_timeout())
                .await
                .map_err(into_timeout)?;
        Self::handshake(transport, config).await
    }

    /// Run the handshake over an open transport.
    pub async fn handshake(transport: FramedTransport, config: &ClientConfig) -> Result<Self> {
        let mut session = Self {
            transport,
            settle_delay: config.settle_delay(),
            state: RemoteState::AwaitPeerConfigure,
        };
        match session.run_handshake(config).await {
            Ok(()) => Ok(session),
            Err(e) => Err(session.fail(e).await),
        }
    }

    async fn run_handshake(&mut self, config: &ClientConfig) -> Result<()> {
        let announcement = self
            .transport
            .receive_framed(config.remote_timeout())
            .await?;
        debug!(len = announcement.len(), "peer configure received");

        self.state = RemoteState::SendConfigureResponse;
        let device = DeviceInfo {
            package_name: &config.device.package_name,
            app_version: &config.device.app_version,
        };
        self.transport
            .send_framed(&messages::remote_configure(&device))
            .await?;

        self.state = RemoteState::OptionalSetActiveHandshake;
        match self
            .transport
            .receive_optional(config.optional_message_timeout())
            .await
        {
            Ok(OptionalMessage::Received(message)) => self.answer_optional(&message).await?,
            Ok(OptionalMessage::TimedOut) => debug!("no set-active request, proceeding"),
            Ok(OptionalMessage::Closed) => warn!("peer closed after configure, proceeding"),
            Err(e) => warn!(error = %e, "optional message unreadable, proceeding"),
        }

        self.state = RemoteState::SendKeyPress;
        Ok(())
    }

    async fn answer_optional(&mut self, message: &[u8]) -> Result<()> {
        if is_set_active_request(message) {
            debug!("peer requested activation");
            self.transport
                .send_framed(&messages::remote_set_active())
                .await
        } else if let Some(val1) = scan_ping_request(message) {
            debug!(val1, "answering ping");
            self.transport
                .send_framed(&messages::remote_ping_response(val1))
                .await
        } else {
            debug!(tag = message.first().copied(), "ignoring optional message");
            Ok(())
        }
    }

    pub fn state(&self) -> RemoteState {
        self.state
    }

    /// Send one key event.
    pub async fn send_key(&mut self, key: KeyCode, direction: Direction) -> Result<()> {
        if self.state != RemoteState::SendKeyPress {
            return Err(ClientError::Timeout(format!(
                "remote session not ready (state {:?})",
                self.state
            )));
        }
        match self
            .transport
            .send_framed(&messages::remote_key_inject(key, direction))
            .await
        {
            Ok(()) => {
                info!(key = %key, direction = ?direction, "key sent");
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Send a short press of `key`.
    pub async fn press(&mut self, key: KeyCode) -> Result<()> {
        self.send_key(key, Direction::Short).await
    }

    /// Wait for the settle delay so the peer processes the last key, then
    /// close the connection.
    pub async fn close(mut self) {
        tokio::time::sleep(self.settle_delay).await;
        self.transport.close().await;
        self.state = RemoteState::Done;
    }

    async fn fail(&mut self, err: ClientError) -> ClientError {
        warn!(state = ?self.state, error = %err, "remote session failed");
        self.state = RemoteState::Failed;
        self.transport.close().await;
        into_timeout(err)
    }
}

/// Connect, handshake, press `key` once and close.
pub async fn send_key_press(
    host: &str,
    identity: &ClientIdentity,
    key: KeyCode,
    config: &ClientConfig,
) -> Result<()> {
    let mut session = RemoteSession::connect(host, identity, config).await?;
    session.press(key).await?;
    session.close().await;
    Ok(())
}
