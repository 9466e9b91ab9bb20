//! Framed TLS transport.
//!
//! `FramedTransport` owns one TLS connection to the peer and moves whole
//! messages over it: each send writes `[varint length][payload]`, each
//! receive strips the prefix. It also keeps the peer's leaf certificate from
//! the handshake, which pairing needs for the secret.
//!
//! Any `AsyncRead + AsyncWrite` stream can stand in for the TLS connection
//! via [`FramedTransport::from_stream`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use atv_proto::codec::{decode_frame, encode_frame_into};
use atv_proto::identity::ClientIdentity;
use atv_proto::tls::build_client_tls_config;
use bytes::{Buf, BytesMut};
use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Upper bound on the TLS close_notify exchange in [`FramedTransport::close`].
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Initial capacity of the receive buffer. Protocol messages are small.
const READ_BUFFER_CAPACITY: usize = 1024;

/// A byte stream the transport can frame messages over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

/// Lifecycle of a [`FramedTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Connecting,
    Ready,
    Closed,
}

/// Result of a best-effort receive.
///
/// All three outcomes are valid continuations for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionalMessage {
    Received(Vec<u8>),
    TimedOut,
    /// The peer closed the stream before sending anything.
    Closed,
}

/// Validate a host string and turn it into a TLS server name.
///
/// Accepts IP literals and DNS names. Runs before any network I/O.
pub fn validate_host(host: &str) -> Result<ServerName<'static>> {
    if host.trim().is_empty() {
        return Err(ClientError::Validation("host is empty".into()));
    }
    ServerName::try_from(host.to_string())
        .map_err(|e| ClientError::Validation(format!("invalid host {host:?}: {e}")))
}

/// Length-prefixed message transport over one TLS connection.
///
/// Received bytes are buffered inside the transport until a whole frame is
/// available, so a receive cut short by its deadline keeps any partial frame
/// for the next call.
pub struct FramedTransport {
    stream: Option<Box<dyn AsyncStream>>,
    read_buf: BytesMut,
    peer_certificate: Option<Vec<u8>>,
    state: TransportState,
}

impl FramedTransport {
    /// A transport that has not connected yet.
    pub fn new() -> Self {
        Self {
            stream: None,
            read_buf: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            peer_certificate: None,
            state: TransportState::Idle,
        }
    }

    /// Connect to `host:port` and complete the TLS handshake.
    pub async fn open(
        host: &str,
        port: u16,
        identity: &ClientIdentity,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let mut transport = Self::new();
        transport.connect(host, port, identity, connect_timeout).await?;
        Ok(transport)
    }

    /// Wrap an already-established stream. The transport starts Ready.
    pub fn from_stream<S>(stream: S, peer_certificate: Option<Vec<u8>>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            stream: Some(Box::new(stream)),
            read_buf: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            peer_certificate,
            state: TransportState::Ready,
        }
    }

    /// TCP connect plus TLS handshake, presenting `identity` as client
    /// certificate. The whole sequence is bounded by `connect_timeout`.
    pub async fn connect(
        &mut self,
        host: &str,
        port: u16,
        identity: &ClientIdentity,
        connect_timeout: Duration,
    ) -> Result<()> {
        if self.state != TransportState::Idle {
            return Err(ClientError::Connection(format!(
                "cannot connect a transport in state {:?}",
                self.state
            )));
        }
        let server_name = validate_host(host)?;
        let connector = TlsConnector::from(Arc::new(build_client_tls_config(identity)?));

        self.state = TransportState::Connecting;
        debug!(host, port, "connecting");

        let handshake = async {
            let tcp = TcpStream::connect((host, port))
                .await
                .map_err(|e| ClientError::Connection(format!("connect to {host}:{port}: {e}")))?;
            if let Err(e) = tcp.set_nodelay(true) {
                debug!(error = %e, "could not disable Nagle");
            }
            connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| ClientError::Connection(format!("TLS handshake with {host}:{port}: {e}")))
        };

        let tls = match timeout(connect_timeout, handshake).await {
            Ok(Ok(tls)) => tls,
            Ok(Err(e)) => {
                self.state = TransportState::Closed;
                return Err(e);
            }
            Err(_) => {
                self.state = TransportState::Closed;
                return Err(ClientError::Timeout(format!(
                    "connect to {host}:{port} exceeded {connect_timeout:?}"
                )));
            }
        };

        self.peer_certificate = tls
            .get_ref()
            .1
            .peer_certificates()
            .and_then(|chain| chain.first())
            .map(|leaf| leaf.to_vec());
        info!(
            host,
            port,
            peer_certificate = self.peer_certificate.is_some(),
            "connected"
        );

        self.stream = Some(Box::new(tls));
        self.state = TransportState::Ready;
        Ok(())
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// DER of the peer's leaf certificate, if the handshake captured one.
    pub fn peer_certificate(&self) -> Option<&[u8]> {
        self.peer_certificate.as_deref()
    }

    fn ready_stream(&mut self) -> Result<&mut Box<dyn AsyncStream>> {
        Ok(self.ready_parts()?.0)
    }

    fn ready_parts(&mut self) -> Result<(&mut Box<dyn AsyncStream>, &mut BytesMut)> {
        match (self.state, self.stream.as_mut()) {
            (TransportState::Ready, Some(stream)) => Ok((stream, &mut self.read_buf)),
            (state, _) => Err(ClientError::Connection(format!(
                "transport is not open (state {state:?})"
            ))),
        }
    }

    /// Write `payload` with its varint length prefix and flush.
    pub async fn send_framed(&mut self, payload: &[u8]) -> Result<()> {
        let mut buf = BytesMut::new();
        encode_frame_into(payload, &mut buf)?;

        let stream = self.ready_stream()?;
        stream
            .write_all(&buf)
            .await
            .map_err(|e| ClientError::Connection(format!("write: {e}")))?;
        stream
            .flush()
            .await
            .map_err(|e| ClientError::Connection(format!("flush: {e}")))?;
        debug!(len = payload.len(), tag = payload.first().copied(), "sent frame");
        Ok(())
    }

    /// Read one framed message within `wait`.
    pub async fn receive_framed(&mut self, wait: Duration) -> Result<Vec<u8>> {
        let (stream, buf) = self.ready_parts()?;
        match timeout(wait, read_frame(stream, buf)).await {
            Ok(Ok(Some(payload))) => Ok(payload),
            Ok(Ok(None)) => Err(ClientError::Connection(
                "peer closed the connection".into(),
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ClientError::Timeout(format!("no message within {wait:?}"))),
        }
    }

    /// Wait up to `wait` for a message the peer may or may not send.
    ///
    /// Only a broken stream or a malformed frame is an error. If the wait
    /// expires mid-frame, the bytes read so far stay buffered and the next
    /// receive completes the frame.
    pub async fn receive_optional(&mut self, wait: Duration) -> Result<OptionalMessage> {
        let (stream, buf) = self.ready_parts()?;
        match timeout(wait, read_frame(stream, buf)).await {
            Ok(Ok(Some(payload))) => Ok(OptionalMessage::Received(payload)),
            Ok(Ok(None)) => Ok(OptionalMessage::Closed),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(OptionalMessage::TimedOut),
        }
    }

    /// Shut the connection down. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            match timeout(SHUTDOWN_TIMEOUT, stream.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "shutdown failed"),
                Err(_) => debug!("shutdown timed out"),
            }
            debug!("transport closed");
        }
        self.read_buf.clear();
        self.state = TransportState::Closed;
    }
}

impl Default for FramedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FramedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedTransport")
            .field("state", &self.state)
            .field("peer_certificate", &self.peer_certificate.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

/// Read one frame into `buf` until it is complete.
///
/// `Ok(None)` means the stream ended with no buffered bytes. Cancel-safe:
/// bytes already read stay in `buf`.
async fn read_frame<S: AsyncRead + Unpin + ?Sized>(
    stream: &mut S,
    buf: &mut BytesMut,
) -> Result<Option<Vec<u8>>> {
    loop {
        if let Some((payload, consumed)) = decode_frame(buf)? {
            let payload = payload.to_vec();
            buf.advance(consumed);
            debug!(len = payload.len(), tag = payload.first().copied(), "received frame");
            return Ok(Some(payload));
        }

        let read = stream
            .read_buf(buf)
            .await
            .map_err(|e| ClientError::Connection(format!("read: {e}")))?;
        if read == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(ClientError::Connection(format!(
                "stream ended inside a frame ({} bytes buffered)",
                buf.len()
            )));
        }
    }
}
