//! Handshake client.
//!
//! Opens one WebSocket connection per call, feeds inbound frames to the
//! [`Handshake`] state machine and executes its actions until the
//! connection closes.

use crate::config::HandshakeConfig;
use crate::error::{ConfigError, HandshakeResult};
use crate::handshake::{Action, Handshake, SessionEnd};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

/// Collapse an outcome into the plain result string: the result on
/// success, an empty string otherwise.
pub fn result_or_empty(outcome: HandshakeResult<String>) -> String {
    outcome.unwrap_or_default()
}

/// Handshake client.
///
/// Holds validated configuration only; every `connect` call runs its own
/// session, so no state is shared between calls.
#[derive(Debug, Clone)]
pub struct HandshakeClient {
    config: HandshakeConfig,
}

impl HandshakeClient {
    /// Create a client, rejecting unusable configuration up front.
    pub fn new(config: HandshakeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        crate::init_crypto();
        Ok(Self { config })
    }

    /// Run one handshake and return the serialized `RESULT` body.
    ///
    /// Completes when the connection closes. Without a configured timeout
    /// this waits for as long as the server keeps the connection open.
    pub async fn connect(&self, payload: impl Into<String>) -> HandshakeResult<String> {
        self.connect_with_shutdown(payload, CancellationToken::new())
            .await
    }

    /// Like [`connect`](Self::connect), aborting when `shutdown` is cancelled.
    pub async fn connect_with_shutdown(
        &self,
        payload: impl Into<String>,
        shutdown: CancellationToken,
    ) -> HandshakeResult<String> {
        let credentials = self
            .config
            .credentials
            .clone()
            .ok_or(ConfigError::MissingCredentials)?;
        let mut handshake = Handshake::new(credentials, payload, self.config.result_policy);

        let end = self.run_session(&mut handshake, &shutdown).await;
        info!(state = %handshake.state(), ?end, "RRG connection closed");
        handshake.finish(end)
    }

    /// Blocking wrapper around [`connect`](Self::connect).
    ///
    /// Runs the session on a dedicated current-thread runtime, so it must
    /// not be called from inside an async context.
    pub fn connect_blocking(&self, payload: impl Into<String>) -> HandshakeResult<String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.connect(payload))
    }

    async fn run_session(
        &self,
        handshake: &mut Handshake,
        shutdown: &CancellationToken,
    ) -> SessionEnd {
        let timeout = self.config.timeout();
        let deadline = timeout.map(|t| Instant::now() + t);

        info!(url = %self.config.url, "Connecting to RRG socket");

        let connect = connect_async_tls_with_config(&self.config.url, None, true, None);
        let ws_stream = tokio::select! {
            biased;
            () = shutdown.cancelled() => return SessionEnd::Cancelled,
            () = sleep_until_deadline(deadline) => {
                return SessionEnd::Timeout(timeout.unwrap_or_default());
            }
            result = connect => match result {
                Ok((ws_stream, _response)) => ws_stream,
                Err(e) => {
                    error!(?e, "Error RRG socket: connect failed");
                    return SessionEnd::TransportError(e.to_string());
                }
            },
        };

        let (mut write, mut read) = ws_stream.split();
        info!("RRG socket opened");

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    info!("Shutdown requested, closing RRG socket");
                    self.close(&mut write, &mut read).await;
                    return SessionEnd::Cancelled;
                }

                () = sleep_until_deadline(deadline) => {
                    warn!(timeout_ms = self.config.timeout_ms, "Handshake timed out, closing RRG socket");
                    self.close(&mut write, &mut read).await;
                    return SessionEnd::Timeout(timeout.unwrap_or_default());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            debug!(bytes = text.len(), state = %handshake.state(), "Received a message");
                            match handshake.on_text(&text) {
                                Ok(Action::None) => {}
                                Ok(Action::Send(frame)) => {
                                    if let Err(e) = write.send(Message::Text(frame)).await {
                                        error!(?e, "Error RRG socket: send failed");
                                        return SessionEnd::TransportError(e.to_string());
                                    }
                                }
                                Ok(Action::Close) => {
                                    self.close(&mut write, &mut read).await;
                                    return SessionEnd::Closed;
                                }
                                Err(e) => {
                                    warn!(error = %e, "Message exception, ignoring");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                error!(?e, "Error RRG socket: pong failed");
                                return SessionEnd::TransportError(e.to_string());
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            debug!(bytes = data.len(), "Ignoring binary frame");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (u16::from(f.code), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            info!(code, %reason, "RRG socket closed by server");
                            // Flush the queued Close reply
                            if let Err(e) = write.close().await {
                                debug!(?e, "Close reply not delivered");
                            }
                            return SessionEnd::Closed;
                        }
                        Some(Err(e)) => {
                            error!(?e, "Error RRG socket: read failed");
                            return SessionEnd::TransportError(e.to_string());
                        }
                        None => {
                            warn!("RRG socket stream ended");
                            return SessionEnd::Closed;
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Send a Close frame, then drain until the server's reply or the close
    /// timeout. Inbound messages are dropped and nothing else is sent.
    async fn close(&self, write: &mut WsWrite, read: &mut WsRead) {
        if let Err(e) = write.send(Message::Close(None)).await {
            warn!(?e, "Failed to send Close frame");
            return;
        }

        let drain = async {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => debug!("Dropping message received while closing"),
                }
            }
        };

        if tokio::time::timeout(self.config.close_timeout(), drain)
            .await
            .is_err()
        {
            warn!(
                close_timeout_ms = self.config.close_timeout_ms,
                "No Close reply from server"
            );
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
