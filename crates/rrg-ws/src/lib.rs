//! WebSocket handshake client for RRG request/result exchanges.
//!
//! Drives one connection through a fixed exchange:
//! - Wait for the `AUTH_REQ` challenge, send the credential line
//! - Wait for `AUTH_CORRECT`, send the caller's payload
//! - Wait for a `RESULT` message, store its body and close
//!
//! Configuration is validated before any connection is attempted.

pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod message;

pub use client::{result_or_empty, HandshakeClient};
pub use config::{Credentials, HandshakeConfig, ResultPolicy};
pub use error::{ConfigError, HandshakeError, HandshakeResult, WsError, WsResult};
pub use handshake::{Action, Handshake, HandshakeState, SessionEnd};
pub use message::{Frame, InboundMessage, MessageKind, AUTH_CONFIRMED, AUTH_REQUEST};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Install the ring provider as the process-wide rustls default.
///
/// `wss://` connections build their TLS config from that default.
/// [`HandshakeClient::new`] calls this, so callers only need it when
/// they use rustls directly.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
