//! Error types for the handshake client.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while handling a single inbound frame.
///
/// These never end a session on their own: the session loop logs them and
/// keeps the connection open.
#[derive(Debug, Error)]
pub enum WsError {
    #[error("Message parse error: {0}")]
    ParseError(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WsResult<T> = Result<T, WsError>;

/// Configuration rejected before connecting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing socket URL")]
    MissingUrl,

    #[error("Invalid socket URL: {0}")]
    InvalidUrl(String),

    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Why a handshake ended without a result.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("Authentication rejected: connection closed before AUTH_CORRECT")]
    AuthRejected,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handshake timed out after {0:?}")]
    Timeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Handshake cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type HandshakeResult<T> = Result<T, HandshakeError>;
