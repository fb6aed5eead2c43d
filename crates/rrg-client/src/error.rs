//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid handshake configuration: {0}")]
    HandshakeConfig(#[from] rrg_ws::ConfigError),

    #[error("Handshake failed: {0}")]
    Handshake(#[from] rrg_ws::HandshakeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
