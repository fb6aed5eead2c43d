//! Command-line client for the RRG WebSocket handshake.
//!
//! Loads configuration (TOML file plus `SOCKET`/`AUTH` environment
//! overrides), reads the RRG request document and runs one handshake.

pub mod config;
pub mod error;
pub mod payload;
pub mod request;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use payload::read_payload;
pub use request::send_request;
