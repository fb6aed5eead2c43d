//! Application configuration.

use crate::error::{AppError, AppResult};
use rrg_ws::{ConfigError, Credentials, HandshakeClient, HandshakeConfig, ResultPolicy};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Environment variable holding the WebSocket URL.
pub const SOCKET_ENV: &str = "SOCKET";
/// Environment variable holding the `AUTH <username>|<password>` line.
pub const AUTH_ENV: &str = "AUTH";
/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "RRG_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Client configuration as read from TOML and the environment.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// WebSocket URL.
    #[serde(default)]
    pub socket: Option<String>,
    /// Full credential line. Takes precedence over `username`/`password`.
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Session timeout (ms). None waits indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Wait for the server's Close reply (ms). Default: 5000.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    /// Ignore RESULT until auth is confirmed. Default: false.
    #[serde(default)]
    pub require_auth_before_result: bool,
}

fn default_close_timeout_ms() -> u64 {
    5000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            socket: None,
            auth: None,
            username: None,
            password: None,
            timeout_ms: None,
            close_timeout_ms: default_close_timeout_ms(),
            require_auth_before_result: false,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AppConfig")
            .field("socket", &self.socket)
            .field("auth", &redact(&self.auth))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("timeout_ms", &self.timeout_ms)
            .field("close_timeout_ms", &self.close_timeout_ms)
            .field("require_auth_before_result", &self.require_auth_before_result)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path: `path` argument > `RRG_CONFIG` > `config/default.toml`. A
    /// missing default file is not an error; an explicitly named one is.
    /// `SOCKET` and `AUTH` from the environment override the file.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let explicit = path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                tracing::debug!(path = DEFAULT_CONFIG_PATH, "Config file not found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Override `socket` and `auth` from `lookup` (normally the process
    /// environment). Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(socket) = non_empty(SOCKET_ENV) {
            self.socket = Some(socket);
        }
        if let Some(auth) = non_empty(AUTH_ENV) {
            self.auth = Some(auth);
        }
    }

    /// Build credentials from `auth`, or from `username`/`password`.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(ref line) = self.auth {
            return Credentials::from_auth_line(line);
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Credentials::new(username, password),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Convert into a validated handshake configuration.
    pub fn handshake_config(&self) -> Result<HandshakeConfig, ConfigError> {
        let config = HandshakeConfig {
            url: self.socket.clone().ok_or(ConfigError::MissingUrl)?,
            credentials: Some(self.credentials()?),
            timeout_ms: self.timeout_ms,
            close_timeout_ms: self.close_timeout_ms,
            result_policy: if self.require_auth_before_result {
                ResultPolicy::RequireAuthConfirmed
            } else {
                ResultPolicy::AcceptAnyTime
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the handshake client, failing on missing or invalid settings.
    pub fn client(&self) -> AppResult<HandshakeClient> {
        Ok(HandshakeClient::new(self.handshake_config()?)?)
    }
}
