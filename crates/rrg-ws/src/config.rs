//! Handshake configuration.
//!
//! Everything the session needs is passed in explicitly and checked by
//! [`HandshakeConfig::validate`] before the first connection attempt.

use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Prefix of the credential line expected by the server.
const AUTH_PREFIX: &str = "AUTH ";

/// Credential line sent in answer to the auth challenge.
///
/// Wire format is `AUTH <username>|<password>`, sent verbatim.
#[derive(Clone)]
pub struct Credentials {
    line: Zeroizing<String>,
}

impl Credentials {
    /// Build a credential line from its parts.
    pub fn new(username: &str, password: &str) -> Result<Self, ConfigError> {
        Self::from_auth_line(&format!("{AUTH_PREFIX}{username}|{password}"))
    }

    /// Parse a complete `AUTH <username>|<password>` line.
    pub fn from_auth_line(line: &str) -> Result<Self, ConfigError> {
        if line.trim().is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        let rest = line.strip_prefix(AUTH_PREFIX).ok_or_else(|| {
            ConfigError::InvalidCredentials("expected an `AUTH ` prefix".to_string())
        })?;

        let (username, _password) = rest.split_once('|').ok_or_else(|| {
            ConfigError::InvalidCredentials("expected `<username>|<password>`".to_string())
        })?;

        if username.is_empty() {
            return Err(ConfigError::InvalidCredentials(
                "username is empty".to_string(),
            ));
        }

        Ok(Self {
            line: Zeroizing::new(line.to_string()),
        })
    }

    /// Username part, safe to log.
    pub fn username(&self) -> &str {
        self.line[AUTH_PREFIX.len()..]
            .split_once('|')
            .map(|(user, _)| user)
            .unwrap_or_default()
    }

    /// Full line as transmitted.
    pub fn as_line(&self) -> &str {
        &self.line
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// When a `RESULT` message may be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultPolicy {
    /// Accept `RESULT` in any state, even before authentication finished.
    #[default]
    AcceptAnyTime,
    /// Ignore `RESULT` until the payload has been sent.
    RequireAuthConfirmed,
}

/// Handshake client configuration.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    pub url: String,
    /// Credential line sent on `AUTH_REQ`.
    pub credentials: Option<Credentials>,
    /// Upper bound on a whole session. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
    /// How long to wait for the server's Close reply after we close.
    pub close_timeout_ms: u64,
    /// Whether `RESULT` is gated on authentication.
    pub result_policy: ResultPolicy,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            credentials: None,
            timeout_ms: None,
            close_timeout_ms: 5000,
            result_policy: ResultPolicy::default(),
        }
    }
}

impl HandshakeConfig {
    /// Config with the required fields set and defaults elsewhere.
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials: Some(credentials),
            ..Default::default()
        }
    }

    /// Check the config is usable before any connection attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(format!(
                "{url}: scheme must be ws:// or wss://"
            )));
        }
        if self.credentials.is_none() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}
