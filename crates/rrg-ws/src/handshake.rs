//! Handshake state machine.
//!
//! Pure message-driven progression, independent of the socket:
//! `AUTH_REQ` -> credentials -> `AUTH_CORRECT` -> payload -> `RESULT`.
//! The session loop feeds it text frames and executes the returned
//! [`Action`]s.

use crate::config::{Credentials, ResultPolicy};
use crate::error::{HandshakeError, HandshakeResult, WsResult};
use crate::message::{Frame, InboundMessage, AUTH_CONFIRMED, AUTH_REQUEST};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    WaitingAuthChallenge,
    WaitingAuthConfirm,
    WaitingResult,
    /// Result stored, connection closing.
    Complete,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WaitingAuthChallenge => "waiting for auth challenge",
            Self::WaitingAuthConfirm => "waiting for auth confirmation",
            Self::WaitingResult => "waiting for result",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// What the session loop must do after a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    /// Send a text frame verbatim.
    Send(String),
    /// Close the connection. Nothing is sent after this.
    Close,
}

/// How the connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Close frame, end of stream, or our own close after the result.
    Closed,
    /// Connect, read or write failure.
    TransportError(String),
    Timeout(Duration),
    Cancelled,
}

/// Per-session handshake state.
pub struct Handshake {
    state: HandshakeState,
    credentials: Credentials,
    payload: Option<String>,
    policy: ResultPolicy,
    /// Written once, on the transition to `Complete`.
    result: Option<String>,
    last_error: Option<String>,
}

impl Handshake {
    pub fn new(credentials: Credentials, payload: impl Into<String>, policy: ResultPolicy) -> Self {
        Self {
            state: HandshakeState::WaitingAuthChallenge,
            credentials,
            payload: Some(payload.into()),
            policy,
            result: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.state == HandshakeState::Complete
    }

    /// Handle one inbound text frame.
    ///
    /// An error leaves the state untouched; it is remembered so that a
    /// later close without a result can report it.
    pub fn on_text(&mut self, text: &str) -> WsResult<Action> {
        if self.is_complete() {
            debug!("Ignoring message received after result");
            return Ok(Action::None);
        }

        let outcome = self.dispatch(text);
        if let Err(ref e) = outcome {
            self.last_error = Some(e.to_string());
        }
        outcome
    }

    fn dispatch(&mut self, text: &str) -> WsResult<Action> {
        match Frame::parse(text)? {
            Frame::AuthChallenge => Ok(self.on_auth_challenge()),
            Frame::Message(msg) if msg.is_result() => self.on_result(&msg),
            Frame::Message(msg) => Ok(self.on_marker(&msg)),
        }
    }

    fn on_marker(&mut self, msg: &InboundMessage) -> Action {
        if msg.has_empty_body() {
            debug!(kind = ?msg.kind, "Empty message body, no action");
            return Action::None;
        }

        match msg.marker() {
            Some(AUTH_REQUEST) => self.on_auth_challenge(),
            Some(AUTH_CONFIRMED) => self.on_auth_confirmed(),
            _ => {
                debug!(kind = ?msg.kind, "Unrecognized message, ignoring");
                Action::None
            }
        }
    }

    fn on_auth_challenge(&mut self) -> Action {
        if self.state != HandshakeState::WaitingAuthChallenge {
            debug!(state = %self.state, "Unexpected auth challenge, ignoring");
            return Action::None;
        }

        info!(user = %self.credentials.username(), "Auth challenge received, sending credentials");
        self.state = HandshakeState::WaitingAuthConfirm;
        Action::Send(self.credentials.as_line().to_string())
    }

    fn on_auth_confirmed(&mut self) -> Action {
        if self.state != HandshakeState::WaitingAuthConfirm {
            debug!(state = %self.state, "Unexpected auth confirmation, ignoring");
            return Action::None;
        }

        let payload = self.payload.take().unwrap_or_default();
        info!(bytes = payload.len(), "Auth confirmed, sending request");
        self.state = HandshakeState::WaitingResult;
        Action::Send(payload)
    }

    fn on_result(&mut self, msg: &InboundMessage) -> WsResult<Action> {
        if self.policy == ResultPolicy::RequireAuthConfirmed
            && self.state != HandshakeState::WaitingResult
        {
            warn!(state = %self.state, "Result received before auth completed, ignoring");
            return Ok(Action::None);
        }

        let body = msg.body_json()?;
        info!(bytes = body.len(), "Result received, closing connection");
        self.result = Some(body);
        self.state = HandshakeState::Complete;
        Ok(Action::Close)
    }

    /// Turn the final state into the caller's result.
    ///
    /// A stored result wins regardless of how the connection ended.
    pub fn finish(self, end: SessionEnd) -> HandshakeResult<String> {
        if let Some(result) = self.result {
            return Ok(result);
        }

        match end {
            SessionEnd::Closed => match self.state {
                HandshakeState::WaitingAuthConfirm => Err(HandshakeError::AuthRejected),
                state => {
                    let cause = match self.last_error {
                        Some(e) => format!("connection closed while {state} (last error: {e})"),
                        None => format!("connection closed while {state}"),
                    };
                    Err(HandshakeError::Protocol(cause))
                }
            },
            SessionEnd::TransportError(cause) => Err(HandshakeError::Transport(cause)),
            SessionEnd::Timeout(after) => Err(HandshakeError::Timeout(after)),
            SessionEnd::Cancelled => Err(HandshakeError::Cancelled),
        }
    }
}
