//! Inbound message types.
//!
//! The server speaks JSON text frames of the form
//! `{"MessageType": "MSG" | "RESULT", "Message": <string | value>}`, plus a
//! bare `AUTH_REQ` text frame used as the auth challenge.

use crate::error::{WsError, WsResult};
use serde::Deserialize;
use serde_json::Value;

/// Auth challenge marker.
pub const AUTH_REQUEST: &str = "AUTH_REQ";

/// Auth confirmation marker.
pub const AUTH_CONFIRMED: &str = "AUTH_CORRECT";

/// Value of the `MessageType` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "MSG")]
    Msg,
    #[serde(rename = "RESULT")]
    Result,
    /// Any other tag, including a non-string one. Marker bodies are still
    /// acted on.
    #[serde(other)]
    Other,
}

/// A parsed JSON frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// `MessageType` tag.
    pub kind: MessageKind,
    /// `Message` body, kept as raw JSON.
    pub message: Value,
}

impl InboundMessage {
    /// Check if this message carries the final result.
    pub fn is_result(&self) -> bool {
        self.kind == MessageKind::Result
    }

    /// Body as a control marker, if it is a string.
    pub fn marker(&self) -> Option<&str> {
        self.message.as_str()
    }

    /// Check if the body is empty in the loose sense: `null`, `false`,
    /// zero, or an empty string, array or object.
    pub fn has_empty_body(&self) -> bool {
        match &self.message {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        }
    }

    /// Body serialized back to JSON text, as returned to the caller.
    pub fn body_json(&self) -> WsResult<String> {
        Ok(serde_json::to_string(&self.message)?)
    }
}

/// A text frame after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Bare `AUTH_REQ` text, not JSON.
    ///
    /// Answered with credentials like the JSON form. Older clients failed to
    /// parse this frame and dropped it without replying.
    AuthChallenge,
    /// JSON message.
    Message(InboundMessage),
}

impl Frame {
    /// Parse a text frame.
    ///
    /// Anything other than the bare challenge must be a JSON object with
    /// both `MessageType` and `Message` present. A `MessageType` that is not
    /// a string parses as [`MessageKind::Other`].
    pub fn parse(text: &str) -> WsResult<Self> {
        if text == AUTH_REQUEST {
            return Ok(Self::AuthChallenge);
        }

        let value: Value = serde_json::from_str(text)?;
        let obj = value
            .as_object()
            .ok_or_else(|| WsError::ParseError(format!("expected a JSON object, got {value}")))?;

        let kind = obj
            .get("MessageType")
            .ok_or(WsError::MissingField("MessageType"))?;
        let kind = match kind {
            Value::String(_) => MessageKind::deserialize(kind)?,
            _ => MessageKind::Other,
        };

        let message = obj
            .get("Message")
            .cloned()
            .ok_or(WsError::MissingField("Message"))?;

        Ok(Self::Message(InboundMessage { kind, message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_message(text: &str) -> InboundMessage {
        match Frame::parse(text).expect("parse frame") {
            Frame::Message(msg) => msg,
            Frame::AuthChallenge => panic!("Expected JSON message"),
        }
    }

    #[test]
    fn test_bare_auth_request() {
        assert_eq!(Frame::parse("AUTH_REQ").unwrap(), Frame::AuthChallenge);
    }

    #[test]
    fn test_bare_auth_request_is_exact_match() {
        // Surrounding whitespace makes it ordinary (invalid) text.
        assert!(Frame::parse(" AUTH_REQ").is_err());
        assert!(Frame::parse("AUTH_REQ\n").is_err());
    }

    #[test]
    fn test_parse_msg_marker() {
        let msg = parse_message(r#"{"MessageType":"MSG","Message":"AUTH_CORRECT"}"#);
        assert_eq!(msg.kind, MessageKind::Msg);
        assert_eq!(msg.marker(), Some(AUTH_CONFIRMED));
        assert!(!msg.is_result());
    }

    #[test]
    fn test_parse_result_object() {
        let msg =
            parse_message(r#"{"MessageType":"RESULT","Message":{"status":"ok","rows":3}}"#);
        assert!(msg.is_result());
        assert_eq!(msg.marker(), None);
        assert_eq!(msg.message, json!({"status": "ok", "rows": 3}));
    }

    #[test]
    fn test_body_json_preserves_key_order() {
        let msg = parse_message(r#"{"MessageType":"RESULT","Message":{"zeta":1,"alpha":2}}"#);
        assert_eq!(msg.body_json().unwrap(), r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_body_json_of_string_is_quoted() {
        let msg = parse_message(r#"{"MessageType":"RESULT","Message":"done"}"#);
        assert_eq!(msg.body_json().unwrap(), r#""done""#);
    }

    #[test]
    fn test_unknown_message_type() {
        let msg = parse_message(r#"{"MessageType":"STATUS","Message":"busy"}"#);
        assert_eq!(msg.kind, MessageKind::Other);
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            Frame::parse(r#"{"Message":"AUTH_CORRECT"}"#),
            Err(WsError::MissingField("MessageType"))
        ));
        assert!(matches!(
            Frame::parse(r#"{"MessageType":"MSG"}"#),
            Err(WsError::MissingField("Message"))
        ));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(Frame::parse("hello"), Err(WsError::Json(_))));
        assert!(matches!(Frame::parse("[1,2]"), Err(WsError::ParseError(_))));
    }

    #[test]
    fn test_non_string_message_type_is_other() {
        for raw in [
            r#"{"MessageType":5,"Message":"AUTH_CORRECT"}"#,
            r#"{"MessageType":null,"Message":"AUTH_CORRECT"}"#,
            r#"{"MessageType":{"t":"RESULT"},"Message":"AUTH_CORRECT"}"#,
        ] {
            let msg = parse_message(raw);
            assert_eq!(msg.kind, MessageKind::Other, "{raw}");
            assert_eq!(msg.marker(), Some(AUTH_CONFIRMED));
        }
    }

    #[test]
    fn test_empty_bodies() {
        for body in [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!([]),
            json!({}),
        ] {
            let msg = InboundMessage {
                kind: MessageKind::Msg,
                message: body.clone(),
            };
            assert!(msg.has_empty_body(), "{body} should be empty");
        }

        for body in [json!(true), json!(1), json!("x"), json!([0]), json!({"a": 0})] {
            let msg = InboundMessage {
                kind: MessageKind::Msg,
                message: body.clone(),
            };
            assert!(!msg.has_empty_body(), "{body} should not be empty");
        }
    }
}
