//! Integration tests for rrg-client.
//!
//! These tests drive the handshake client against a scripted WebSocket
//! server over real loopback connections.

pub mod common;
