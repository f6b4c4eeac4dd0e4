//! Connection state and event types
//!
//! This module defines the point-in-time snapshot handed to every event
//! handler, the ready-state machine it is derived from, and the payload and
//! raw-event types that cross the manager boundary.
//!
//! # Ready states
//!
//! The four canonical low-level states of a duplex socket:
//!
//! ```text
//! Connecting → Open → Closing → Closed
//! ```
//!
//! `alive` is true only in `Open`. Interop code for environments that speak
//! numeric ready states goes through [`ReadyState::from_code`] /
//! [`ReadyState::code`]; an unrecognized code maps to a not-alive snapshot
//! with a generic message (see [`describe_code`]).

use serde::Serialize;

/// Low-level readiness of the managed socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ReadyState {
    /// Connection attempt in progress
    #[default]
    Connecting,
    /// Connected and able to communicate
    Open,
    /// Close handshake in progress
    Closing,
    /// Closed, or the connection never succeeded
    Closed,
}

impl ReadyState {
    /// Numeric code for this state (matches the WebSocket convention)
    pub fn code(self) -> u8 {
        match self {
            ReadyState::Connecting => 0,
            ReadyState::Open => 1,
            ReadyState::Closing => 2,
            ReadyState::Closed => 3,
        }
    }

    /// Parse a numeric ready-state code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ReadyState::Connecting),
            1 => Some(ReadyState::Open),
            2 => Some(ReadyState::Closing),
            3 => Some(ReadyState::Closed),
            _ => None,
        }
    }

    /// Map this state to its `(alive, message)` pair
    pub fn describe(self) -> (bool, &'static str) {
        match self {
            ReadyState::Connecting => (false, "connection in progress"),
            ReadyState::Open => (true, "connected and ready to communicate"),
            ReadyState::Closing => (false, "connection is closing"),
            ReadyState::Closed => (false, "connection closed or never established"),
        }
    }
}

/// Map a numeric ready-state code to its `(alive, message)` pair
///
/// Unrecognized codes map to not-alive with a generic message rather than
/// failing, matching how snapshot queries treat states they do not know.
pub fn describe_code(code: u8) -> (bool, &'static str) {
    match ReadyState::from_code(code) {
        Some(state) => state.describe(),
        None => (false, "unexpected ready state"),
    }
}

/// Point-in-time snapshot of the managed connection
///
/// Derived on demand from the manager's internal state; holding one never
/// blocks or pins the connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionState {
    /// Whether the connection is open and usable
    pub alive: bool,
    /// Human-readable description of the current state
    pub message: String,
    /// Low-level readiness of the current socket
    pub ready_state: ReadyState,
    /// Reconnection attempts made since the last successful stabilization
    pub reconnection_num: u32,
    /// Heartbeat probes sent since the heartbeat was last stopped
    pub heartbeat_num: u64,
}

/// Named lifecycle events a caller can handle
///
/// `Open`, `Message`, `Close` and `Error` mirror the socket's own lifecycle;
/// the rest are synthesized by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection established (initial open or successful reconnection)
    Open,
    /// Inbound payload received (heartbeat acknowledgments are filtered out)
    Message,
    /// Connection closed by the peer
    Close,
    /// Transport-level error
    Error,
    /// Heartbeat probe sent
    Heartbeat,
    /// New reconnection candidate started
    Reconnection,
    /// Manager destroyed, terminally
    Destroy,
    /// Reconnection attempt ceiling reached
    MaxReconnection,
}

/// A payload sent or received on the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text frame
    Text(String),
    /// Binary frame, passed through the inbound filter untouched
    Binary(Vec<u8>),
}

impl Payload {
    /// The text content, if this is a text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Binary(data)
    }
}

/// The low-level event that triggered a handler invocation
///
/// Opaque to the manager core; passed through so handlers can inspect what
/// actually happened on the wire.
#[derive(Debug, Clone)]
pub enum RawEvent {
    /// An inbound payload
    Message(Payload),
    /// A close frame (or the end of the stream, with no frame)
    Close {
        /// Close code from the peer, if any
        code: Option<u16>,
        /// Close reason from the peer, if any
        reason: Option<String>,
    },
    /// A transport error, stringified
    Error(String),
}

/// The value every event handler receives
#[derive(Debug, Clone)]
pub struct EventParams {
    /// Snapshot taken when the event fired
    pub state: ConnectionState,
    /// The triggering low-level event; `None` for synthetic events
    pub event: Option<RawEvent>,
}
