//! Core types for wsguard
//!
//! This crate holds everything shared between the connection manager and its
//! callers that does not depend on a concrete transport:
//!
//! - **error**: the error taxonomy and `Result` alias
//! - **state**: ready-state and snapshot types, event kinds, payloads
//!
//! The actual WebSocket plumbing lives in `wsguard-client`; nothing in this
//! crate touches the network.

pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::{
    describe_code, ConnectionState, EventKind, EventParams, Payload, RawEvent, ReadyState,
};
