//! Error types for wsguard
//!
//! The taxonomy mirrors the failure modes of a managed duplex connection:
//!
//! - **Unsupported**: the endpoint cannot be served by the WebSocket
//!   transport at all. Fatal, surfaced at construction.
//! - **NotAlive**: a send was attempted while the connection is not open.
//!   Recovered internally by a fast reconnection attempt; surfaced to the
//!   caller as the failed operation.
//! - **MaxRetriesExceeded**: the reconnection attempt ceiling was reached.
//!   Terminal; the manager destroys itself after dispatching the
//!   max-reconnection event.
//! - **Transport**: an underlying socket error. Recovered internally via
//!   the reconnection path unless the manager is destroyed.
//!
//! # Examples
//!
//! ```rust
//! use wsguard_core::Error;
//!
//! let err = Error::NotAlive("connection closed or never established".into());
//! assert!(err.to_string().contains("not alive"));
//! ```

use thiserror::Error;

/// Result type for wsguard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for connection management operations
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The endpoint is not something the WebSocket transport can dial
    ///
    /// Raised at construction time when the configured URL is not a
    /// `ws://` or `wss://` address. Nothing is retried after this.
    #[error("unsupported endpoint: {0}")]
    Unsupported(String),

    /// A send was attempted while the connection is not open
    ///
    /// Carries the human-readable state message from the snapshot taken at
    /// the time of the call. The manager starts a fast reconnection attempt
    /// as a side effect unless it is destroyed or one is already in flight.
    #[error("connection not alive: {0}")]
    NotAlive(String),

    /// The reconnection attempt ceiling was reached
    ///
    /// Dispatched through the max-reconnection event immediately before the
    /// manager destroys itself. Unlimited budgets (`-1`) never produce this.
    #[error("max reconnection attempts exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Attempts made since the last successful stabilization
        attempts: u32,
    },

    /// Underlying socket error
    ///
    /// Connect failures and I/O errors below the manager. These are absorbed
    /// into scheduled retry behaviour and only surface through the error
    /// event and failed send results.
    #[error("transport error: {0}")]
    Transport(String),
}
