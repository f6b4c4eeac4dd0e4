//! Resilient WebSocket connection manager
//!
//! This crate keeps a logical WebSocket connection alive across transient
//! network failures. It detects half-open connections with periodic
//! heartbeat probes, retries failed connections with a configurable backoff,
//! and exposes a small event surface so callers can observe lifecycle
//! transitions without reimplementing retry logic themselves.
//!
//! # Core Features
//!
//! - **Heartbeat probes**: periodic keepalive messages with acknowledgment
//!   filtering, so intermediaries cannot silently drop the connection
//! - **Automatic reconnection**: linearly shrinking or constant backoff with
//!   a configurable attempt ceiling (or unlimited)
//! - **Fast-path retries**: a send on a dead connection immediately starts a
//!   near-instant reconnection attempt
//! - **Lifecycle events**: open/message/close/error plus the synthetic
//!   heartbeat, reconnection, destroy and max-reconnection events
//! - **Observability**: optional OpenTelemetry metrics, `tracing` throughout
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wsguard_client::WsManagerBuilder;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> wsguard_core::Result<()> {
//!     let manager = WsManagerBuilder::new("ws://localhost:8888/ws-test")
//!         .heartbeat_interval(Duration::from_secs(5))
//!         .max_reconnection_num(10)
//!         .on_message(|params| async move {
//!             println!("received: {:?}", params.event);
//!         })
//!         .on_max_reconnection(|_params| async move {
//!             eprintln!("gave up reconnecting");
//!         })
//!         .connect()
//!         .await?;
//!
//!     manager.send("hello".into()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Lifecycle
//!
//! The manager owns exactly one authoritative socket at a time. On failure
//! it opens a candidate socket; the candidate never receives traffic until
//! it reaches the open state, at which point it atomically replaces the
//! current one. `destroy()` is the single cancellation point: it clears both
//! timers, flips the destroyed flag, and nothing is ever re-armed after it.

mod builder;
mod event;
mod heartbeat;
mod manager;
mod metrics;
mod options;
mod reconnect;

pub use builder::WsManagerBuilder;
pub use event::EventHandlers;
pub use manager::WsManager;
pub use metrics::ManagerMetrics;
pub use options::ConnectionOption;
pub use reconnect::{next_delay, FAST_RETRY};

pub use wsguard_core::{
    ConnectionState, Error, EventKind, EventParams, Payload, RawEvent, ReadyState, Result,
};
