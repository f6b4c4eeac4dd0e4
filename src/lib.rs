//! wsguard - resilient WebSocket connection management
//!
//! This is the convenience crate that re-exports the wsguard sub-crates.
//! Use it if you want a single dependency.
//!
//! # Architecture
//!
//! - **wsguard-core**: error taxonomy, state snapshots, event and payload
//!   types (transport-free)
//! - **wsguard-client**: the connection manager with heartbeat probing,
//!   backoff reconnection and the lifecycle event surface
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wsguard::WsManagerBuilder;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> wsguard::Result<()> {
//!     let manager = WsManagerBuilder::new("ws://localhost:8888/ws-test")
//!         .heartbeat_interval(Duration::from_secs(5))
//!         .on_message(|params| async move {
//!             println!("received: {:?}", params.event);
//!         })
//!         .connect()
//!         .await?;
//!
//!     manager.send("hello".into()).await?;
//!     manager.destroy(None, None).await;
//!     Ok(())
//! }
//! ```

pub use wsguard_client as client;
pub use wsguard_core as core;

pub use wsguard_client::{
    next_delay, ConnectionOption, EventHandlers, ManagerMetrics, WsManager, WsManagerBuilder,
    FAST_RETRY,
};
pub use wsguard_core::{
    ConnectionState, Error, EventKind, EventParams, Payload, RawEvent, ReadyState, Result,
};
