//! Builder for configuring and opening a managed connection
//!
//! The builder is the only way to construct a [`WsManager`]. It validates
//! that the endpoint is something the WebSocket transport can dial, lets
//! every configuration field and event handler be set fluently, and then
//! opens the initial socket.
//!
//! `connect()` returns as soon as the initial attempt is dispatched; it does
//! not wait for the socket to open. A failed initial attempt behaves like
//! any other transport failure: the error event fires and a fast
//! reconnection attempt starts.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wsguard_client::WsManagerBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> wsguard_core::Result<()> {
//! let manager = WsManagerBuilder::new("ws://localhost:8888/ws-test")
//!     .heartbeat_interval(Duration::from_secs(5))
//!     .reconnect_interval(Duration::from_secs(2))
//!     .max_reconnection_num(-1)
//!     .on_open(|_| async move { println!("connected"); })
//!     .connect()
//!     .await?;
//! # let _ = manager;
//! # Ok(())
//! # }
//! ```

use crate::event::EventHandlers;
use crate::manager::WsManager;
use crate::metrics::ManagerMetrics;
use crate::options::ConnectionOption;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use wsguard_core::{Error, EventKind, EventParams, Payload, Result};

/// Builder for a [`WsManager`]
pub struct WsManagerBuilder {
    option: ConnectionOption,
    handlers: EventHandlers,
    metrics_service: Option<String>,
}

impl WsManagerBuilder {
    /// Create a builder for the given endpoint with default timings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            option: ConnectionOption::new(url),
            handlers: EventHandlers::new(),
            metrics_service: None,
        }
    }

    /// Period between heartbeat probes (default 5s)
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.option.heartbeat_interval = interval;
        self
    }

    /// Payload sent as a probe (default `"ping"`)
    pub fn heartbeat_data(mut self, data: impl Into<Payload>) -> Self {
        self.option.heartbeat_data = data.into();
        self
    }

    /// Text expected as the probe acknowledgment (default `"pong"`)
    pub fn heartbeat_result(mut self, result: impl Into<String>) -> Self {
        self.option.heartbeat_result = result.into();
        self
    }

    /// Base backoff unit between reconnection attempts (default 2s)
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.option.reconnect_interval = interval;
        self
    }

    /// Whether backoff shrinks as attempts accumulate (default true)
    pub fn speed_up(mut self, speed_up: bool) -> Self {
        self.option.speed_up = speed_up;
        self
    }

    /// Attempt ceiling, `-1` for unlimited (default 10)
    pub fn max_reconnection_num(mut self, max: i32) -> Self {
        self.option.max_reconnection_num = max;
        self
    }

    /// Enable OpenTelemetry metrics under the given service name
    pub fn with_metrics(mut self, service_name: impl Into<String>) -> Self {
        self.metrics_service = Some(service_name.into());
        self
    }

    /// Register a handler for an arbitrary event kind
    pub fn on<F, Fut>(self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.set(kind, handler);
        self
    }

    /// Handler for connection established
    pub fn on_open<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::Open, handler)
    }

    /// Handler for inbound payloads (heartbeat acknowledgments excluded)
    pub fn on_message<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::Message, handler)
    }

    /// Handler for the peer closing the connection
    pub fn on_close<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::Close, handler)
    }

    /// Handler for transport errors
    pub fn on_error<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::Error, handler)
    }

    /// Handler invoked each time a probe is sent
    pub fn on_heartbeat<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::Heartbeat, handler)
    }

    /// Handler invoked each time a candidate attempt starts
    pub fn on_reconnection<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::Reconnection, handler)
    }

    /// Handler invoked when the manager is destroyed
    pub fn on_destroy<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::Destroy, handler)
    }

    /// Handler invoked once when the attempt ceiling is reached
    pub fn on_max_reconnection<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on(EventKind::MaxReconnection, handler)
    }

    /// Validate the endpoint, open the initial socket and return the manager
    ///
    /// Fails only with [`Error::Unsupported`]; connection failures are
    /// handled by the reconnection machinery, not surfaced here.
    pub async fn connect(self) -> Result<WsManager> {
        validate_url(&self.option.url)?;
        let metrics = self
            .metrics_service
            .map(|name| Arc::new(ManagerMetrics::new(name)));
        let manager = WsManager::from_parts(self.option, self.handlers, metrics);
        let initial = manager.clone();
        tokio::spawn(async move {
            initial.initial_open().await;
        });
        Ok(manager)
    }
}

/// Check that the transport can dial this endpoint at all
fn validate_url(url: &str) -> Result<()> {
    let scheme_ok = {
        let lower = url.trim().to_ascii_lowercase();
        (lower.starts_with("ws://") && lower.len() > "ws://".len())
            || (lower.starts_with("wss://") && lower.len() > "wss://".len())
    };
    if scheme_ok {
        Ok(())
    } else {
        Err(Error::Unsupported(format!(
            "not a ws:// or wss:// endpoint: {url}"
        )))
    }
}
