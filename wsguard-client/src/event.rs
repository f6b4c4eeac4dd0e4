//! Event dispatch
//!
//! A registry from event kind to a single caller-supplied async handler.
//! Registering a handler for a kind replaces the previous one; a kind with
//! no handler is a no-op on dispatch. Handlers receive an [`EventParams`]
//! value: the state snapshot taken when the event fired, merged with the
//! triggering low-level event.
//!
//! The registry lock is released before a handler runs, so handlers are free
//! to call back into the manager (send, reconnect, destroy) without
//! deadlocking.
//!
//! # Examples
//!
//! ```rust
//! use wsguard_client::EventHandlers;
//! use wsguard_core::EventKind;
//!
//! let handlers = EventHandlers::new();
//! handlers.set(EventKind::Open, |params| async move {
//!     println!("open, alive = {}", params.state.alive);
//! });
//! assert!(handlers.has(EventKind::Open));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use wsguard_core::{EventKind, EventParams};

/// Type for event handler functions
pub type HandlerFn =
    Arc<dyn Fn(EventParams) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Registry of caller-overridable lifecycle event handlers
#[derive(Default)]
pub struct EventHandlers {
    handlers: RwLock<HashMap<EventKind, HandlerFn>>,
}

impl EventHandlers {
    /// Create an empty registry (every event defaults to a no-op)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the handler for an event kind
    pub fn set<F, Fut>(&self, kind: EventKind, handler: F)
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: HandlerFn = Arc::new(move |params| Box::pin(handler(params)));
        self.write_map().insert(kind, handler);
    }

    /// Invoke the handler registered for `kind`, if any
    pub async fn dispatch(&self, kind: EventKind, params: EventParams) {
        let handler = self.read_map().get(&kind).cloned();
        match handler {
            Some(handler) => handler(params).await,
            None => tracing::trace!(kind = ?kind, "no handler registered"),
        }
    }

    /// Check whether a handler is registered for an event kind
    pub fn has(&self, kind: EventKind) -> bool {
        self.read_map().contains_key(&kind)
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<EventKind, HandlerFn>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<EventKind, HandlerFn>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }
}
