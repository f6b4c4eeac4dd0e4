//! The connection manager facade
//!
//! `WsManager` owns the current socket and wires the heartbeat scheduler,
//! reconnection scheduler and event dispatcher together. It is cheaply
//! cloneable (`Arc` internally); all clones share the same connection and
//! state, so it can be used from multiple tasks.
//!
//! # Ownership
//!
//! Exactly one socket is authoritative at any instant. During a
//! reconnection attempt a candidate socket is opened on the side; it never
//! receives traffic until it reaches the open state, at which point it
//! atomically replaces the current one under the runtime lock.
//!
//! # Timers
//!
//! The heartbeat timer and the reconnection retry chain are spawned tasks
//! whose `JoinHandle`s are kept in the runtime state and aborted on
//! cancellation. The whole retry chain (sleep, attempt, back off, attempt
//! again) is one task, so no future ever awaits a future of its own type.
//! `destroy()` is the single cancellation point: it aborts both, flips the
//! destroyed flag, and every scheduler re-checks that flag under the lock
//! before re-arming, so nothing ever runs again afterwards.

use crate::event::EventHandlers;
use crate::metrics::ManagerMetrics;
use crate::options::ConnectionOption;
use crate::reconnect::{self, FAST_RETRY};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use wsguard_core::{
    ConnectionState, Error, EventKind, EventParams, Payload, RawEvent, ReadyState, Result,
};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Mutable runtime state, owned exclusively by the manager
#[derive(Default)]
pub(crate) struct Runtime {
    /// Sender half of the authoritative socket
    pub(crate) sink: Option<WsSink>,
    /// Read-loop task for the authoritative socket
    pub(crate) reader: Option<JoinHandle<()>>,
    /// Heartbeat timer
    pub(crate) heartbeat: Option<JoinHandle<()>>,
    /// Reconnection timer / in-flight candidate attempt
    pub(crate) reconnect: Option<JoinHandle<()>>,
    pub(crate) ready_state: ReadyState,
    /// Probes sent since the heartbeat was last stopped
    pub(crate) heartbeat_num: u64,
    /// Attempts made since the last successful stabilization
    pub(crate) reconnection_num: u32,
    pub(crate) destroyed: bool,
    /// Last accepted heartbeat tick, for the re-entrancy guard
    pub(crate) last_heartbeat: Option<Instant>,
}

pub(crate) struct Inner {
    pub(crate) option: RwLock<ConnectionOption>,
    pub(crate) handlers: EventHandlers,
    pub(crate) metrics: Option<Arc<ManagerMetrics>>,
    pub(crate) runtime: Mutex<Runtime>,
}

/// Resilient connection manager over a WebSocket
///
/// Built with [`crate::WsManagerBuilder`]; see the crate docs for the
/// lifecycle. All operations are safe to call from any task.
#[derive(Clone)]
pub struct WsManager {
    pub(crate) inner: Arc<Inner>,
}

impl WsManager {
    pub(crate) fn from_parts(
        option: ConnectionOption,
        handlers: EventHandlers,
        metrics: Option<Arc<ManagerMetrics>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                option: RwLock::new(option),
                handlers,
                metrics,
                runtime: Mutex::new(Runtime::default()),
            }),
        }
    }

    // ---- snapshot / events -------------------------------------------------

    /// Compute a point-in-time state snapshot
    pub async fn state(&self) -> ConnectionState {
        let rt = self.inner.runtime.lock().await;
        let (alive, message) = rt.ready_state.describe();
        ConnectionState {
            alive,
            message: message.to_string(),
            ready_state: rt.ready_state,
            reconnection_num: rt.reconnection_num,
            heartbeat_num: rt.heartbeat_num,
        }
    }

    /// Whether the connection is currently open and usable
    pub async fn is_alive(&self) -> bool {
        self.inner.runtime.lock().await.ready_state == ReadyState::Open
    }

    /// Whether the manager has been destroyed
    pub async fn is_destroyed(&self) -> bool {
        self.inner.runtime.lock().await.destroyed
    }

    /// Register or replace the handler for a lifecycle event
    pub fn on<F, Fut>(&self, kind: EventKind, handler: F)
    where
        F: Fn(EventParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.handlers.set(kind, handler);
    }

    /// Build the current snapshot and dispatch it merged with `raw`
    pub(crate) async fn trigger(&self, kind: EventKind, raw: Option<RawEvent>) {
        let state = self.state().await;
        self.inner
            .handlers
            .dispatch(kind, EventParams { state, event: raw })
            .await;
    }

    fn record_state(&self, state: ReadyState) {
        if let Some(ref metrics) = self.inner.metrics {
            metrics.record_state(state);
        }
    }

    // ---- public operations -------------------------------------------------

    /// Send a payload on the current connection
    ///
    /// Fails with [`Error::NotAlive`] if the connection is not open; unless
    /// the manager is destroyed or a reconnection attempt is already in
    /// flight, a fast-path reconnection attempt is started as a side effect.
    pub async fn send(&self, payload: Payload) -> Result<()> {
        let state = self.state().await;
        if !state.alive {
            if let Some(ref metrics) = self.inner.metrics {
                metrics.record_error("not_alive");
            }
            self.fast_reconnect_if_idle(false).await;
            return Err(Error::NotAlive(state.message));
        }

        let message = to_message(payload);
        let mut rt = self.inner.runtime.lock().await;
        match rt.sink.as_mut() {
            Some(sink) => {
                sink.send(message)
                    .await
                    .map_err(|e| Error::Transport(e.to_string()))?;
                drop(rt);
                if let Some(ref metrics) = self.inner.metrics {
                    metrics.record_send();
                }
                Ok(())
            }
            None => Err(Error::NotAlive(
                "connection closed or never established".to_string(),
            )),
        }
    }

    /// Close the connection; alias for [`WsManager::destroy`]
    pub async fn close(&self, code: Option<u16>, reason: Option<String>) {
        self.destroy(code, reason).await;
    }

    /// Destroy the manager, terminally
    ///
    /// Closes the underlying socket with the given code and reason, stops
    /// the heartbeat and reconnection timers, and dispatches the destroy
    /// event. Idempotent in effect: the stop operations are no-ops once
    /// already stopped, but the event fires on every call.
    pub async fn destroy(&self, code: Option<u16>, reason: Option<String>) {
        tracing::info!("destroying connection manager");
        {
            let mut rt = self.inner.runtime.lock().await;
            rt.destroyed = true;
            if let Some(mut sink) = rt.sink.take() {
                let frame = CloseFrame {
                    code: code.map(CloseCode::from).unwrap_or(CloseCode::Normal),
                    reason: reason.unwrap_or_default().into(),
                };
                if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                    tracing::debug!(error = %e, "close frame not delivered");
                }
                let _ = sink.close().await;
            }
            if let Some(reader) = rt.reader.take() {
                reader.abort();
            }
            rt.ready_state = ReadyState::Closed;
        }
        self.record_state(ReadyState::Closed);
        self.end_heartbeat().await;
        self.end_reconnection().await;
        self.trigger(EventKind::Destroy, None).await;
    }

    /// Start a reconnection retry chain
    ///
    /// Optionally updates the target address first. Stops any active
    /// heartbeat, dispatches the reconnection event, then spawns the retry
    /// driver, which opens its first candidate socket after `interval`
    /// (immediately when `None`).
    pub async fn reconnection(&self, interval: Option<Duration>, url: Option<String>) {
        if let Some(url) = url {
            if !url.trim().is_empty() {
                self.inner.option.write().await.url = url;
            }
        }
        self.end_heartbeat().await;
        {
            let mut rt = self.inner.runtime.lock().await;
            if rt.destroyed {
                return;
            }
            rt.ready_state = ReadyState::Connecting;
        }
        self.record_state(ReadyState::Connecting);
        self.trigger(EventKind::Reconnection, None).await;
        if let Some(ref metrics) = self.inner.metrics {
            metrics.record_reconnection_attempt();
        }

        let mut rt = self.inner.runtime.lock().await;
        if rt.destroyed {
            return;
        }
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            manager.retry_loop(interval).await;
        });
        // The spawned task blocks on this lock before it can mutate
        // anything, so the handle is registered before the attempt runs.
        if let Some(old) = rt.reconnect.replace(handle) {
            old.abort();
        }
    }

    /// Stop any pending reconnection and reset the attempt counter
    pub async fn end_reconnection(&self) {
        let mut rt = self.inner.runtime.lock().await;
        if let Some(handle) = rt.reconnect.take() {
            handle.abort();
            tracing::debug!("reconnection stopped");
        }
        rt.reconnection_num = 0;
    }

    /// Compute the wait the scheduler would use for the next attempt
    pub async fn calc_reconnection_interval(&self) -> Duration {
        let (interval, speed_up, max) = {
            let option = self.inner.option.read().await;
            (
                option.reconnect_interval,
                option.speed_up,
                option.max_reconnection_num,
            )
        };
        let attempts = self.inner.runtime.lock().await.reconnection_num;
        reconnect::next_delay(interval, speed_up, max, attempts)
    }

    // ---- connection attempts -----------------------------------------------

    /// Open the very first socket; called once from the builder
    pub(crate) async fn initial_open(&self) {
        let url = self.url().await;
        tracing::info!(url = %url, "opening connection");
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => self.promote(stream).await,
            Err(e) => {
                tracing::warn!(error = %e, "initial connection failed");
                {
                    let mut rt = self.inner.runtime.lock().await;
                    rt.ready_state = ReadyState::Closed;
                }
                if let Some(ref metrics) = self.inner.metrics {
                    metrics.record_error("transport");
                }
                self.trigger(EventKind::Error, Some(RawEvent::Error(e.to_string())))
                    .await;
                self.fast_reconnect_if_idle(true).await;
            }
        }
    }

    /// Drive the retry chain: attempt, back off, attempt again
    ///
    /// One task owns the whole chain; `rt.reconnect` is its handle. Runs
    /// until a candidate is promoted, the ceiling is reached, or the
    /// manager is destroyed. The first attempt was announced by the caller;
    /// each later attempt re-announces itself after its backoff has been
    /// slept.
    async fn retry_loop(self, initial_delay: Option<Duration>) {
        let mut delay = initial_delay;
        let mut announced = true;
        loop {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            if self.inner.runtime.lock().await.destroyed {
                return;
            }
            if !announced {
                {
                    let mut rt = self.inner.runtime.lock().await;
                    rt.ready_state = ReadyState::Connecting;
                }
                self.record_state(ReadyState::Connecting);
                self.trigger(EventKind::Reconnection, None).await;
                if let Some(ref metrics) = self.inner.metrics {
                    metrics.record_reconnection_attempt();
                }
            }
            announced = false;

            let url = self.url().await;
            tracing::info!(url = %url, "attempting reconnection");
            match connect_async(url.as_str()).await {
                Ok((stream, _)) => {
                    tracing::info!("reconnected");
                    if let Some(ref metrics) = self.inner.metrics {
                        metrics.record_reconnection_success();
                    }
                    self.promote(stream).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "reconnection attempt failed");
                    match self.candidate_failed(e.to_string()).await {
                        Some(next) => delay = Some(next),
                        None => return,
                    }
                }
            }
        }
    }

    /// Promote an open socket to authoritative
    ///
    /// Resets the attempt counter, dispatches the open event and restarts
    /// the heartbeat, whose first probe fires a full interval later
    /// (fresh-connection semantics).
    // Boxed rather than `async fn` so the future cycle through the spawned
    // read loop has a named `Send` type the compiler can check.
    fn promote(
        &self,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ) -> futures::future::BoxFuture<'_, ()> {
        Box::pin(async move {
            let (sink, read) = stream.split();
            {
                let mut rt = self.inner.runtime.lock().await;
                if rt.destroyed {
                    // Destroyed while the candidate was connecting; drop it.
                    return;
                }
                if let Some(old) = rt.reader.take() {
                    old.abort();
                }
                rt.sink = Some(sink);
                rt.ready_state = ReadyState::Open;
                // This may be running inside the task rt.reconnect refers to,
                // so take the handle without aborting it.
                rt.reconnect.take();
                rt.reconnection_num = 0;
                let manager = self.clone();
                rt.reader = Some(tokio::spawn(async move {
                    manager.read_loop(read).await;
                }));
            }
            self.record_state(ReadyState::Open);
            self.trigger(EventKind::Open, None).await;
            self.start_heartbeat().await;
        })
    }

    /// Bookkeeping for a candidate that failed to open
    ///
    /// Returns the backoff before the next attempt, or `None` when the
    /// chain must end (ceiling reached or manager destroyed).
    async fn candidate_failed(&self, error: String) -> Option<Duration> {
        let (interval, speed_up, max) = {
            let option = self.inner.option.read().await;
            (
                option.reconnect_interval,
                option.speed_up,
                option.max_reconnection_num,
            )
        };
        let (ceiling_reached, destroyed, attempts) = {
            let mut rt = self.inner.runtime.lock().await;
            rt.ready_state = ReadyState::Closed;
            let previous = rt.reconnection_num;
            rt.reconnection_num = previous + 1;
            let reached =
                (previous as i64 >= max as i64 || rt.destroyed) && max != -1;
            if reached {
                // This runs inside the task rt.reconnect refers to; take the
                // handle without aborting it, or destroy() would cancel us.
                rt.reconnect.take();
            }
            (reached, rt.destroyed, rt.reconnection_num)
        };
        if let Some(ref metrics) = self.inner.metrics {
            metrics.record_error("reconnection");
        }

        if ceiling_reached {
            tracing::warn!(attempts, max, "max reconnection attempts reached");
            let err = Error::MaxRetriesExceeded { attempts };
            self.trigger(EventKind::MaxReconnection, Some(RawEvent::Error(err.to_string())))
                .await;
            if !destroyed {
                self.destroy(None, None).await;
            }
            return None;
        }
        if destroyed {
            return None;
        }

        let delay = reconnect::next_delay(interval, speed_up, max, attempts);
        tracing::info!(
            attempt = attempts,
            max,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "scheduling next reconnection attempt"
        );
        Some(delay)
    }

    /// Start a fast-path attempt if not destroyed and none is in flight
    ///
    /// `bump` pre-increments the attempt counter (socket-error semantics;
    /// the send-failure path does not count as an attempt by itself).
    pub(crate) async fn fast_reconnect_if_idle(&self, bump: bool) {
        let should = {
            let mut rt = self.inner.runtime.lock().await;
            if rt.destroyed || rt.reconnect.is_some() {
                false
            } else {
                if bump {
                    rt.reconnection_num += 1;
                }
                true
            }
        };
        if should {
            self.reconnection(Some(FAST_RETRY), None).await;
        }
    }

    // ---- socket callbacks --------------------------------------------------

    /// Read loop for the authoritative socket; one task per socket
    async fn read_loop(self, mut read: WsStream) {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let expected = self.heartbeat_result().await;
                    if text == expected {
                        // Keepalive acknowledgment, swallowed by design
                        tracing::debug!("heartbeat acknowledged");
                        continue;
                    }
                    self.trigger(
                        EventKind::Message,
                        Some(RawEvent::Message(Payload::Text(text))),
                    )
                    .await;
                }
                Ok(Message::Binary(data)) => {
                    self.trigger(
                        EventKind::Message,
                        Some(RawEvent::Message(Payload::Binary(data))),
                    )
                    .await;
                }
                Ok(Message::Close(frame)) => {
                    self.on_socket_close(frame).await;
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    self.on_socket_error(e.to_string()).await;
                    return;
                }
            }
        }
        self.on_socket_close(None).await;
    }

    /// Peer closed the connection deliberately: no retry
    async fn on_socket_close(&self, frame: Option<CloseFrame<'static>>) {
        {
            let mut rt = self.inner.runtime.lock().await;
            rt.ready_state = ReadyState::Closed;
            rt.sink = None;
            // We are the reader task; drop the handle without aborting.
            rt.reader.take();
        }
        self.record_state(ReadyState::Closed);
        let raw = RawEvent::Close {
            code: frame.as_ref().map(|f| u16::from(f.code)),
            reason: frame
                .map(|f| f.reason.into_owned())
                .filter(|r| !r.is_empty()),
        };
        tracing::info!("connection closed by peer");
        self.trigger(EventKind::Close, Some(raw)).await;
        self.end_heartbeat().await;
        self.end_reconnection().await;
    }

    /// Transport failure: retry unless destroyed or already retrying
    async fn on_socket_error(&self, error: String) {
        {
            let mut rt = self.inner.runtime.lock().await;
            rt.ready_state = ReadyState::Closed;
            rt.sink = None;
            rt.reader.take();
        }
        self.record_state(ReadyState::Closed);
        if let Some(ref metrics) = self.inner.metrics {
            metrics.record_error("transport");
        }
        tracing::warn!(error = %error, "connection error");
        self.trigger(EventKind::Error, Some(RawEvent::Error(error))).await;
        self.end_heartbeat().await;
        self.fast_reconnect_if_idle(true).await;
    }

    // ---- configuration accessors -------------------------------------------

    /// Current target address
    pub async fn url(&self) -> String {
        self.inner.option.read().await.url.clone()
    }

    /// Update the target address; affects only the next reconnection
    /// attempt, never the current socket
    pub async fn set_url(&self, url: impl Into<String>) {
        self.inner.option.write().await.url = url.into();
    }

    /// Current heartbeat period
    pub async fn heartbeat_interval(&self) -> Duration {
        self.inner.option.read().await.heartbeat_interval
    }

    /// Update the heartbeat period, restarting the timer with it
    pub async fn set_heartbeat_interval(&self, interval: Duration) {
        let previous = {
            let mut option = self.inner.option.write().await;
            std::mem::replace(&mut option.heartbeat_interval, interval)
        };
        tracing::debug!(
            previous_ms = previous.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "heartbeat interval updated"
        );
        let restart = {
            let rt = self.inner.runtime.lock().await;
            !rt.destroyed && (rt.heartbeat.is_some() || rt.ready_state == ReadyState::Open)
        };
        if restart {
            self.start_heartbeat().await;
        }
    }

    /// Current probe payload
    pub async fn heartbeat_data(&self) -> Payload {
        self.inner.option.read().await.heartbeat_data.clone()
    }

    /// Update the probe payload
    pub async fn set_heartbeat_data(&self, data: Payload) {
        self.inner.option.write().await.heartbeat_data = data;
    }

    /// Text payload recognized as the probe acknowledgment
    pub async fn heartbeat_result(&self) -> String {
        self.inner.option.read().await.heartbeat_result.clone()
    }

    /// Update the expected probe acknowledgment
    pub async fn set_heartbeat_result(&self, result: impl Into<String>) {
        self.inner.option.write().await.heartbeat_result = result.into();
    }

    /// Base backoff unit between reconnection attempts
    pub async fn reconnect_interval(&self) -> Duration {
        self.inner.option.read().await.reconnect_interval
    }

    /// Update the base backoff unit
    pub async fn set_reconnect_interval(&self, interval: Duration) {
        self.inner.option.write().await.reconnect_interval = interval;
    }

    /// Whether backoff shrinks as attempts accumulate
    pub async fn speed_up(&self) -> bool {
        self.inner.option.read().await.speed_up
    }

    /// Toggle shrinking backoff
    pub async fn set_speed_up(&self, speed_up: bool) {
        self.inner.option.write().await.speed_up = speed_up;
    }

    /// Attempt ceiling; `-1` means unlimited
    pub async fn max_reconnection_num(&self) -> i32 {
        self.inner.option.read().await.max_reconnection_num
    }

    /// Update the attempt ceiling
    pub async fn set_max_reconnection_num(&self, max: i32) {
        self.inner.option.write().await.max_reconnection_num = max;
    }
}

pub(crate) fn to_message(payload: Payload) -> Message {
    match payload {
        Payload::Text(text) => Message::Text(text),
        Payload::Binary(data) => Message::Binary(data),
    }
}
