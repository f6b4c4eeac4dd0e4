//! Heartbeat scheduler
//!
//! Periodically sends the configured probe payload on the current socket so
//! that silently-dead connections are detected and intermediaries do not
//! drop the idle connection. The timer is armed only while the socket is
//! open and the manager is not destroyed.
//!
//! A tick that arrives less than one configured interval after the last
//! accepted tick is rejected outright: after rapid interval changes two
//! timers could overlap briefly, and overlapping ticks must not
//! double-count probes.
//!
//! Probe send failures are swallowed here; they surface through the
//! socket's own error path.

use crate::manager::{to_message, WsManager};
use futures::SinkExt;
use std::time::Instant;
use tokio::task::JoinHandle;
use wsguard_core::EventKind;

impl WsManager {
    /// Arm the heartbeat timer, replacing any existing one
    ///
    /// The first probe fires a full interval from now.
    pub async fn start_heartbeat(&self) {
        let mut rt = self.inner.runtime.lock().await;
        if rt.destroyed {
            return;
        }
        if let Some(old) = rt.heartbeat.take() {
            old.abort();
        }
        let manager = self.clone();
        rt.heartbeat = Some(spawn_heartbeat(manager));
    }

    /// Stop the heartbeat timer and reset the probe counter
    pub async fn end_heartbeat(&self) {
        let mut rt = self.inner.runtime.lock().await;
        if let Some(handle) = rt.heartbeat.take() {
            handle.abort();
            tracing::debug!(probes = rt.heartbeat_num, "heartbeat stopped");
            rt.heartbeat_num = 0;
        }
    }

    /// One heartbeat tick: guard, count, dispatch, probe
    pub(crate) async fn heartbeat_tick(&self) {
        let (interval, data) = {
            let option = self.inner.option.read().await;
            (option.heartbeat_interval, option.heartbeat_data.clone())
        };
        {
            let mut rt = self.inner.runtime.lock().await;
            if rt.destroyed {
                return;
            }
            if let Some(last) = rt.last_heartbeat {
                if last.elapsed() < interval {
                    tracing::warn!("heartbeat tick arrived too fast, skipping");
                    return;
                }
            }
            rt.last_heartbeat = Some(Instant::now());
            rt.heartbeat_num += 1;
            tracing::debug!(probes = rt.heartbeat_num, "sending heartbeat");
        }
        if let Some(ref metrics) = self.inner.metrics {
            metrics.record_heartbeat();
        }
        self.trigger(EventKind::Heartbeat, None).await;
        // Straight onto the sink: probes are not caller sends, and a probe
        // on a dead socket must not start a retry of its own.
        let mut rt = self.inner.runtime.lock().await;
        match rt.sink.as_mut() {
            Some(sink) => {
                if let Err(e) = sink.send(to_message(data)).await {
                    tracing::warn!(error = %e, "heartbeat send failed");
                }
            }
            None => tracing::warn!("heartbeat probe with no open connection"),
        }
    }
}

fn spawn_heartbeat(manager: WsManager) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let interval = manager.heartbeat_interval().await;
            tokio::time::sleep(interval).await;
            manager.heartbeat_tick().await;
        }
    })
}
