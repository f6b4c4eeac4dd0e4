//! Keepalive client demo
//!
//! Connects to the echo server, probes it every five seconds and sends a
//! chat message every three. Kill the server while this runs to watch the
//! backoff reconnection kick in, restart it to watch the session recover.
//!
//! ```bash
//! cargo run --example echo_server   # in another terminal
//! cargo run --example keepalive_client
//! ```

use std::time::Duration;
use wsguard::{RawEvent, WsManagerBuilder};

#[tokio::main]
async fn main() -> wsguard::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wsguard_client=debug".into()),
        )
        .init();

    let manager = WsManagerBuilder::new("ws://127.0.0.1:8888/ws-test")
        .heartbeat_interval(Duration::from_secs(5))
        .reconnect_interval(Duration::from_secs(2))
        .max_reconnection_num(10)
        .on_open(|params| async move {
            tracing::info!(state = ?params.state.ready_state, "connection open");
        })
        .on_message(|params| async move {
            if let Some(RawEvent::Message(payload)) = params.event {
                tracing::info!(text = ?payload.as_text(), "message from peer");
            }
        })
        .on_heartbeat(|params| async move {
            tracing::info!(probes = params.state.heartbeat_num, "probe sent");
        })
        .on_reconnection(|params| async move {
            tracing::warn!(attempt = params.state.reconnection_num, "reconnecting");
        })
        .on_close(|params| async move {
            tracing::warn!(event = ?params.event, "connection closed");
        })
        .on_error(|params| async move {
            tracing::error!(event = ?params.event, "connection error");
        })
        .on_max_reconnection(|_| async move {
            tracing::error!("reconnection budget exhausted, giving up");
        })
        .on_destroy(|_| async move {
            tracing::info!("session destroyed");
        })
        .connect()
        .await?;

    let mut counter = 0u64;
    loop {
        tokio::time::sleep(Duration::from_secs(3)).await;
        if manager.is_destroyed().await {
            break;
        }
        counter += 1;
        let text = format!("hello #{counter}");
        match manager.send(text.as_str().into()).await {
            Ok(()) => tracing::info!(sent = %text, "message delivered"),
            Err(e) => tracing::warn!(error = %e, "send failed"),
        }
    }

    Ok(())
}
