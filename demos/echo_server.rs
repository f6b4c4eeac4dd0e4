//! Echo peer for the keepalive client demo
//!
//! Answers the `ping` probe with `pong <unix-millis>` and echoes anything
//! else back with a fixed prefix. Run this first:
//!
//! ```bash
//! cargo run --example echo_server
//! ```
//!
//! Then run the client:
//!
//! ```bash
//! cargo run --example keepalive_client
//! ```
//!
//! Try stopping and restarting this server to watch the client reconnect.

use futures::{SinkExt, StreamExt};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let listener = TcpListener::bind("127.0.0.1:8888").await?;
    tracing::info!("echo server listening on ws://127.0.0.1:8888/ws-test");

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(async move {
            let mut ws = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::warn!(error = %e, "handshake failed");
                    return;
                }
            };
            tracing::info!(peer = %peer, "client connected");

            while let Some(message) = ws.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        tracing::info!(received = %text, "message");
                        let reply = if text == "ping" {
                            let now = SystemTime::now()
                                .duration_since(UNIX_EPOCH)
                                .map(|d| d.as_millis())
                                .unwrap_or_default();
                            format!("pong {now}")
                        } else {
                            format!("server date {text}")
                        };
                        if let Err(e) = ws.send(Message::Text(reply)).await {
                            tracing::warn!(error = %e, "send failed");
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        tracing::info!(frame = ?frame, "client closed");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "connection error");
                        break;
                    }
                }
            }
            tracing::info!(peer = %peer, "client disconnected");
        });
    }
}
