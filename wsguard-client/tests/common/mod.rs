//! Common test utilities for wsguard-client integration tests
//!
//! Provides a lightweight echo server implementing the keepalive peer
//! contract: the probe token is answered with the acknowledgment token, any
//! other text payload comes back with a fixed prefix, and connection and
//! close events are logged.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// The keepalive probe the server recognizes
pub const PROBE: &str = "ping";
/// The acknowledgment it answers probes with
pub const ACK: &str = "pong";
/// Prefix prepended to every echoed payload
pub const ECHO_PREFIX: &str = "server date ";
/// A text payload that makes the server close the connection cleanly
pub const BYE: &str = "bye";

/// Echo WebSocket server for client testing
pub struct EchoServer {
    addr: SocketAddr,
    shutdown: broadcast::Sender<()>,
    received: Arc<Mutex<Vec<String>>>,
}

impl EchoServer {
    /// Start on an ephemeral port
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener).await
    }

    /// Start on a specific address (for restart-on-same-port tests)
    pub async fn start_on(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::serve(listener).await
    }

    async fn serve(listener: TcpListener) -> Self {
        let addr = listener.local_addr().unwrap();
        let (shutdown, mut accept_shutdown) = broadcast::channel::<()>(1);
        let received = Arc::new(Mutex::new(Vec::new()));

        let shutdown_for_conns = shutdown.clone();
        let received_for_conns = Arc::clone(&received);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = accept_shutdown.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, peer)) = accepted else { break };
                        eprintln!("echo server: connection from {peer}");
                        let mut conn_shutdown = shutdown_for_conns.subscribe();
                        let received = Arc::clone(&received_for_conns);
                        tokio::spawn(async move {
                            let Ok(mut ws) = accept_async(stream).await else {
                                return;
                            };
                            loop {
                                tokio::select! {
                                    _ = conn_shutdown.recv() => break,
                                    message = ws.next() => {
                                        let Some(Ok(message)) = message else { break };
                                        match message {
                                            Message::Text(text) => {
                                                received.lock().await.push(text.clone());
                                                if text == BYE {
                                                    let frame = CloseFrame {
                                                        code: CloseCode::Normal,
                                                        reason: "bye".into(),
                                                    };
                                                    let _ = ws.send(Message::Close(Some(frame))).await;
                                                    break;
                                                }
                                                let reply = if text == PROBE {
                                                    ACK.to_string()
                                                } else {
                                                    format!("{ECHO_PREFIX}{text}")
                                                };
                                                if ws.send(Message::Text(reply)).await.is_err() {
                                                    break;
                                                }
                                            }
                                            Message::Binary(data) => {
                                                if ws.send(Message::Binary(data)).await.is_err() {
                                                    break;
                                                }
                                            }
                                            Message::Close(_) => {
                                                eprintln!("echo server: client closed");
                                                break;
                                            }
                                            _ => {}
                                        }
                                    }
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            received,
        }
    }

    /// Connection URL for this server
    pub fn url(&self) -> String {
        format!("ws://{}/ws-test", self.addr)
    }

    /// The bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Drop the listener and every live connection, abruptly
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Text payloads received so far
    pub async fn received(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }
}

/// An address nothing is listening on
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// URL for an address nothing is listening on
pub async fn dead_url() -> String {
    format!("ws://{}/ws-test", dead_addr().await)
}
