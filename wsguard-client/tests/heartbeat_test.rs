//! Heartbeat scheduler integration tests

mod common;

use common::{EchoServer, PROBE};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use wsguard_client::WsManagerBuilder;

async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>, duration: Duration) -> Option<T> {
    tokio::time::timeout(duration, rx.recv()).await.ok().flatten()
}

#[tokio::test]
async fn test_probes_sent_periodically() {
    let server = EchoServer::start().await;
    let (open_tx, mut open_rx) = mpsc::unbounded_channel();
    let (hb_tx, mut hb_rx) = mpsc::unbounded_channel();

    let manager = WsManagerBuilder::new(server.url())
        .heartbeat_interval(Duration::from_millis(100))
        .on_open(move |_| {
            let tx = open_tx.clone();
            async move {
                let _ = tx.send(());
            }
        })
        .on_heartbeat(move |params| {
            let tx = hb_tx.clone();
            async move {
                let _ = tx.send(params.state.heartbeat_num);
            }
        })
        .connect()
        .await
        .unwrap();

    recv_within(&mut open_rx, Duration::from_secs(2)).await.expect("open event");

    // The probe counter increments by one per event
    let first = recv_within(&mut hb_rx, Duration::from_secs(2)).await.expect("probe 1");
    let second = recv_within(&mut hb_rx, Duration::from_secs(2)).await.expect("probe 2");
    let third = recv_within(&mut hb_rx, Duration::from_secs(2)).await.expect("probe 3");
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(third, 3);

    // And the probes actually reached the peer
    tokio::time::sleep(Duration::from_millis(100)).await;
    let probes = server
        .received()
        .await
        .iter()
        .filter(|m| m.as_str() == PROBE)
        .count();
    assert!(probes >= 2, "expected at least 2 probes, saw {probes}");

    manager.destroy(None, None).await;
}

#[tokio::test]
async fn test_first_probe_waits_a_full_interval() {
    let server = EchoServer::start().await;
    let (open_tx, mut open_rx) = mpsc::unbounded_channel();
    let (hb_tx, mut hb_rx) = mpsc::unbounded_channel();

    let manager = WsManagerBuilder::new(server.url())
        .heartbeat_interval(Duration::from_millis(300))
        .on_open(move |_| {
            let tx = open_tx.clone();
            async move {
                let _ = tx.send(Instant::now());
            }
        })
        .on_heartbeat(move |_| {
            let tx = hb_tx.clone();
            async move {
                let _ = tx.send(Instant::now());
            }
        })
        .connect()
        .await
        .unwrap();

    let opened = recv_within(&mut open_rx, Duration::from_secs(2)).await.expect("open event");
    let probed = recv_within(&mut hb_rx, Duration::from_secs(2)).await.expect("probe");
    assert!(probed.duration_since(opened) >= Duration::from_millis(250));

    manager.destroy(None, None).await;
}

#[tokio::test]
async fn test_interval_change_restarts_timer() {
    let server = EchoServer::start().await;
    let (open_tx, mut open_rx) = mpsc::unbounded_channel();
    let (hb_tx, mut hb_rx) = mpsc::unbounded_channel();

    // With the 5s default the first probe would be nowhere near this test's
    // horizon; shortening the interval must reschedule it.
    let manager = WsManagerBuilder::new(server.url())
        .heartbeat_interval(Duration::from_millis(5000))
        .on_open(move |_| {
            let tx = open_tx.clone();
            async move {
                let _ = tx.send(());
            }
        })
        .on_heartbeat(move |_| {
            let tx = hb_tx.clone();
            async move {
                let _ = tx.send(());
            }
        })
        .connect()
        .await
        .unwrap();

    recv_within(&mut open_rx, Duration::from_secs(2)).await.expect("open event");
    assert!(recv_within(&mut hb_rx, Duration::from_millis(200)).await.is_none());

    manager.set_heartbeat_interval(Duration::from_millis(150)).await;
    assert_eq!(manager.heartbeat_interval().await, Duration::from_millis(150));

    recv_within(&mut hb_rx, Duration::from_secs(1))
        .await
        .expect("probe under the shortened interval");

    manager.destroy(None, None).await;
}

#[tokio::test]
async fn test_heartbeat_stops_on_destroy() {
    let server = EchoServer::start().await;
    let (open_tx, mut open_rx) = mpsc::unbounded_channel();
    let (hb_tx, mut hb_rx) = mpsc::unbounded_channel();

    let manager = WsManagerBuilder::new(server.url())
        .heartbeat_interval(Duration::from_millis(100))
        .on_open(move |_| {
            let tx = open_tx.clone();
            async move {
                let _ = tx.send(());
            }
        })
        .on_heartbeat(move |_| {
            let tx = hb_tx.clone();
            async move {
                let _ = tx.send(());
            }
        })
        .connect()
        .await
        .unwrap();

    recv_within(&mut open_rx, Duration::from_secs(2)).await.expect("open event");
    recv_within(&mut hb_rx, Duration::from_secs(2)).await.expect("probe");

    manager.destroy(None, None).await;
    assert_eq!(manager.state().await.heartbeat_num, 0);

    // Drain anything in flight, then verify silence
    while hb_rx.try_recv().is_ok() {}
    assert!(recv_within(&mut hb_rx, Duration::from_millis(350)).await.is_none());
}
