//! Caller-supplied configuration
//!
//! Everything here is readable and writable through accessors on the
//! manager. Changing `heartbeat_interval` restarts the heartbeat timer with
//! the new period; changing `url` affects only the next reconnection
//! attempt, never the current socket.

use std::time::Duration;
use wsguard_core::Payload;

/// Configuration for a managed connection
#[derive(Debug, Clone)]
pub struct ConnectionOption {
    /// Endpoint address, initial and for subsequent reconnection attempts
    pub url: String,
    /// Period between heartbeat probes
    pub heartbeat_interval: Duration,
    /// Payload sent as a probe
    pub heartbeat_data: Payload,
    /// Text payload expected as the probe acknowledgment; received
    /// instances are swallowed rather than forwarded as messages
    pub heartbeat_result: String,
    /// Base backoff unit between reconnection attempts
    pub reconnect_interval: Duration,
    /// Whether backoff shrinks linearly as attempts accumulate
    pub speed_up: bool,
    /// Attempt ceiling; `-1` means unlimited
    pub max_reconnection_num: i32,
}

impl ConnectionOption {
    /// Create options for the given endpoint with default timings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            heartbeat_interval: Duration::from_millis(5000),
            heartbeat_data: Payload::Text("ping".to_string()),
            heartbeat_result: "pong".to_string(),
            reconnect_interval: Duration::from_millis(2000),
            speed_up: true,
            max_reconnection_num: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let option = ConnectionOption::new("ws://localhost:8888");
        assert_eq!(option.url, "ws://localhost:8888");
        assert_eq!(option.heartbeat_interval, Duration::from_millis(5000));
        assert_eq!(option.heartbeat_data, Payload::Text("ping".to_string()));
        assert_eq!(option.heartbeat_result, "pong");
        assert_eq!(option.reconnect_interval, Duration::from_millis(2000));
        assert!(option.speed_up);
        assert_eq!(option.max_reconnection_num, 10);
    }
}
