//! Manager metrics definitions
//!
//! OpenTelemetry instruments for monitoring connection health. Metrics are
//! recorded automatically when enabled via
//! `WsManagerBuilder::with_metrics(service_name)` and exported by whatever
//! meter provider the host process installs globally.
//!
//! # Metrics Collected
//!
//! - **connection_state**: current ready state as a gauge
//!   (0=connecting, 1=open, 2=closing, 3=closed)
//! - **heartbeats_total**: heartbeat probes sent (counter)
//! - **sends_total**: payloads sent by callers (counter)
//! - **errors_total**: errors by type (counter)
//! - **reconnection_attempts**: candidate attempts started (counter)
//! - **reconnection_success**: candidates promoted to current (counter)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Meter},
    KeyValue,
};
use wsguard_core::ReadyState;

/// Connection manager metrics
pub struct ManagerMetrics {
    /// Current ready state (0=connecting, 1=open, 2=closing, 3=closed)
    pub connection_state: Gauge<i64>,
    /// Total heartbeat probes sent
    pub heartbeats_total: Counter<u64>,
    /// Total payloads sent by callers
    pub sends_total: Counter<u64>,
    /// Total errors encountered, by type
    pub errors_total: Counter<u64>,
    /// Total reconnection candidates started
    pub reconnection_attempts: Counter<u64>,
    /// Total candidates promoted to the authoritative connection
    pub reconnection_success: Counter<u64>,
}

impl ManagerMetrics {
    /// Create metrics registered under the given service name
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a caller-supplied meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("wsguard.connection.state")
                .with_description("Ready state (0=connecting, 1=open, 2=closing, 3=closed)")
                .build(),
            heartbeats_total: meter
                .u64_counter("wsguard.heartbeats.total")
                .with_description("Total heartbeat probes sent")
                .build(),
            sends_total: meter
                .u64_counter("wsguard.sends.total")
                .with_description("Total payloads sent by callers")
                .build(),
            errors_total: meter
                .u64_counter("wsguard.errors.total")
                .with_description("Total errors encountered")
                .build(),
            reconnection_attempts: meter
                .u64_counter("wsguard.reconnection.attempts")
                .with_description("Total reconnection candidates started")
                .build(),
            reconnection_success: meter
                .u64_counter("wsguard.reconnection.success")
                .with_description("Total successful reconnections")
                .build(),
        }
    }

    /// Record the current ready state
    pub fn record_state(&self, state: ReadyState) {
        self.connection_state.record(state.code() as i64, &[]);
    }

    /// Record a heartbeat probe
    pub fn record_heartbeat(&self) {
        self.heartbeats_total.add(1, &[]);
    }

    /// Record a caller send
    pub fn record_send(&self) {
        self.sends_total.add(1, &[]);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a reconnection candidate being started
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a candidate being promoted
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        // Without a global meter provider these are no-op instruments,
        // but creating and recording must not panic.
        let metrics = ManagerMetrics::new("wsguard-test");
        metrics.record_state(ReadyState::Open);
        metrics.record_heartbeat();
        metrics.record_send();
        metrics.record_error("transport");
        metrics.record_reconnection_attempt();
        metrics.record_reconnection_success();
    }
}
