//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    BROADCASTS_TOTAL, HANDLER_FAILURES_TOTAL, LISTENER_CONNECTED, LISTENER_RECONNECTS_TOTAL,
    MESSAGES_DELIVERED_TOTAL, MESSAGES_FAILED_TOTAL, NOTIFICATIONS_MALFORMED_TOTAL,
    NOTIFICATIONS_RECEIVED_TOTAL, SUBSCRIBERS_EVICTED_TOTAL, WS_CONNECTIONS_ACTIVE,
    WS_CONNECTIONS_OPENED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording listener metrics
pub struct ListenerMetrics;

impl ListenerMetrics {
    pub fn record_received() {
        NOTIFICATIONS_RECEIVED_TOTAL.inc();
    }

    pub fn record_malformed() {
        NOTIFICATIONS_MALFORMED_TOTAL.inc();
    }

    pub fn record_reconnect() {
        LISTENER_RECONNECTS_TOTAL.inc();
    }

    pub fn set_connected(connected: bool) {
        LISTENER_CONNECTED.set(if connected { 1 } else { 0 });
    }

    /// Handler returned an error
    pub fn record_handler_error() {
        HANDLER_FAILURES_TOTAL.with_label_values(&["error"]).inc();
    }

    /// Handler panicked inside its task
    pub fn record_handler_panic() {
        HANDLER_FAILURES_TOTAL.with_label_values(&["panic"]).inc();
    }
}

/// Helper struct for recording fan-out metrics
pub struct BroadcastMetrics;

impl BroadcastMetrics {
    pub fn record_broadcast(delivered: u64, failed: u64) {
        BROADCASTS_TOTAL.inc();
        MESSAGES_DELIVERED_TOTAL.inc_by(delivered);
        MESSAGES_FAILED_TOTAL.inc_by(failed);
    }

    pub fn record_evicted() {
        SUBSCRIBERS_EVICTED_TOTAL.inc();
    }
}

/// Helper struct for WebSocket connection metrics
pub struct WsConnectionMetrics;

impl WsConnectionMetrics {
    pub fn record_opened() {
        WS_CONNECTIONS_OPENED.inc();
        WS_CONNECTIONS_ACTIVE.inc();
    }

    pub fn record_closed() {
        WS_CONNECTIONS_ACTIVE.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_registered_metrics() {
        ListenerMetrics::record_received();
        BroadcastMetrics::record_broadcast(2, 1);

        let output = encode_metrics().unwrap();
        assert!(output.contains("inventory_notifications_received_total"));
        assert!(output.contains("inventory_broadcasts_total"));
    }
}
