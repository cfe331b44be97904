//! Prometheus metrics for the change-notification bridge.
//!
//! - Listener metrics (notifications received, decode failures, reconnects)
//! - Handler metrics (failed and panicked dispatches)
//! - Fan-out metrics (broadcasts, deliveries, evictions)
//! - WebSocket connection metrics

mod helpers;

pub use helpers::{encode_metrics, BroadcastMetrics, ListenerMetrics, WsConnectionMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "inventory";

lazy_static! {
    // ============================================================================
    // Listener Metrics
    // ============================================================================

    /// Notifications received from the upstream channel
    pub static ref NOTIFICATIONS_RECEIVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_notifications_received_total", METRIC_PREFIX),
        "Total notifications received from the upstream channel"
    ).unwrap();

    /// Payloads dropped because they were not a JSON object
    pub static ref NOTIFICATIONS_MALFORMED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_notifications_malformed_total", METRIC_PREFIX),
        "Total notifications dropped because the payload could not be decoded"
    ).unwrap();

    /// Reconnect attempts after a connect or listen failure
    pub static ref LISTENER_RECONNECTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_listener_reconnects_total", METRIC_PREFIX),
        "Total listener reconnect attempts"
    ).unwrap();

    /// 1 while the listener holds a live subscription, 0 otherwise
    pub static ref LISTENER_CONNECTED: IntGauge = register_int_gauge!(
        format!("{}_listener_connected", METRIC_PREFIX),
        "Whether the listener currently holds a live upstream subscription"
    ).unwrap();

    /// Handler invocations that did not complete cleanly, by outcome
    pub static ref HANDLER_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_handler_failures_total", METRIC_PREFIX),
        "Total handler invocations that failed",
        &["outcome"]
    ).unwrap();

    // ============================================================================
    // Fan-out Metrics
    // ============================================================================

    pub static ref BROADCASTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_broadcasts_total", METRIC_PREFIX),
        "Total broadcasts fanned out to subscribers"
    ).unwrap();

    pub static ref MESSAGES_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_delivered_total", METRIC_PREFIX),
        "Total messages successfully handed to subscribers"
    ).unwrap();

    pub static ref MESSAGES_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Total subscriber sends that failed"
    ).unwrap();

    pub static ref SUBSCRIBERS_EVICTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_subscribers_evicted_total", METRIC_PREFIX),
        "Total subscribers removed after a failed send"
    ).unwrap();

    // ============================================================================
    // WebSocket Metrics
    // ============================================================================

    pub static ref WS_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_ws_connections_active", METRIC_PREFIX),
        "Number of open WebSocket connections"
    ).unwrap();

    pub static ref WS_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_opened_total", METRIC_PREFIX),
        "Total WebSocket connections opened"
    ).unwrap();
}
