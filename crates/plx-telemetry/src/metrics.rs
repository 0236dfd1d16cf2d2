//! Prometheus metrics for the feed client.
//!
//! Covers:
//! - Transport connection state
//! - Events delivered per event kind
//! - Decode failures (whole message, single field, trade timestamp)
//! - Events dropped by the delivery policy or a closed receiver
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error that surfaces on the
//! first access of the metric, never later.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

/// Transport connection state (1 = connected, 0 = not yet connected).
pub static WS_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("plx_ws_connected", "Pub/sub transport connection state (1=connected)")
        .unwrap()
});

/// Number of active topic subscriptions.
pub static ACTIVE_SUBSCRIPTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "plx_ws_active_subscriptions",
        "Number of active topic subscriptions"
    )
    .unwrap()
});

/// Events delivered to subscribers.
/// Labels: kind (ticker/market)
pub static EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "plx_feed_events_total",
        "Decoded events delivered to subscriber channels",
        &["kind"]
    )
    .unwrap()
});

/// Messages dropped because they could not be decoded.
pub static DECODE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "plx_feed_decode_failures_total",
        "Transport messages dropped on structural decode failure",
        &["kind"]
    )
    .unwrap()
});

/// Single fields defaulted to zero after a parse failure.
pub static FIELD_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "plx_feed_field_failures_total",
        "Ticker fields left at zero after a parse failure",
        &["field"]
    )
    .unwrap()
});

/// Trade dates that did not match the expected layout.
pub static TIMESTAMP_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "plx_feed_timestamp_failures_total",
        "Trade records delivered without a parsed timestamp"
    )
    .unwrap()
});

/// Decoded events that never reached the subscriber.
/// Labels: kind (ticker/market), reason (full/closed/cancelled)
pub static DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "plx_feed_dropped_total",
        "Decoded events not delivered to the subscriber",
        &["kind", "reason"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn ws_connected() {
        WS_CONNECTED.set(1);
    }

    pub fn active_subscriptions(count: usize) {
        ACTIVE_SUBSCRIPTIONS.set(count as i64);
    }

    pub fn event_delivered(kind: &str) {
        EVENTS_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn decode_failed(kind: &str) {
        DECODE_FAILURES_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn field_failed(field: &str) {
        FIELD_FAILURES_TOTAL.with_label_values(&[field]).inc();
    }

    pub fn timestamp_failed() {
        TIMESTAMP_FAILURES_TOTAL.inc();
    }

    pub fn event_dropped(kind: &str, reason: &str) {
        DROPPED_TOTAL.with_label_values(&[kind, reason]).inc();
    }

    /// Render the default registry in the text exposition format.
    pub fn gather_text() -> TelemetryResult<String> {
        let families = prometheus::gather();
        Ok(TextEncoder::new().encode_to_string(&families)?)
    }
}
