//! Prometheus metrics for the marketplace registry.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric
//! names, which is a programming error caught on first access.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

/// Gateway calls by operation and outcome.
/// Labels: op (createMarketplace/pause/...), outcome (ok or error kind)
pub static CALLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mpreg_calls_total",
        "Total calls handled by the gateway",
        &["op", "outcome"]
    )
    .unwrap()
});

/// Committed events by log name.
pub static EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mpreg_events_total",
        "Total events committed",
        &["event"]
    )
    .unwrap()
});

/// Number of registered marketplaces.
pub static MARKETPLACES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("mpreg_marketplaces", "Number of registered marketplaces").unwrap()
});

/// Pause state (1=paused, 0=running).
pub static PAUSED: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("mpreg_paused", "Registry pause state (1=paused)").unwrap());

/// Completed implementation upgrades.
pub static UPGRADES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("mpreg_upgrades_total", "Total implementation upgrades").unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a successful call.
    pub fn call_ok(op: &str) {
        CALLS_TOTAL.with_label_values(&[op, "ok"]).inc();
    }

    /// Record a failed call under its error kind.
    pub fn call_failed(op: &str, kind: &str) {
        CALLS_TOTAL.with_label_values(&[op, kind]).inc();
    }

    /// Record a committed event.
    pub fn event_committed(event: &str) {
        EVENTS_TOTAL.with_label_values(&[event]).inc();
    }

    pub fn upgrade_completed() {
        UPGRADES_TOTAL.inc();
    }

    /// Mirror registry size and pause flag.
    pub fn registry_state(marketplaces: u64, paused: bool) {
        MARKETPLACES.set(i64::try_from(marketplaces).unwrap_or(i64::MAX));
        PAUSED.set(i64::from(paused));
    }

    /// Current value of the call counter (for reports and tests).
    pub fn calls(op: &str, outcome: &str) -> f64 {
        CALLS_TOTAL.with_label_values(&[op, outcome]).get()
    }

    /// Current value of the event counter.
    pub fn events(event: &str) -> f64 {
        EVENTS_TOTAL.with_label_values(&[event]).get()
    }

    /// All registered metrics in the Prometheus text exposition format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
