//! Prometheus metrics and structured logging for the marketplace registry.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for gateway calls, events and upgrades
//! - Gauges mirroring registry size and pause state

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
