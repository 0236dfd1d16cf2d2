//! Prometheus metrics and structured logging for the feed client.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for delivered, dropped and undecodable messages

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
