//! Prometheus metrics and structured logging for the dAPI server.
//!
//! - Prometheus counters for committed and rejected updates, PSP condition
//!   checks and OEV escrow activity
//! - Structured logging with tracing, JSON in production

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
