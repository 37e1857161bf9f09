//! Internal telemetry for the distribution engine.
//!
//! Structured logging setup plus in-process metrics and health state that
//! the dashboard API reports on.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
