//! syncq Telemetry - Observability for the dispatch queue
//!
//! Provides:
//! - `MetricsRegistry`: Prometheus metrics (counters, gauges, histograms)
//!   fed by the dispatch worker and rendered in text exposition format

pub mod metrics;

pub use metrics::{MetricsRegistry, PushOutcome};
