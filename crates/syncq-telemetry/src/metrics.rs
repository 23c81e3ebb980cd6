//! Prometheus metrics registry for syncq
//!
//! Provides typed, labeled counters, gauges, and histograms for every
//! observable step of the dispatch queue: enqueues, push attempts and their
//! outcome, and the sizes of the pending and quarantined sets.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use syncq_core::domain::{ItemKind, Priority};

/// Outcome of a single push attempt, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The push succeeded and the item left the queue
    Success,
    /// The push failed and a retry was scheduled
    Retry,
    /// The push failed and the item was quarantined
    Quarantined,
}

impl PushOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            PushOutcome::Success => "success",
            PushOutcome::Retry => "retry",
            PushOutcome::Quarantined => "quarantined",
        }
    }
}

/// Central metrics registry holding all Prometheus metrics.
pub struct MetricsRegistry {
    registry: Registry,
    /// Counter: new pending entries by priority
    pub items_enqueued_total: IntCounterVec,
    /// Counter: push attempts by (kind, outcome)
    pub push_attempts_total: IntCounterVec,
    /// Gauge: entries currently pending
    pub pending_items: IntGauge,
    /// Gauge: entries currently quarantined
    pub failed_items: IntGauge,
    /// Histogram: push duration in seconds by outcome
    pub push_duration_seconds: HistogramVec,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("syncq".to_string()), None)?;

        let items_enqueued_total = IntCounterVec::new(
            Opts::new("items_enqueued_total", "Items accepted into the pending set"),
            &["priority"],
        )?;
        registry.register(Box::new(items_enqueued_total.clone()))?;

        let push_attempts_total = IntCounterVec::new(
            Opts::new("push_attempts_total", "Remote push attempts"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(push_attempts_total.clone()))?;

        let pending_items = IntGauge::new("pending_items", "Items waiting to be pushed")?;
        registry.register(Box::new(pending_items.clone()))?;

        let failed_items = IntGauge::new("failed_items", "Items quarantined after exhausting retries")?;
        registry.register(Box::new(failed_items.clone()))?;

        let push_duration_seconds = HistogramVec::new(
            HistogramOpts::new("push_duration_seconds", "Remote push duration in seconds")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, f64::INFINITY]),
            &["outcome"],
        )?;
        registry.register(Box::new(push_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            items_enqueued_total,
            push_attempts_total,
            pending_items,
            failed_items,
            push_duration_seconds,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Record a new pending entry.
    pub fn record_enqueued(&self, priority: Priority) {
        self.items_enqueued_total
            .with_label_values(&[priority.as_str()])
            .inc();
    }

    /// Record the outcome and duration of one push attempt.
    pub fn record_push(&self, kind: ItemKind, outcome: PushOutcome, duration_secs: f64) {
        self.push_attempts_total
            .with_label_values(&[kind.as_str(), outcome.as_str()])
            .inc();
        self.push_duration_seconds
            .with_label_values(&[outcome.as_str()])
            .observe(duration_secs);
    }

    /// Set the pending/failed gauges.
    pub fn set_queue_sizes(&self, pending: usize, failed: usize) {
        self.pending_items.set(pending as i64);
        self.failed_items.set(failed as i64);
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
