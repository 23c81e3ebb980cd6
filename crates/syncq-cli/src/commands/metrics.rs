//! Metrics command - Print Prometheus metrics for a short run
//!
//! There is no long-lived daemon to scrape, so `syncq metrics` runs a small
//! simulated workload with a registry attached and prints the text
//! exposition once the queue has settled.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use syncq_telemetry::MetricsRegistry;

use super::CommandContext;
use crate::simulation::Simulation;

#[derive(Debug, Args)]
pub struct MetricsCommand {
    /// Number of events to generate
    #[arg(long, default_value_t = 10)]
    pub items: usize,

    /// Share of push attempts that fail (0.0 - 1.0)
    #[arg(long, default_value_t = 0.2)]
    pub failure_rate: f64,

    /// Seed for the simulated remote
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl MetricsCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);

        // Short budget so failures settle quickly.
        let mut queue_config = ctx.config.queue.clone();
        queue_config.max_retries = queue_config.max_retries.min(2);
        queue_config.max_backoff_secs = queue_config.max_backoff_secs.min(2);

        let sim = Simulation::start(
            queue_config,
            self.seed,
            self.failure_rate,
            Some(Arc::clone(&metrics)),
        )?;
        sim.feed(self.items)?;
        sim.settle().await?;
        sim.shutdown().await?;

        let text = metrics.encode()?;
        if ctx.format.is_json() {
            ctx.formatter().print_json(&serde_json::json!({ "metrics": text }));
        } else {
            print!("{text}");
        }
        Ok(())
    }
}
