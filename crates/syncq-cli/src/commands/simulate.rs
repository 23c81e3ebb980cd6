//! Simulate command - Drive the queue with a synthetic workload
//!
//! Provides the `syncq simulate` CLI command which:
//! 1. Spawns a queue wired to a seeded flaky remote
//! 2. Feeds it a mixed workload through the event triggers
//! 3. Flushes and reports stats and quarantined items
//! 4. Optionally heals the remote, replays failures and flushes again
//!
//! Backoff delays are real, so a high failure rate can take a while.
//! Lower `--max-backoff-secs` for quicker runs.

use std::time::Instant;

use anyhow::Result;
use clap::Args;
use syncq_dispatch::{FailedItem, QueueStats};
use tracing::info;

use super::CommandContext;
use crate::output::OutputFormatter;
use crate::simulation::Simulation;

#[derive(Debug, Args)]
pub struct SimulateCommand {
    /// Number of events to generate
    #[arg(long, default_value_t = 20)]
    pub items: usize,

    /// Share of push attempts that fail (0.0 - 1.0)
    #[arg(long, default_value_t = 0.2)]
    pub failure_rate: f64,

    /// Seed for the simulated remote
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Override queue.max_retries
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Override queue.max_backoff_secs
    #[arg(long)]
    pub max_backoff_secs: Option<u64>,

    /// Heal the remote and replay quarantined items after the first flush
    #[arg(long)]
    pub replay: bool,
}

impl SimulateCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();

        let mut queue_config = ctx.config.queue.clone();
        if let Some(max_retries) = self.max_retries {
            queue_config.max_retries = max_retries;
        }
        if let Some(max_backoff_secs) = self.max_backoff_secs {
            queue_config.max_backoff_secs = max_backoff_secs;
        }

        info!(
            items = self.items,
            failure_rate = self.failure_rate,
            seed = self.seed,
            "Starting simulation"
        );

        let started = Instant::now();
        let sim = Simulation::start(queue_config, self.seed, self.failure_rate, None)?;
        sim.feed(self.items)?;
        sim.settle().await?;

        let first_stats = sim.queue().stats();
        let first_failed = sim.queue().list_failed();

        let replayed = if self.replay {
            sim.push().heal();
            let replayed = sim.queue().replay_all();
            sim.settle().await?;
            Some(replayed)
        } else {
            None
        };

        let stats = sim.queue().stats();
        let failed = sim.queue().list_failed();
        let attempts = sim.push().attempts();
        sim.queue().log_state();
        sim.shutdown().await?;
        let elapsed = started.elapsed();

        if ctx.format.is_json() {
            let json = serde_json::json!({
                "seed": self.seed,
                "events": self.items,
                "failure_rate": self.failure_rate,
                "elapsed_ms": elapsed.as_millis() as u64,
                "push_attempts": attempts,
                "first_flush": {
                    "stats": first_stats,
                    "failed": first_failed,
                },
                "replayed": replayed,
                "stats": stats,
                "failed": failed,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!(
            "Simulation finished in {:.1}s ({} push attempts)",
            elapsed.as_secs_f64(),
            attempts
        ));
        print_stats(formatter.as_ref(), &first_stats);
        print_failed(formatter.as_ref(), &first_failed);

        if let Some(replayed) = replayed {
            formatter.info("");
            formatter.success(&format!("Replayed {replayed} quarantined item(s)"));
            print_stats(formatter.as_ref(), &stats);
            print_failed(formatter.as_ref(), &failed);
        }

        if !failed.is_empty() {
            formatter.warn(&format!("{} item(s) remain quarantined", failed.len()));
        }

        Ok(())
    }
}

fn print_stats(formatter: &dyn OutputFormatter, stats: &QueueStats) {
    formatter.field("Enqueued", &stats.total_enqueued);
    formatter.field("Succeeded", &stats.total_succeeded);
    formatter.field("Retries", &stats.total_retries);
    formatter.field("Quarantined", &stats.total_failed);
    formatter.field(
        "Now",
        &format!("{} pending, {} failed", stats.pending_count, stats.failed_count),
    );
}

fn print_failed(formatter: &dyn OutputFormatter, failed: &[FailedItem]) {
    if failed.is_empty() {
        return;
    }
    formatter.info("Failed items:");
    for item in failed {
        formatter.info(&format!(
            "  {}:{} [{}] after {} attempts: {}",
            item.kind, item.id, item.priority, item.retry_count, item.last_error
        ));
    }
}
