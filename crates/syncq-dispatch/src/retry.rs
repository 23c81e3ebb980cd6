//! Retry policy
//!
//! Pure functions deciding how long a failed item waits before its next
//! attempt and when it is quarantined instead. Every error is treated the
//! same way; there is no transient/permanent classification.
//!
//! Backoff schedule with the defaults (`max_retries = 5`, cap 32s):
//! 2s, 4s, 8s, 16s, then quarantine on the fifth failure.

use std::time::Duration;

use syncq_core::config::QueueConfig;

/// Failed attempts after which an item is quarantined
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Backoff ceiling in seconds
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 32;

/// What to do with an item after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep the item pending and try again after `delay`
    RetryAfter(Duration),
    /// Move the item to the failed partition
    Quarantine,
}

/// Capped exponential backoff with a fixed retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    max_backoff_secs: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, max_backoff_secs: u64) -> Self {
        Self {
            max_retries,
            max_backoff_secs,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// `min(2^retry_count, max_backoff)` seconds, in integer arithmetic
    pub fn backoff_secs(&self, retry_count: u32) -> u64 {
        let exp = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        exp.min(self.max_backoff_secs)
    }

    pub fn backoff(&self, retry_count: u32) -> Duration {
        Duration::from_secs(self.backoff_secs(retry_count))
    }

    pub fn should_quarantine(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }

    /// Decision for an entry whose retry count has just been incremented
    pub fn decide(&self, retry_count: u32) -> RetryDecision {
        if self.should_quarantine(retry_count) {
            RetryDecision::Quarantine
        } else {
            RetryDecision::RetryAfter(self.backoff(retry_count))
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_MAX_BACKOFF_SECS)
    }
}

impl From<&QueueConfig> for RetryPolicy {
    fn from(config: &QueueConfig) -> Self {
        Self::new(config.max_retries, config.max_backoff_secs)
    }
}
