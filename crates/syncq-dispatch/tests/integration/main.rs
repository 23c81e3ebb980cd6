//! Integration tests for syncq-dispatch
//!
//! Drives a spawned queue against a scripted remote on tokio's paused
//! clock, so backoff delays of several seconds run instantly and
//! deterministically.

mod common;

mod test_lifecycle;
mod test_ordering;
mod test_retry;
