//! Cancellable delayed trigger
//!
//! A [`DelayedTrigger`] is a single re-armable timer slot. Arming it
//! replaces whatever was armed before, so at most one deadline of a given
//! kind is ever alive. The worker awaits [`DelayedTrigger::fired`] inside
//! `tokio::select!`; the future is cancel-safe and stays pending forever
//! while the slot is empty.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep_until, Instant, Sleep};

pub struct DelayedTrigger {
    name: &'static str,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl DelayedTrigger {
    pub fn new(name: &'static str) -> Self {
        Self { name, sleep: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.sleep.as_ref().map(|s| s.deadline())
    }

    /// Arms the slot to fire after `delay`, replacing any pending deadline
    pub fn arm(&mut self, delay: Duration) {
        let deadline = Instant::now() + delay;
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(sleep_until(deadline))),
        }
    }

    /// Like [`arm`](Self::arm), but never pushes an earlier deadline back
    pub fn arm_no_later(&mut self, delay: Duration) {
        let deadline = Instant::now() + delay;
        match self.deadline() {
            Some(current) if current <= deadline => {}
            _ => self.arm(delay),
        }
    }

    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    /// Resolves once the armed deadline passes, then disarms the slot
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => pending::<()>().await,
        }
    }
}
