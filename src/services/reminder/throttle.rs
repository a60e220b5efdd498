use std::time::Duration;

use async_trait::async_trait;

/// Pacing between outbound reminders, kept behind a trait so runs can be
/// driven without wall-clock waits.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Called between two consecutive send attempts of one run.
    async fn pause(&self);
}

/// Waits a fixed interval between sends.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Throttle for FixedInterval {
    async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn pause(&self) {}
}
