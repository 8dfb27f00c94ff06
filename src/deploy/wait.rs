// src/deploy/wait.rs

//! Bounded polling with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::WaitPolicy;
use crate::errors::{DeployError, Result};

/// Delays of an exponential backoff: `initial`, `initial * factor`, ...
/// capped at `max_interval`. Never ends.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    factor: f64,
}

impl Backoff {
    pub fn new(policy: &WaitPolicy) -> Self {
        Self {
            next: policy.initial.min(policy.max_interval),
            max: policy.max_interval,
            factor: policy.factor,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        // Overflow or a non-finite factor saturates at the cap.
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.factor)
            .map_or(self.max, |d| d.min(self.max));
        Some(current)
    }
}

/// Call `probe` until it yields `Some`, sleeping with backoff in between.
///
/// Errors from `probe` abort the wait immediately. Once `policy.timeout`
/// has elapsed without a result the wait fails with
/// [`DeployError::WaitTimeout`].
pub async fn poll_until<T, F, Fut>(policy: &WaitPolicy, waiting_for: &str, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let started = Instant::now();
    let mut delays = Backoff::new(policy);

    loop {
        if let Some(value) = probe().await? {
            debug!(waiting_for, elapsed = ?started.elapsed(), "wait satisfied");
            return Ok(value);
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            return Err(DeployError::WaitTimeout {
                waiting_for: waiting_for.to_string(),
                elapsed,
            });
        }

        let delay = delays
            .next()
            .unwrap_or(policy.max_interval)
            .min(policy.timeout - elapsed);
        debug!(waiting_for, ?delay, "not there yet; backing off");
        sleep(delay).await;
    }
}
