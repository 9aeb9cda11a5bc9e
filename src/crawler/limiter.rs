//! Rate limiting and cancellation for one listing walk
//!
//! A [`WalkBudget`] combines:
//! - a token bucket (sustained rate plus burst) gating every outbound request
//! - a wall-clock deadline for the whole walk
//! - a cancellation token (child of the batch token, so Ctrl-C reaches it)
//!
//! Once the deadline passes or the token is cancelled, pending and future
//! acquisitions fail immediately instead of blocking.

use crate::config::ScraperConfig;
use crate::{CancelReason, ScrapeError};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared rate budget and deadline for one walk
#[derive(Clone)]
pub struct WalkBudget {
    limiter: Arc<DirectLimiter>,
    deadline: Instant,
    cancel: CancellationToken,
}

impl WalkBudget {
    /// Creates a budget allowing `requests_per_second` with `burst`
    /// back-to-back requests, expiring `timeout` from now
    ///
    /// Zero rates or bursts are raised to one.
    pub fn new(
        requests_per_second: u32,
        burst: u32,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            deadline: Instant::now() + timeout,
            cancel,
        }
    }

    /// Builds the budget for one walk from the scraper configuration
    pub fn from_config(config: &ScraperConfig, cancel: CancellationToken) -> Self {
        Self::new(
            config.requests_per_second,
            config.burst,
            config.walk_timeout(),
            cancel,
        )
    }

    /// Fails immediately if the walk was cancelled or its deadline passed
    pub fn check(&self) -> Result<(), ScrapeError> {
        if self.cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled(CancelReason::Signal));
        }
        if Instant::now() >= self.deadline {
            return Err(ScrapeError::Cancelled(CancelReason::Deadline));
        }
        Ok(())
    }

    /// Waits for the next token
    ///
    /// # Returns
    ///
    /// * `Ok(())` - A token was available before the deadline
    /// * `Err(ScrapeError::Cancelled)` - The deadline passed or the walk was cancelled
    pub async fn acquire(&self) -> Result<(), ScrapeError> {
        self.check()?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScrapeError::Cancelled(CancelReason::Signal)),
            _ = tokio::time::sleep_until(self.deadline) => {
                Err(ScrapeError::Cancelled(CancelReason::Deadline))
            }
            _ = self.limiter.until_ready() => Ok(()),
        }
    }

    /// Runs `future` unless the walk is cancelled or times out first
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, ScrapeError> {
        self.check()?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScrapeError::Cancelled(CancelReason::Signal)),
            _ = tokio::time::sleep_until(self.deadline) => {
                Err(ScrapeError::Cancelled(CancelReason::Deadline))
            }
            output = future => Ok(output),
        }
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
