//! Backoff between verification attempts.
//!
//! The strategy is stateless and injectable; a [`BackoffScheduler`] carries
//! the per-run counter and is created fresh for every run.

use std::fmt;
use std::time::Duration;

/// Delay policy between attempts.
pub trait BackoffStrategy: Send + Sync + fmt::Debug {
    /// Delay to wait after the `failures`-th consecutive failed attempt (1-based).
    fn delay(&self, failures: u32) -> Duration;
}

/// Doubles the delay after every failed attempt, starting from `base`.
///
/// No jitter and no cap: the attempt ceiling bounds total wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometricBackoff {
    base: Duration,
}

impl GeometricBackoff {
    /// Create a geometric backoff starting at `base`.
    #[must_use]
    pub const fn new(base: Duration) -> Self {
        Self { base }
    }

    /// First delay.
    #[must_use]
    pub const fn base(&self) -> Duration {
        self.base
    }
}

impl Default for GeometricBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl BackoffStrategy for GeometricBackoff {
    fn delay(&self, failures: u32) -> Duration {
        let factor = 2u32
            .checked_pow(failures.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }
}

/// Never waits. For tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWait;

impl BackoffStrategy for NoWait {
    fn delay(&self, _failures: u32) -> Duration {
        Duration::ZERO
    }
}

/// Per-run backoff state: hands out at most `ceiling` delays.
pub struct BackoffScheduler<'a> {
    strategy: &'a dyn BackoffStrategy,
    ceiling: u32,
    issued: u32,
    total_wait: Duration,
}

impl<'a> BackoffScheduler<'a> {
    /// Create a scheduler for one run.
    #[must_use]
    pub fn new(strategy: &'a dyn BackoffStrategy, ceiling: u32) -> Self {
        Self {
            strategy,
            ceiling,
            issued: 0,
            total_wait: Duration::ZERO,
        }
    }

    /// Delay the next call would return, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<Duration> {
        (self.issued < self.ceiling).then(|| self.strategy.delay(self.issued + 1))
    }

    /// Start over for a new run.
    pub fn reset(&mut self) {
        self.issued = 0;
        self.total_wait = Duration::ZERO;
    }

    /// Delays issued so far.
    #[must_use]
    pub fn issued(&self) -> u32 {
        self.issued
    }

    /// Sum of the delays issued so far.
    #[must_use]
    pub fn total_wait(&self) -> Duration {
        self.total_wait
    }

    /// Worst-case total wait if every delay is consumed.
    #[must_use]
    pub fn max_total_wait(&self) -> Duration {
        (1..=self.ceiling).fold(Duration::ZERO, |acc, k| {
            acc.saturating_add(self.strategy.delay(k))
        })
    }
}

impl Iterator for BackoffScheduler<'_> {
    type Item = Duration;

    /// Next delay, or `None` once `ceiling` delays have been issued.
    ///
    /// The k-th call returns `strategy.delay(k)`.
    fn next(&mut self) -> Option<Duration> {
        if self.issued >= self.ceiling {
            return None;
        }
        self.issued += 1;
        let delay = self.strategy.delay(self.issued);
        self.total_wait = self.total_wait.saturating_add(delay);
        Some(delay)
    }
}
