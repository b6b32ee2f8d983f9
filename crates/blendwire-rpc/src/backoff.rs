//! Bounded exponential backoff used for liveness polling.

use std::time::Duration;

/// Retry policy: at most `max_attempts` checks, sleeping
/// `base_delay * 2^attempt` between consecutive checks.
///
/// No jitter and no upper cap; callers keep the attempt budget small.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    max_attempts: u32,
    base_delay: Duration,
}

impl Backoff {
    /// Budget used for warm health checks.
    pub const DEFAULT: Self = Self::new(5, Duration::from_millis(500));

    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Maximum number of checks.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry.
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay slept after the zero-based `attempt` fails.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Worst-case total sleep when every check fails.
    #[must_use]
    pub fn worst_case_sleep(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Runs `check` until it reports success or the budget is exhausted.
    ///
    /// `check` receives the zero-based attempt number. A check error aborts
    /// polling immediately; mapping transient failures to `Ok(false)` is the
    /// caller's job. No sleep follows the final attempt.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `check`.
    pub fn poll<P, S, E>(&self, mut check: P, mut sleep: S) -> Result<bool, E>
    where
        P: FnMut(u32) -> Result<bool, E>,
        S: FnMut(Duration),
    {
        for attempt in 0..self.max_attempts {
            if check(attempt)? {
                return Ok(true);
            }
            if attempt + 1 < self.max_attempts {
                sleep(self.delay_for(attempt));
            }
        }
        Ok(false)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::DEFAULT
    }
}
