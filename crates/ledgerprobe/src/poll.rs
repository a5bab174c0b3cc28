//! Shared polling abstraction.
//!
//! One [`PollPolicy`] (interval plus timeout and/or attempt cap) drives every
//! wait in the engine: element readiness, dialog probing and cross-view
//! re-fetching. The first attempt always runs immediately; later attempts
//! sleep on the session [`Clock`] first.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Lower bound on the interval of time-bounded polls.
///
/// Keeps a zero interval from spinning against the driver.
pub const MIN_TIMED_INTERVAL: Duration = Duration::from_millis(1);

// =============================================================================
// POLICY
// =============================================================================

/// How long and how often to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Give up once this much time has elapsed
    pub timeout: Option<Duration>,
    /// Pause between attempts
    pub interval: Duration,
    /// Give up after this many attempts
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    /// Time-bounded polling
    #[must_use]
    pub const fn timeout(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            interval,
            max_attempts: None,
        }
    }

    /// Attempt-bounded polling; `attempts` is clamped to at least one
    #[must_use]
    pub fn attempts(attempts: u32, interval: Duration) -> Self {
        Self {
            timeout: None,
            interval,
            max_attempts: Some(attempts.max(1)),
        }
    }

    /// A single immediate attempt
    #[must_use]
    pub fn once() -> Self {
        Self::attempts(1, Duration::ZERO)
    }

    /// Add an attempt cap to a policy
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Start polling against `clock`
    #[must_use]
    pub fn start<'c>(&self, clock: &'c dyn Clock) -> Poller<'c> {
        Poller {
            policy: *self,
            clock,
            started: clock.elapsed(),
            attempts: 0,
        }
    }
}

// =============================================================================
// POLLER
// =============================================================================

/// In-flight poll loop state.
///
/// ```ignore
/// let mut poller = policy.start(clock);
/// while poller.next_attempt().await {
///     if ready().await { break; }
/// }
/// ```
#[derive(Debug)]
pub struct Poller<'c> {
    policy: PollPolicy,
    clock: &'c dyn Clock,
    started: Duration,
    attempts: u32,
}

impl Poller<'_> {
    /// Wait for the next attempt slot; `false` once the policy is spent
    pub async fn next_attempt(&mut self) -> bool {
        if self.attempts == 0 {
            self.attempts = 1;
            return true;
        }
        if let Some(max) = self.policy.max_attempts {
            if self.attempts >= max {
                return false;
            }
        }

        let mut pause = self.policy.interval;
        if let Some(timeout) = self.policy.timeout {
            let elapsed = self.elapsed();
            if elapsed >= timeout {
                return false;
            }
            pause = pause.max(MIN_TIMED_INTERVAL).min(timeout - elapsed);
        }

        if !pause.is_zero() {
            self.clock.sleep(pause).await;
        }
        self.attempts += 1;
        true
    }

    /// Attempts started so far
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time since polling started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed().saturating_sub(self.started)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    async fn count_attempts(policy: PollPolicy, clock: &FakeClock) -> u32 {
        let mut poller = policy.start(clock);
        while poller.next_attempt().await {}
        poller.attempts()
    }

    #[tokio::test]
    async fn test_single_attempt_never_sleeps() {
        let clock = FakeClock::new();
        assert_eq!(count_attempts(PollPolicy::once(), &clock).await, 1);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[tokio::test]
    async fn test_attempt_cap() {
        let clock = FakeClock::new();
        let attempts = count_attempts(PollPolicy::attempts(3, Duration::from_secs(1)), &clock).await;
        assert_eq!(attempts, 3);
        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_zero_attempts_clamped_to_one() {
        let clock = FakeClock::new();
        assert_eq!(count_attempts(PollPolicy::attempts(0, Duration::ZERO), &clock).await, 1);
    }

    #[tokio::test]
    async fn test_timeout_bounds_total_time() {
        let clock = FakeClock::new();
        let policy = PollPolicy::timeout(Duration::from_millis(1000), Duration::from_millis(300));
        let attempts = count_attempts(policy, &clock).await;
        // t=0, 300, 600, 900, 1000
        assert_eq!(attempts, 5);
        assert_eq!(clock.now(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_zero_timeout_still_runs_once() {
        let clock = FakeClock::new();
        let policy = PollPolicy::timeout(Duration::ZERO, Duration::from_millis(50));
        assert_eq!(count_attempts(policy, &clock).await, 1);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_interval_timed_poll_terminates() {
        let clock = FakeClock::new();
        let policy = PollPolicy::timeout(Duration::from_millis(5), Duration::ZERO);
        let attempts = count_attempts(policy, &clock).await;
        assert_eq!(attempts, 6);
    }

    #[tokio::test]
    async fn test_timeout_and_cap_whichever_first() {
        let clock = FakeClock::new();
        let policy = PollPolicy::timeout(Duration::from_secs(60), Duration::from_secs(1))
            .with_max_attempts(2);
        assert_eq!(count_attempts(policy, &clock).await, 2);
        assert_eq!(clock.now(), Duration::from_secs(1));
    }
}
