//! Clocks for session timing.
//!
//! Every wait in the engine goes through a [`Clock`], so tests can swap the
//! tokio-backed [`SystemClock`] for a [`FakeClock`] and run timeouts in
//! virtual time.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of elapsed time and sleeping
#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Time elapsed since the clock was created
    fn elapsed(&self) -> Duration;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and `tokio::time::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: sleeping advances time instantly.
///
/// Clones share the same timeline.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now_nanos: Arc<AtomicU64>,
    sleeps: Arc<AtomicU64>,
    slept_nanos: Arc<AtomicU64>,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without counting a sleep
    pub fn advance(&self, duration: Duration) {
        self.now_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Number of `sleep` calls so far
    #[must_use]
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Total time spent in `sleep`
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_nanos.load(Ordering::SeqCst))
    }

    /// Current virtual time
    #[must_use]
    pub fn now(&self) -> Duration {
        Duration::from_nanos(self.now_nanos.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn elapsed(&self) -> Duration {
        self.now()
    }

    async fn sleep(&self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.slept_nanos.fetch_add(nanos, Ordering::SeqCst);
        self.now_nanos.fetch_add(nanos, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}
