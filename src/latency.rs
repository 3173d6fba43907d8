//! Simulated response latency.
//!
//! A route's [`Latency`] is a base delay plus uniform jitter in
//! `[-jitter, +jitter)`. Sampled waits below zero clamp to zero. The wait
//! is interruptible: [`Latency::wait`] returns [`Cancelled`] as soon as
//! the supplied cancellation future completes.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    base: Duration,
    jitter: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("simulated latency cancelled after {elapsed:?}")]
pub struct Cancelled {
    pub elapsed: Duration,
}

impl Latency {
    #[must_use]
    pub const fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// Routes with neither delay nor jitter skip the simulator.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.base.is_zero() && self.jitter.is_zero()
    }

    #[must_use]
    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        let jitter = i128::try_from(self.jitter.as_nanos()).unwrap_or(i128::MAX);
        let base = i128::try_from(self.base.as_nanos()).unwrap_or(i128::MAX);
        let offset = rng.gen_range(-jitter..jitter);
        let nanos = base.saturating_add(offset).max(0);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Sleep for a sampled delay unless `cancel` completes first.
    pub async fn wait<F>(&self, cancel: F) -> Result<Duration, Cancelled>
    where
        F: Future<Output = ()>,
    {
        let delay = self.sample();
        let started = tokio::time::Instant::now();
        tokio::select! {
            () = tokio::time::sleep(delay) => Ok(delay),
            () = cancel => Err(Cancelled { elapsed: started.elapsed() }),
        }
    }
}
