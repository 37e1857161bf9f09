//! Outbound request throttling.
//!
//! Two limits apply to every call made through [`RateLimiter::throttle`]:
//! admissions are spaced at least `1s / rate` apart, and at most
//! `max_in_flight` calls run at once. Callers over the in-flight ceiling
//! wait in arrival order.

use engine_core::{Error, Result};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use telemetry::{metrics, Gauge};
use tokio::sync::Semaphore;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Admissions per second
    pub rate: u32,
    /// Concurrent operations allowed
    pub max_in_flight: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: engine_core::limits::DEFAULT_RATE_LIMIT,
            max_in_flight: engine_core::limits::DEFAULT_WORKER_COUNT,
        }
    }
}

/// Spacing-plus-concurrency limiter shared by all fetchers of a pipeline.
pub struct RateLimiter {
    /// Fair (FIFO) in-flight slots
    slots: Semaphore,
    min_interval: Duration,
    /// Time of the most recent admission, reserved ahead of the sleep
    last_admission: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let rate = config.rate.max(1);
        Self {
            slots: Semaphore::new(config.max_in_flight.max(1)),
            min_interval: Duration::from_secs(1) / rate,
            last_admission: Mutex::new(None),
        }
    }

    /// Run `operation` once it is admitted.
    ///
    /// The operation's result, success or error, is returned unchanged.
    pub async fn throttle<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let permit = {
            let _waiting = GaugeGuard::new(&metrics().limiter_waiting);
            self.slots
                .acquire()
                .await
                .map_err(|_| Error::internal("rate limiter closed"))?
        };

        let admit_at = self.reserve_admission();
        tokio::time::sleep_until(admit_at).await;

        let result = {
            let _in_flight = GaugeGuard::new(&metrics().limiter_in_flight);
            operation().await
        };

        drop(permit);
        result
    }

    /// Claim the next admission slot and move the watermark to it.
    ///
    /// Reserving the slot before sleeping keeps concurrent callers from
    /// computing the same admission time.
    fn reserve_admission(&self) -> Instant {
        let mut last = self.last_admission.lock();
        let now = Instant::now();
        let admit_at = match *last {
            Some(prev) => (prev + self.min_interval).max(now),
            None => now,
        };
        *last = Some(admit_at);
        admit_at
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Holds a gauge up for the lifetime of the guard.
struct GaugeGuard<'a>(&'a Gauge);

impl<'a> GaugeGuard<'a> {
    fn new(gauge: &'a Gauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}
