//! Internal metrics collection.
//!
//! Counters live in memory for the life of the process and are exposed
//! through snapshots; nothing is exported to an external system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements, saturating at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [10, 50, 100, 250, 500, 1000, 2500, 5000, 10000, 30000, 60000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the distribution engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Remote endpoint
    pub endpoint_requests: Counter,
    pub endpoint_errors: Counter,
    pub endpoint_latency_ms: Histogram,

    // Pipeline
    pub lookup_entries_fetched: Counter,
    pub records_fetched: Counter,
    pub attribute_sets_fetched: Counter,
    pub attribute_failures: Counter,
    pub truncated_refreshes: Counter,

    // Refresh
    pub refreshes_completed: Counter,
    pub refreshes_failed: Counter,
    pub refresh_latency_ms: Histogram,

    // Rate limiter gauges
    pub limiter_in_flight: Gauge,
    pub limiter_waiting: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub endpoint_requests: u64,
    pub endpoint_errors: u64,
    pub endpoint_latency_mean_ms: f64,
    pub lookup_entries_fetched: u64,
    pub records_fetched: u64,
    pub attribute_sets_fetched: u64,
    pub attribute_failures: u64,
    pub truncated_refreshes: u64,
    pub refreshes_completed: u64,
    pub refreshes_failed: u64,
    pub refresh_latency_mean_ms: f64,
    pub limiter_in_flight: u64,
    pub limiter_waiting: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            endpoint_requests: self.endpoint_requests.get(),
            endpoint_errors: self.endpoint_errors.get(),
            endpoint_latency_mean_ms: self.endpoint_latency_ms.mean(),
            lookup_entries_fetched: self.lookup_entries_fetched.get(),
            records_fetched: self.records_fetched.get(),
            attribute_sets_fetched: self.attribute_sets_fetched.get(),
            attribute_failures: self.attribute_failures.get(),
            truncated_refreshes: self.truncated_refreshes.get(),
            refreshes_completed: self.refreshes_completed.get(),
            refreshes_failed: self.refreshes_failed.get(),
            refresh_latency_mean_ms: self.refresh_latency_ms.mean(),
            limiter_in_flight: self.limiter_in_flight.get(),
            limiter_waiting: self.limiter_waiting.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
