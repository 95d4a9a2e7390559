//! Internal metrics collection.
//!
//! In-memory counters read by the health endpoint; no external metrics
//! backend (observability pipelines are out of scope for this service).

use chrono::{DateTime, Utc};
use serde::Serialize;
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

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
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
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

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
}

/// Collected metrics for the tracking engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Gateway metrics
    pub events_received: Counter,
    pub batches_received: Counter,
    pub events_rejected: Counter,

    // Write metrics
    pub sessions_started: Counter,
    pub sessions_resumed: Counter,
    pub pageviews_recorded: Counter,
    pub performance_samples_recorded: Counter,
    pub custom_events_recorded: Counter,
    pub invalid_site_rejections: Counter,
    pub store_errors: Counter,

    // Rate limiter metrics
    pub rate_limit_denials: Counter,

    // Latency histograms
    pub ingest_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_received: self.events_received.get(),
            batches_received: self.batches_received.get(),
            events_rejected: self.events_rejected.get(),
            sessions_started: self.sessions_started.get(),
            sessions_resumed: self.sessions_resumed.get(),
            pageviews_recorded: self.pageviews_recorded.get(),
            performance_samples_recorded: self.performance_samples_recorded.get(),
            custom_events_recorded: self.custom_events_recorded.get(),
            invalid_site_rejections: self.invalid_site_rejections.get(),
            store_errors: self.store_errors.get(),
            rate_limit_denials: self.rate_limit_denials.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_received: u64,
    pub batches_received: u64,
    pub events_rejected: u64,
    pub sessions_started: u64,
    pub sessions_resumed: u64,
    pub pageviews_recorded: u64,
    pub performance_samples_recorded: u64,
    pub custom_events_recorded: u64,
    pub invalid_site_rejections: u64,
    pub store_errors: u64,
    pub rate_limit_denials: u64,
    pub ingest_latency_mean_ms: f64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
