// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the cache manager.
//!
//! Two surfaces:
//! - [`CacheMetrics`]: process-wide atomic counters owned by the manager,
//!   snapshotted via [`CacheMetrics::snapshot`] and resettable. This is
//!   what `info()` and `metrics()` return to callers.
//! - The `metrics` crate facade: counters/histograms/gauges emitted
//!   alongside, for whatever exporter the hosting application installs
//!   (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `tiercache_` prefix for all facade metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, gauge, histogram};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Rolling window of response-time samples kept for `avg_response_ms`.
const MAX_SAMPLES: usize = 1024;

/// Monotonic operation counters plus a rolling latency window.
///
/// Counters only increase, except through [`CacheMetrics::reset`].
/// Never persisted; lives and dies with the process.
#[derive(Debug)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    invalidations: AtomicU64,
    warmups: AtomicU64,
    refreshes: AtomicU64,
    started: Mutex<Instant>,
    samples: Mutex<VecDeque<Duration>>,
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            warmups: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            started: Mutex::new(Instant::now()),
            samples: Mutex::new(VecDeque::with_capacity(MAX_SAMPLES)),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_gets_total", "outcome" => "hit").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_gets_total", "outcome" => "miss").increment(1);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_errors_total").increment(1);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_operations_total", "operation" => "set").increment(1);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_operations_total", "operation" => "delete").increment(1);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_operations_total", "operation" => "invalidate").increment(1);
    }

    pub fn record_warmup(&self) {
        self.warmups.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_operations_total", "operation" => "warmup").increment(1);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        counter!("tiercache_operations_total", "operation" => "refresh").increment(1);
    }

    /// Record how long a read took, feeding `avg_response_ms`.
    pub fn record_response_time(&self, elapsed: Duration) {
        let mut samples = self.samples.lock();
        if samples.len() == MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(elapsed);
        histogram!("tiercache_get_seconds").record(elapsed.as_secs_f64());
    }

    /// Point-in-time view of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total_gets = hits + misses;
        let hit_rate = if total_gets == 0 {
            0.0
        } else {
            hits as f64 / total_gets as f64
        };
        let avg_response_ms = {
            let samples = self.samples.lock();
            if samples.is_empty() {
                0.0
            } else {
                let sum: f64 = samples.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
                sum / samples.len() as f64
            }
        };

        MetricsSnapshot {
            hits,
            misses,
            errors: self.errors.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            warmups: self.warmups.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            hit_rate,
            avg_response_ms,
            uptime_secs: self.started.lock().elapsed().as_secs(),
        }
    }

    /// Zero every counter, drop the samples and restart the uptime clock.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.sets.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.invalidations.store(0, Ordering::Relaxed);
        self.warmups.store(0, Ordering::Relaxed);
        self.refreshes.store(0, Ordering::Relaxed);
        self.samples.lock().clear();
        *self.started.lock() = Instant::now();
    }
}

/// Counter snapshot returned by `metrics()` and embedded in `info()`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub sets: u64,
    pub deletes: u64,
    pub invalidations: u64,
    pub warmups: u64,
    pub refreshes: u64,
    pub hit_rate: f64,
    pub avg_response_ms: f64,
    pub uptime_secs: u64,
}

/// Set the current memory-tier entry count gauge.
pub fn set_memory_entries(count: usize) {
    gauge!("tiercache_memory_entries").set(count as f64);
}

/// Set remote tier availability (1 = reachable config present, 0 = memory-only).
pub fn set_remote_available(available: bool) {
    gauge!("tiercache_remote_available").set(if available { 1.0 } else { 0.0 });
}

/// Record how many keys an invalidation sweep removed.
pub fn record_invalidated_keys(tier: &str, count: usize) {
    counter!(
        "tiercache_invalidated_keys_total",
        "tier" => tier.to_string()
    )
    .increment(count as u64);
}

/// Record an expiry sweep pass.
pub fn record_sweep(removed: usize) {
    counter!("tiercache_sweep_removed_total").increment(removed as u64);
    counter!("tiercache_sweeps_total").increment(1);
}
