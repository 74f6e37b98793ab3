//! Stats (C12): lock-free atomic counters plus a running latency
//! min/max/sum, sampled periodically by `T_stats` and logged. Each
//! counter sits on its own cache line to keep independent counters
//! from false-sharing across the ingress/publish/stats threads that
//! increment them concurrently.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Stats {
    orders_received: CachePadded<AtomicU64>,
    orders_accepted: CachePadded<AtomicU64>,
    orders_rejected: CachePadded<AtomicU64>,
    reports_published: CachePadded<AtomicU64>,
    fills_published: CachePadded<AtomicU64>,
    pool_exhausted: CachePadded<AtomicU64>,
    queue_full: CachePadded<AtomicU64>,
    latency_min_ns: CachePadded<AtomicU64>,
    latency_max_ns: CachePadded<AtomicU64>,
    latency_sum_ns: CachePadded<AtomicU64>,
    latency_count: CachePadded<AtomicU64>,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            orders_received: CachePadded::new(AtomicU64::new(0)),
            orders_accepted: CachePadded::new(AtomicU64::new(0)),
            orders_rejected: CachePadded::new(AtomicU64::new(0)),
            reports_published: CachePadded::new(AtomicU64::new(0)),
            fills_published: CachePadded::new(AtomicU64::new(0)),
            pool_exhausted: CachePadded::new(AtomicU64::new(0)),
            queue_full: CachePadded::new(AtomicU64::new(0)),
            latency_min_ns: CachePadded::new(AtomicU64::new(u64::MAX)),
            latency_max_ns: CachePadded::new(AtomicU64::new(0)),
            latency_sum_ns: CachePadded::new(AtomicU64::new(0)),
            latency_count: CachePadded::new(AtomicU64::new(0)),
        }
    }

    #[inline(always)]
    pub fn inc_orders_received(&self) {
        self.orders_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_orders_accepted(&self) {
        self.orders_accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_orders_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_reports_published(&self) {
        self.reports_published.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_fills_published(&self) {
        self.fills_published.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_pool_exhausted(&self) {
        self.pool_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_queue_full(&self) {
        self.queue_full.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ingress-to-publish latency sample. Uses compare-and-swap
    /// loops for min/max since there's no atomic min/max on stable
    /// `AtomicU64`.
    #[inline(always)]
    pub fn observe_latency_ns(&self, sample: u64) {
        self.latency_sum_ns.fetch_add(sample, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);

        let min = &*self.latency_min_ns;
        let mut current = min.load(Ordering::Relaxed);
        while sample < current {
            match min.compare_exchange_weak(current, sample, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        let max = &*self.latency_max_ns;
        let mut current = max.load(Ordering::Relaxed);
        while sample > current {
            match max.compare_exchange_weak(current, sample, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let count = self.latency_count.load(Ordering::Relaxed);
        let min = self.latency_min_ns.load(Ordering::Relaxed);
        StatsSnapshot {
            orders_received: self.orders_received.load(Ordering::Relaxed),
            orders_accepted: self.orders_accepted.load(Ordering::Relaxed),
            orders_rejected: self.orders_rejected.load(Ordering::Relaxed),
            reports_published: self.reports_published.load(Ordering::Relaxed),
            fills_published: self.fills_published.load(Ordering::Relaxed),
            pool_exhausted: self.pool_exhausted.load(Ordering::Relaxed),
            queue_full: self.queue_full.load(Ordering::Relaxed),
            latency_min_ns: if count == 0 { 0 } else { min },
            latency_max_ns: self.latency_max_ns.load(Ordering::Relaxed),
            latency_sum_ns: self.latency_sum_ns.load(Ordering::Relaxed),
            latency_count: count,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub orders_received: u64,
    pub orders_accepted: u64,
    pub orders_rejected: u64,
    pub reports_published: u64,
    pub fills_published: u64,
    pub pool_exhausted: u64,
    pub queue_full: u64,
    pub latency_min_ns: u64,
    pub latency_max_ns: u64,
    pub latency_sum_ns: u64,
    pub latency_count: u64,
}

impl StatsSnapshot {
    pub fn avg_latency_ns(&self) -> f64 {
        if self.latency_count == 0 {
            0.0
        } else {
            self.latency_sum_ns as f64 / self.latency_count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = Stats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.orders_received, 0);
        assert_eq!(snap.latency_count, 0);
    }

    #[test]
    fn latency_min_max_track_observed_samples() {
        let stats = Stats::new();
        stats.observe_latency_ns(500);
        stats.observe_latency_ns(100);
        stats.observe_latency_ns(900);
        let snap = stats.snapshot();
        assert_eq!(snap.latency_min_ns, 100);
        assert_eq!(snap.latency_max_ns, 900);
        assert_eq!(snap.latency_count, 3);
        assert!((snap.avg_latency_ns() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn counters_increment_independently() {
        let stats = Stats::new();
        stats.inc_orders_received();
        stats.inc_orders_received();
        stats.inc_orders_accepted();
        stats.inc_pool_exhausted();
        let snap = stats.snapshot();
        assert_eq!(snap.orders_received, 2);
        assert_eq!(snap.orders_accepted, 1);
        assert_eq!(snap.pool_exhausted, 1);
    }
}
