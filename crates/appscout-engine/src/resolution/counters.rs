use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lookup statistics for one resolver. Never reset; a fresh resolver starts
/// from zero.
#[derive(Debug, Default)]
pub struct PerformanceCounters {
    lookups: AtomicU64,
    cache_hits: AtomicU64,
    total_wait_ms: AtomicU64,
}

impl PerformanceCounters {
    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.total_wait_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            total_wait_ms: self.total_wait_ms.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub lookups: u64,
    pub cache_hits: u64,
    pub total_wait_ms: u64,
}

impl CounterSnapshot {
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.lookups as f64
    }

    /// Mean network wait per lookup that missed the cache.
    pub fn average_wait_ms(&self) -> f64 {
        let misses = self.lookups.saturating_sub(self.cache_hits);
        if misses == 0 {
            return 0.0;
        }
        self.total_wait_ms as f64 / misses as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ratios() {
        let counters = PerformanceCounters::default();
        for _ in 0..4 {
            counters.record_lookup();
        }
        counters.record_hit();
        counters.record_wait(Duration::from_millis(300));
        counters.record_wait(Duration::from_millis(150));

        let snap = counters.snapshot();
        assert_eq!(snap.lookups, 4);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.total_wait_ms, 450);
        assert!((snap.hit_ratio() - 0.25).abs() < f64::EPSILON);
        assert!((snap.average_wait_ms() - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = PerformanceCounters::default().snapshot();
        assert_eq!(snap.hit_ratio(), 0.0);
        assert_eq!(snap.average_wait_ms(), 0.0);
    }
}
