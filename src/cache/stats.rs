//! Cache Metrics Module
//!
//! Tracks cache performance counters and size accounting.

use serde::{Deserialize, Serialize};

// == Cache Metrics ==
/// Additive operation counters plus size figures computed on demand.
///
/// Counters only move forward; `reset` is the single way to zero them.
/// `total_size` and `entry_count` are filled in by the store when a snapshot
/// is requested and are never tracked incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Successful reads
    pub hits: u64,
    /// Reads of absent or expired keys
    pub misses: u64,
    /// Writes through `set`
    pub sets: u64,
    /// Entries removed by delete, invalidation, sweep or clear
    pub deletes: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Writes that stored codec output
    pub compression_saves: u64,
    /// Approximate serialized size of all entries, in bytes
    pub total_size: usize,
    /// Raw number of stored entries, expired or not
    pub entry_count: usize,
}

impl CacheMetrics {
    // == Constructor ==
    /// Creates a new CacheMetrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Adds `count` removals to the delete counter.
    pub fn record_deletes(&mut self, count: usize) {
        self.deletes += count as u64;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_compression(&mut self) {
        self.compression_saves += 1;
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = CacheMetrics::new();
        assert_eq!(metrics, CacheMetrics::default());
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.total_size, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheMetrics::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        assert_eq!(metrics.hit_rate(), 0.75);
    }

    #[test]
    fn test_counters() {
        let mut metrics = CacheMetrics::new();
        metrics.record_set();
        metrics.record_deletes(3);
        metrics.record_deletes(0);
        metrics.record_eviction();
        metrics.record_compression();

        assert_eq!(metrics.sets, 1);
        assert_eq!(metrics.deletes, 3);
        assert_eq!(metrics.evictions, 1);
        assert_eq!(metrics.compression_saves, 1);
    }

    #[test]
    fn test_reset() {
        let mut metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_eviction();

        metrics.reset();
        assert_eq!(metrics, CacheMetrics::default());
    }
}
