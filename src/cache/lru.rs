//! Eviction Policy (Least Recently Used)
//!
//! Ordered recency index used to pick the eviction victim without scanning
//! the whole store.

use std::collections::{BTreeMap, HashMap};

/// Position of a key in the recency order: `(last_accessed_at, touch_seq)`.
type Rank = (u64, u64);

// == Recency Index ==
/// Orders keys by their last access timestamp.
///
/// Keys touched within the same millisecond are ordered by a monotonically
/// increasing touch sequence, so the victim is always the key with the
/// smallest `last_accessed_at`, and among equals the one touched first.
#[derive(Debug, Default)]
pub struct RecencyIndex {
    /// Keys by rank, smallest = least recently used
    order: BTreeMap<Rank, String>,
    /// Current rank of every tracked key
    ranks: HashMap<String, Rank>,
    /// Next touch sequence number
    next_seq: u64,
}

impl RecencyIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Records that `key` was written or read at `accessed_at`.
    pub fn touch(&mut self, key: &str, accessed_at: u64) {
        self.remove(key);
        let rank = (accessed_at, self.next_seq);
        self.next_seq += 1;
        self.order.insert(rank, key.to_string());
        self.ranks.insert(key.to_string(), rank);
    }

    // == Remove ==
    /// Stops tracking a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(rank) = self.ranks.remove(key) {
            self.order.remove(&rank);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ranks.remove(&key);
        Some(key)
    }

    /// Drops every tracked key.
    pub fn clear(&mut self) {
        self.order.clear();
        self.ranks.clear();
    }
}
