//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with recency and tag indexes,
//! TTL expiration, payload compression and metrics.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::snapshot::{Snapshot, SnapshotEntry, SNAPSHOT_VERSION};
use crate::cache::{
    saturating_millis, CacheEntry, CacheMetrics, Codec, GzipCodec, RecencyIndex, StoredValue,
    TagIndex,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Set Entry ==
/// One write of a batch `set_multiple`.
#[derive(Debug, Clone)]
pub struct SetEntry<T> {
    pub key: String,
    pub value: T,
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
}

impl<T> SetEntry<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
            tags: Vec::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

// == Cache Store ==
/// Single-threaded cache engine.
///
/// Every public operation runs to completion without suspending. Concurrent
/// use goes through [`crate::cache::Cache`], which serializes access with one
/// lock held for the duration of each operation.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// LRU access order
    recency: RecencyIndex,
    /// Tag to key mapping
    tags: TagIndex,
    /// Additive counters
    metrics: CacheMetrics,
    config: CacheConfig,
    codec: Box<dyn Codec>,
    destroyed: bool,
}

impl<T> CacheStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    // == Constructor ==
    /// Creates a store using the gzip codec.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_codec(config, Box::new(GzipCodec::default()))
    }

    /// Creates a store with a custom compression codec.
    pub fn with_codec(config: CacheConfig, codec: Box<dyn Codec>) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyIndex::new(),
            tags: TagIndex::new(),
            metrics: CacheMetrics::new(),
            config,
            codec,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get ==
    /// Retrieves a copy of the value stored under `key`.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<T> {
        self.get_at(key, current_timestamp_ms())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: u64) -> Option<T> {
        if self.destroyed {
            return None;
        }

        let decoded = match self.entries.get(key) {
            None => {
                self.record(CacheMetrics::record_miss);
                return None;
            }
            Some(entry) if entry.is_expired(now) => {
                self.remove_entry(key);
                self.record(CacheMetrics::record_miss);
                debug!(key, "Expired entry removed on read");
                return None;
            }
            Some(entry) => decode_value(self.codec.as_ref(), &entry.value),
        };

        match decoded {
            Ok(value) => {
                if let Some(entry) = self.entries.get_mut(key) {
                    entry.record_access(now);
                    self.recency.touch(key, entry.last_accessed_at);
                }
                self.record(CacheMetrics::record_hit);
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Dropping undecodable cache entry");
                self.remove_entry(key);
                self.record(CacheMetrics::record_miss);
                None
            }
        }
    }

    // == Set ==
    /// Stores a value with optional TTL and tags.
    ///
    /// Overwrites reset the entry's timestamps and access count. Writing a new
    /// key into a full store evicts exactly one least recently used entry first.
    pub fn set<I, S>(
        &mut self,
        key: String,
        value: T,
        ttl: Option<Duration>,
        tags: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_at(key, value, ttl, tags, current_timestamp_ms())
    }

    pub(crate) fn set_at<I, S>(
        &mut self,
        key: String,
        value: T,
        ttl: Option<Duration>,
        tags: I,
        now: u64,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.destroyed {
            return Err(CacheError::Destroyed);
        }

        let is_overwrite = self.entries.contains_key(&key);
        if !is_overwrite && self.entries.len() >= self.config.max_size {
            self.evict_one();
        }

        let ttl_ms = ttl
            .map(saturating_millis)
            .unwrap_or_else(|| self.config.default_ttl_ms());
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        let stored = self.encode_value(&key, value);

        self.remove_entry(&key);
        self.tags.insert(&key, &tags);
        self.recency.touch(&key, now);
        let entry = CacheEntry::new(stored, ttl_ms, tags, now);
        let compressed = entry.is_compressed();
        self.entries.insert(key, entry);

        self.record(CacheMetrics::record_set);
        if compressed {
            self.record(CacheMetrics::record_compression);
        }
        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key, returning whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.destroyed || self.remove_entry(key).is_none() {
            return false;
        }
        self.record(|m| m.record_deletes(1));
        true
    }

    // == Has ==
    /// True if `key` is stored and live. Touches neither recency nor metrics.
    pub fn has(&self, key: &str) -> bool {
        self.has_at(key, current_timestamp_ms())
    }

    pub(crate) fn has_at(&self, key: &str, now: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Keys ==
    /// All stored keys in sorted order, including expired ones not yet swept.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    // == Length ==
    /// Raw entry count, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view of a stored record.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    // == Batch Operations ==
    /// Per-key `get` over `keys`.
    pub fn get_multiple<S: AsRef<str>>(&mut self, keys: &[S]) -> HashMap<String, Option<T>> {
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                (key.to_string(), self.get(key))
            })
            .collect()
    }

    /// Per-key `set` over `entries`, stopping at the first failure.
    pub fn set_multiple(&mut self, entries: Vec<SetEntry<T>>) -> Result<()> {
        for entry in entries {
            self.set(entry.key, entry.value, entry.ttl, entry.tags)?;
        }
        Ok(())
    }

    // == Invalidate By Tags ==
    /// Removes every entry carrying any of `tags` and returns how many went.
    pub fn invalidate_by_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> usize {
        let keys = self.tags.keys_for(tags);
        let removed = keys
            .iter()
            .filter(|key| self.remove_entry(key).is_some())
            .count();

        self.record(|m| m.record_deletes(removed));
        if removed > 0 {
            debug!(removed, "Invalidated entries by tag");
        }
        removed
    }

    // == Clear ==
    /// Removes every entry and resets the counters.
    ///
    /// The reset happens first and the removed count is then recorded as
    /// deletes, so afterwards `deletes` equals the number of entries cleared
    /// and every other counter is zero.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.recency.clear();
        self.tags.clear();
        self.metrics.reset();
        self.record(|m| m.record_deletes(removed));
        info!(removed, "Cache cleared");
    }

    // == Cleanup Expired ==
    /// Sweeps all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(current_timestamp_ms())
    }

    pub(crate) fn cleanup_expired_at(&mut self, now: u64) -> usize {
        if self.destroyed {
            return 0;
        }

        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        let count = expired_keys.len();
        self.record(|m| m.record_deletes(count));
        count
    }

    // == Metrics ==
    /// Counter snapshot with size figures computed from the current entries.
    pub fn metrics(&self) -> CacheMetrics {
        let mut metrics = self.metrics.clone();
        metrics.entry_count = self.entries.len();
        metrics.total_size = self
            .entries
            .iter()
            .map(|(key, entry)| key.len() + entry.approx_size())
            .sum();
        metrics
    }

    /// Zeroes the counters. Stored entries are untouched.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    // == Export ==
    /// Serializes entries, config and metrics into a snapshot blob.
    pub fn export(&self) -> Result<String> {
        if self.destroyed {
            return Err(CacheError::Destroyed);
        }

        let mut entries: Vec<SnapshotEntry<T>> = self
            .entries
            .iter()
            .map(|(key, entry)| SnapshotEntry {
                key: key.clone(),
                entry: entry.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        Snapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            config: self.config.clone(),
            metrics: self.metrics(),
            entries,
        }
        .to_json()
    }

    // == Import ==
    /// Replaces the store with the live entries of a snapshot blob.
    ///
    /// Malformed blobs leave the store untouched and return `false`. Entries
    /// already expired against the current clock are dropped.
    pub fn import(&mut self, blob: &str) -> bool {
        self.import_at(blob, current_timestamp_ms())
    }

    pub(crate) fn import_at(&mut self, blob: &str, now: u64) -> bool {
        if self.destroyed {
            return false;
        }

        let snapshot = match Snapshot::<T>::parse(blob) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Rejected cache snapshot");
                return false;
            }
        };

        let total = snapshot.entries.len();
        let mut live: Vec<SnapshotEntry<T>> = snapshot
            .entries
            .into_iter()
            .filter(|item| !item.entry.is_expired(now))
            .collect();
        live.sort_by_key(|item| item.entry.last_accessed_at);

        self.entries.clear();
        self.recency.clear();
        self.tags.clear();

        let admitted = live.len();
        for SnapshotEntry { key, mut entry } in live {
            entry.last_accessed_at = entry.last_accessed_at.max(entry.stored_at);
            self.remove_entry(&key);
            self.tags.insert(&key, &entry.tags);
            self.recency.touch(&key, entry.last_accessed_at);
            self.entries.insert(key, entry);
        }

        while self.entries.len() > self.config.max_size && self.evict_one() {}

        info!(
            imported = self.entries.len(),
            dropped_expired = total - admitted,
            "Imported cache snapshot"
        );
        true
    }

    // == Destroy ==
    /// Drops every entry and refuses further access.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.entries.clear();
        self.recency.clear();
        self.tags.clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // == Internals ==
    fn record(&mut self, update: impl FnOnce(&mut CacheMetrics)) {
        if self.config.enable_metrics {
            update(&mut self.metrics);
        }
    }

    /// Removes a key from the entries and both indexes.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(key);
        self.tags.remove(key, &entry.tags);
        Some(entry)
    }

    /// Removes the least recently used entry. Returns false if none was left.
    fn evict_one(&mut self) -> bool {
        let Some(victim) = self.recency.evict_oldest() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&victim) {
            self.tags.remove(&victim, &entry.tags);
        }
        self.record(CacheMetrics::record_eviction);
        debug!(key = %victim, "Evicted least recently used entry");
        true
    }

    /// Applies the codec when the serialized value is over the threshold.
    /// Any failure falls back to storing the value as-is.
    fn encode_value(&self, key: &str, value: T) -> StoredValue<T> {
        if !self.config.enable_compression {
            return StoredValue::Raw(value);
        }

        let bytes = match serde_json::to_vec(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(key, error = %e, "Value not serializable, storing uncompressed");
                return StoredValue::Raw(value);
            }
        };
        if bytes.len() <= self.config.compression_threshold {
            return StoredValue::Raw(value);
        }

        match self.codec.encode(&bytes) {
            Ok(encoded) => {
                debug!(
                    key,
                    codec = self.codec.name(),
                    original = bytes.len(),
                    encoded = encoded.len(),
                    "Compressed cache value"
                );
                StoredValue::Compressed(encoded)
            }
            Err(e) => {
                warn!(key, error = %e, "Compression failed, storing uncompressed");
                StoredValue::Raw(value)
            }
        }
    }
}

/// Returns an owned copy of a stored payload, decoding it if needed.
fn decode_value<T>(codec: &dyn Codec, stored: &StoredValue<T>) -> Result<T>
where
    T: DeserializeOwned + Clone,
{
    match stored {
        StoredValue::Raw(value) => Ok(value.clone()),
        StoredValue::Compressed(bytes) => {
            let decoded = codec.decode(bytes)?;
            Ok(serde_json::from_slice(&decoded)?)
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const NO_TAGS: [&str; 0] = [];

    fn config(max_size: usize) -> CacheConfig {
        CacheConfig {
            max_size,
            default_ttl: Duration::from_millis(1_000),
            compression_threshold: 64,
            enable_compression: true,
            enable_metrics: true,
            cleanup_interval: Duration::ZERO,
        }
    }

    fn store(max_size: usize) -> CacheStore<String> {
        CacheStore::new(config(max_size))
    }

    /// Codec whose encode or decode always fails.
    #[derive(Debug)]
    struct BrokenCodec {
        fail_encode: bool,
    }

    impl Codec for BrokenCodec {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
            if self.fail_encode {
                return Err(CacheError::Internal("encode".to_string()));
            }
            Ok(input.to_vec())
        }

        fn decode(&self, _input: &[u8]) -> Result<Vec<u8>> {
            Err(CacheError::Internal("decode".to_string()))
        }
    }

    #[test]
    fn test_store_new() {
        let store = store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert!(!store.is_destroyed());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None, NO_TAGS).unwrap();

        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_records_access() {
        let mut store = store(100);
        store.set_at("k".to_string(), "v".to_string(), None, NO_TAGS, 1_000).unwrap();

        store.get_at("k", 1_100);
        store.get_at("k", 1_200);

        let entry = store.entry("k").unwrap();
        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, 1_200);
        assert_eq!(entry.stored_at, 1_000);
    }

    #[test]
    fn test_store_get_nonexistent_is_miss() {
        let mut store = store(100);

        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.metrics().misses, 1);
    }

    #[test]
    fn test_store_overwrite_resets_entry() {
        let mut store = store(100);

        store.set_at("key1".to_string(), "value1".to_string(), None, ["a"], 1_000).unwrap();
        store.get_at("key1", 1_100);
        store.set_at("key1".to_string(), "value2".to_string(), None, ["b"], 1_200).unwrap();

        let entry = store.entry("key1").unwrap();
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.stored_at, 1_200);
        assert_eq!(store.get_at("key1", 1_300), Some("value2".to_string()));
        assert_eq!(store.len(), 1);

        // Old tags no longer match the key
        assert_eq!(store.invalidate_by_tags(&["a"]), 0);
        assert_eq!(store.invalidate_by_tags(&["b"]), 1);
    }

    #[test]
    fn test_store_delete() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None, NO_TAGS).unwrap();

        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));
        assert!(store.is_empty());
        assert_eq!(store.metrics().deletes, 1);
    }

    #[test]
    fn test_expired_get_removes_entry() {
        let mut store = store(100);
        store
            .set_at("k".to_string(), "v".to_string(), Some(Duration::from_millis(10)), NO_TAGS, 1_000)
            .unwrap();

        assert_eq!(store.get_at("k", 1_011), None);
        assert_eq!(store.len(), 0);
        assert_eq!(store.metrics().misses, 1);
        assert_eq!(store.metrics().deletes, 0);
    }

    #[test]
    fn test_store_ttl_expiration_real_clock() {
        let mut store = store(100);

        store
            .set("x".to_string(), "1".to_string(), Some(Duration::from_millis(10)), ["t1"])
            .unwrap();
        assert!(store.has("x"));

        sleep(Duration::from_millis(20));

        let misses_before = store.metrics().misses;
        assert_eq!(store.get("x"), None);
        assert_eq!(store.metrics().misses, misses_before + 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_zero_ttl_is_stored_but_stale() {
        let mut store = store(100);
        store
            .set("k".to_string(), "v".to_string(), Some(Duration::ZERO), NO_TAGS)
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.has("k"));
        assert_eq!(store.get("k"), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_wrapping() {
        let mut store = store(100);
        store
            .set_at(
                "forever".to_string(),
                "v".to_string(),
                Some(Duration::from_secs(18_446_744_073_709_552)),
                NO_TAGS,
                1_000,
            )
            .unwrap();

        assert_eq!(store.entry("forever").unwrap().ttl_ms, u64::MAX);
        assert!(store.has_at("forever", 2_000));
        assert_eq!(store.get_at("forever", u64::MAX), Some("v".to_string()));
    }

    #[test]
    fn test_has_is_a_peek() {
        let mut store = store(100);
        store.set_at("k".to_string(), "v".to_string(), None, NO_TAGS, 1_000).unwrap();

        assert!(store.has_at("k", 1_500));
        assert!(!store.has_at("k", 2_001));
        assert!(!store.has_at("missing", 1_500));

        // Expired-but-unswept entry is still counted by len and keys
        assert_eq!(store.len(), 1);
        assert_eq!(store.keys(), vec!["k".to_string()]);

        let metrics = store.metrics();
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.misses, 0);
        assert_eq!(store.entry("k").unwrap().access_count, 0);
    }

    #[test]
    fn test_lru_scenario() {
        let mut store = store(2);

        store.set("a".to_string(), "1".to_string(), None, NO_TAGS).unwrap();
        store.set("b".to_string(), "2".to_string(), None, NO_TAGS).unwrap();
        store.get("a");
        store.set("c".to_string(), "3".to_string(), None, NO_TAGS).unwrap();

        assert!(store.has("a"));
        assert!(!store.has("b"));
        assert!(store.has("c"));
        assert_eq!(store.metrics().evictions, 1);
    }

    #[test]
    fn test_eviction_picks_smallest_last_access() {
        let mut store = store(3);

        store.set_at("k1".to_string(), "v".to_string(), None, NO_TAGS, 100).unwrap();
        store.set_at("k2".to_string(), "v".to_string(), None, NO_TAGS, 200).unwrap();
        store.set_at("k3".to_string(), "v".to_string(), None, NO_TAGS, 300).unwrap();
        store.get_at("k1", 400);

        store.set_at("k4".to_string(), "v".to_string(), None, NO_TAGS, 500).unwrap();

        assert_eq!(store.keys(), vec!["k1", "k3", "k4"]);
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut store = store(2);

        store.set("a".to_string(), "1".to_string(), None, NO_TAGS).unwrap();
        store.set("b".to_string(), "2".to_string(), None, NO_TAGS).unwrap();
        store.set("a".to_string(), "3".to_string(), None, NO_TAGS).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.metrics().evictions, 0);
    }

    #[test]
    fn test_invalidate_by_tags() {
        let mut store = store(100);

        store.set("a".to_string(), "1".to_string(), None, ["t1", "t2"]).unwrap();
        store.set("b".to_string(), "2".to_string(), None, ["t2"]).unwrap();
        store.set("c".to_string(), "3".to_string(), None, ["t3"]).unwrap();
        store.set("d".to_string(), "4".to_string(), None, NO_TAGS).unwrap();

        assert_eq!(store.invalidate_by_tags(&["t2"]), 2);
        assert_eq!(store.keys(), vec!["c", "d"]);
        assert_eq!(store.metrics().deletes, 2);

        assert_eq!(store.invalidate_by_tags(&["nope"]), 0);
        assert_eq!(store.len(), 2);
        assert_eq!(store.metrics().deletes, 2);
    }

    #[test]
    fn test_invalidate_after_eviction_skips_evicted_key() {
        let mut store = store(1);

        store.set("a".to_string(), "1".to_string(), None, ["t"]).unwrap();
        store.set("b".to_string(), "2".to_string(), None, ["t"]).unwrap();

        assert_eq!(store.invalidate_by_tags(&["t"]), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_compression_round_trip() {
        let mut store = store(100);
        let payload = "diamond solitaire ".repeat(20);

        store.set("y".to_string(), payload.clone(), None, ["t2"]).unwrap();

        assert!(store.entry("y").unwrap().is_compressed());
        assert_eq!(store.get("y"), Some(payload));
        assert!(store.metrics().compression_saves >= 1);
    }

    #[test]
    fn test_small_values_stay_raw() {
        let mut store = store(100);
        store.set("small".to_string(), "tiny".to_string(), None, NO_TAGS).unwrap();

        assert!(!store.entry("small").unwrap().is_compressed());
        assert_eq!(store.metrics().compression_saves, 0);
    }

    #[test]
    fn test_compression_disabled() {
        let mut store: CacheStore<String> = CacheStore::new(CacheConfig {
            enable_compression: false,
            ..config(100)
        });
        store.set("big".to_string(), "x".repeat(500), None, NO_TAGS).unwrap();

        assert!(!store.entry("big").unwrap().is_compressed());
    }

    #[test]
    fn test_encode_failure_falls_back_to_raw() {
        let mut store: CacheStore<String> =
            CacheStore::with_codec(config(100), Box::new(BrokenCodec { fail_encode: true }));
        let payload = "x".repeat(500);

        store.set("k".to_string(), payload.clone(), None, NO_TAGS).unwrap();

        assert!(!store.entry("k").unwrap().is_compressed());
        assert_eq!(store.get("k"), Some(payload));
        assert_eq!(store.metrics().compression_saves, 0);
    }

    #[test]
    fn test_decode_failure_is_a_miss() {
        let mut store: CacheStore<String> =
            CacheStore::with_codec(config(100), Box::new(BrokenCodec { fail_encode: false }));

        store.set("k".to_string(), "x".repeat(500), None, NO_TAGS).unwrap();
        assert!(store.entry("k").unwrap().is_compressed());

        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
        assert_eq!(store.metrics().misses, 1);
        assert_eq!(store.metrics().hits, 0);
    }

    #[test]
    fn test_returned_values_are_copies() {
        let mut store: CacheStore<Vec<String>> = CacheStore::new(config(10));
        store
            .set("list".to_string(), vec!["a".to_string()], None, NO_TAGS)
            .unwrap();

        let mut copy = store.get("list").unwrap();
        copy.push("b".to_string());

        assert_eq!(store.get("list"), Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_batch_operations() {
        let mut store = store(100);

        store
            .set_multiple(vec![
                SetEntry::new("a", "1".to_string()),
                SetEntry::new("b", "2".to_string()).with_tags(["t"]),
                SetEntry::new("c", "3".to_string()).with_ttl(Duration::from_secs(60)),
            ])
            .unwrap();

        let values = store.get_multiple(&["a", "b", "missing"]);
        assert_eq!(values.len(), 3);
        assert_eq!(values["a"], Some("1".to_string()));
        assert_eq!(values["b"], Some("2".to_string()));
        assert_eq!(values["missing"], None);

        assert_eq!(store.entry("c").unwrap().ttl_ms, 60_000);
        assert_eq!(store.metrics().sets, 3);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = store(100);

        store
            .set_at("short".to_string(), "v".to_string(), Some(Duration::from_millis(10)), NO_TAGS, 1_000)
            .unwrap();
        store
            .set_at("long".to_string(), "v".to_string(), Some(Duration::from_secs(10)), NO_TAGS, 1_000)
            .unwrap();

        assert_eq!(store.cleanup_expired_at(1_050), 1);
        assert_eq!(store.keys(), vec!["long"]);
        assert_eq!(store.metrics().deletes, 1);
        assert_eq!(store.cleanup_expired_at(1_060), 0);
    }

    #[test]
    fn test_clear() {
        let mut store = store(100);

        store.set("a".to_string(), "1".to_string(), None, ["t"]).unwrap();
        store.set("b".to_string(), "2".to_string(), None, NO_TAGS).unwrap();
        store.get("a");

        store.clear();

        let metrics = store.metrics();
        assert!(store.is_empty());
        assert_eq!(metrics.deletes, 2);
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.sets, 0);
        assert_eq!(store.invalidate_by_tags(&["t"]), 0);
    }

    #[test]
    fn test_metrics_size_accounting() {
        let mut store = store(100);
        assert_eq!(store.metrics().total_size, 0);

        store.set("a".to_string(), "1".to_string(), None, NO_TAGS).unwrap();
        let one = store.metrics();
        store.set("b".to_string(), "2".to_string(), None, NO_TAGS).unwrap();
        let two = store.metrics();

        assert_eq!(one.entry_count, 1);
        assert_eq!(two.entry_count, 2);
        assert!(two.total_size > one.total_size);
    }

    #[test]
    fn test_reset_metrics_keeps_entries() {
        let mut store = store(100);
        store.set("a".to_string(), "1".to_string(), None, NO_TAGS).unwrap();
        store.get("a");
        store.get("zzz");

        store.reset_metrics();

        let metrics = store.metrics();
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.misses, 0);
        assert_eq!(metrics.sets, 0);
        assert_eq!(metrics.entry_count, 1);
        assert_eq!(store.get("a"), Some("1".to_string()));
    }

    #[test]
    fn test_metrics_disabled() {
        let mut store: CacheStore<String> = CacheStore::new(CacheConfig {
            enable_metrics: false,
            ..config(1)
        });

        store.set("a".to_string(), "1".to_string(), None, NO_TAGS).unwrap();
        store.set("b".to_string(), "2".to_string(), None, NO_TAGS).unwrap();
        store.get("b");
        store.get("a");

        let metrics = store.metrics();
        assert_eq!(metrics.sets, 0);
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.misses, 0);
        assert_eq!(metrics.evictions, 0);
        assert_eq!(metrics.entry_count, 1);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = store(100);
        source.set("a".to_string(), "1".to_string(), None, ["t"]).unwrap();
        source.set("big".to_string(), "gem ".repeat(100), None, NO_TAGS).unwrap();

        let blob = source.export().unwrap();

        let mut target = store(100);
        assert!(target.import(&blob));
        assert_eq!(target.keys(), vec!["a", "big"]);
        assert_eq!(target.get("a"), Some("1".to_string()));
        assert_eq!(target.get("big"), Some("gem ".repeat(100)));

        // Tag index is rebuilt from imported entries
        assert_eq!(target.invalidate_by_tags(&["t"]), 1);
    }

    #[test]
    fn test_import_drops_expired_entries() {
        let mut source = store(100);
        source
            .set_at("stale".to_string(), "v".to_string(), Some(Duration::from_millis(10)), NO_TAGS, 1_000)
            .unwrap();
        source
            .set_at("fresh".to_string(), "v".to_string(), Some(Duration::from_secs(60)), NO_TAGS, 1_000)
            .unwrap();
        let blob = source.export().unwrap();

        let mut target = store(100);
        assert!(target.import_at(&blob, 2_000));

        assert_eq!(target.keys(), vec!["fresh"]);
    }

    #[test]
    fn test_import_preserves_recency() {
        let mut source = store(100);
        source.set_at("old".to_string(), "v".to_string(), None, NO_TAGS, 1_000).unwrap();
        source.set_at("new".to_string(), "v".to_string(), None, NO_TAGS, 1_100).unwrap();
        let blob = source.export().unwrap();

        // Smaller target keeps only the most recently accessed entry
        let mut target = store(1);
        assert!(target.import_at(&blob, 1_200));

        assert_eq!(target.keys(), vec!["new"]);
        assert_eq!(target.metrics().evictions, 1);
    }

    #[test]
    fn test_import_malformed_leaves_store_untouched() {
        let mut store = store(100);
        store.set("a".to_string(), "1".to_string(), None, NO_TAGS).unwrap();

        assert!(!store.import("not-json"));
        assert!(!store.import(r#"{"version":1}"#));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a"), Some("1".to_string()));
    }

    #[test]
    fn test_import_replaces_existing_entries() {
        let mut source = store(100);
        source.set("new".to_string(), "1".to_string(), None, NO_TAGS).unwrap();
        let blob = source.export().unwrap();

        let mut target = store(100);
        target.set("old".to_string(), "1".to_string(), None, ["t"]).unwrap();

        assert!(target.import(&blob));
        assert_eq!(target.keys(), vec!["new"]);
        assert_eq!(target.invalidate_by_tags(&["t"]), 0);
    }

    #[test]
    fn test_destroy() {
        let mut store = store(100);
        store.set("a".to_string(), "1".to_string(), None, NO_TAGS).unwrap();

        store.destroy();

        assert!(store.is_destroyed());
        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
        assert!(matches!(
            store.set("b".to_string(), "2".to_string(), None, NO_TAGS),
            Err(CacheError::Destroyed)
        ));
        assert!(!store.delete("a"));
        assert!(matches!(store.export(), Err(CacheError::Destroyed)));
    }
}
