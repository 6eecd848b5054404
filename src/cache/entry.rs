//! Cache Entry Module
//!
//! Defines the record stored for each key: payload, timestamps, access
//! bookkeeping and tags.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::cache::expiration;

/// Size charged for an entry whose serialized form cannot be measured.
pub const FALLBACK_ENTRY_SIZE: usize = 1024;

// == Stored Value ==
/// Payload as held by the store: either the caller's value or codec output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredValue<T> {
    /// The original value, unmodified
    Raw(T),
    /// Encoded serialized form of the value
    Compressed(#[serde(with = "base64_bytes")] Vec<u8>),
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Timestamps are Unix milliseconds. `last_accessed_at >= stored_at` holds for
/// every entry created by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored payload
    pub value: StoredValue<T>,
    /// Timestamp of the last write
    pub stored_at: u64,
    /// Time-to-live assigned at write time
    pub ttl_ms: u64,
    /// Successful reads since creation
    pub access_count: u64,
    /// Timestamp of the most recent successful read (or the write)
    pub last_accessed_at: u64,
    /// Labels used for bulk invalidation
    pub tags: BTreeSet<String>,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a fresh entry written at `now`.
    pub fn new(value: StoredValue<T>, ttl_ms: u64, tags: BTreeSet<String>, now: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl_ms,
            access_count: 0,
            last_accessed_at: now,
            tags,
        }
    }

    // == Is Expired ==
    /// Checks the entry against the expiration policy at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        expiration::is_expired(self.stored_at, self.ttl_ms, now)
    }

    /// True if the payload holds codec output.
    pub fn is_compressed(&self) -> bool {
        matches!(self.value, StoredValue::Compressed(_))
    }

    // == Record Access ==
    /// Bumps the access counter and recency timestamp after a successful read.
    pub fn record_access(&mut self, now: u64) {
        self.access_count += 1;
        self.last_accessed_at = now.max(self.stored_at);
    }
}

impl<T: Serialize> CacheEntry<T> {
    /// Approximate footprint: the serialized length of the whole record.
    pub fn approx_size(&self) -> usize {
        serde_json::to_vec(self)
            .map(|bytes| bytes.len())
            .unwrap_or(FALLBACK_ENTRY_SIZE)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(expiration::saturating_millis)
        .unwrap_or(0)
}

/// Base64 text representation for encoded payloads inside JSON snapshots.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)
    }
}
