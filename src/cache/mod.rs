//! Cache Module
//!
//! Provides in-process caching with TTL expiration, LRU eviction, tag
//! invalidation, payload compression, metrics and snapshots.

mod codec;
mod entry;
mod expiration;
mod handle;
mod lru;
mod snapshot;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use codec::{Codec, GzipCodec};
pub use entry::{current_timestamp_ms, CacheEntry, StoredValue};
pub use expiration::{is_expired, saturating_millis};
pub use handle::Cache;
pub use lru::RecencyIndex;
pub use snapshot::{Snapshot, SnapshotEntry, SNAPSHOT_VERSION};
pub use stats::CacheMetrics;
pub use store::{CacheStore, SetEntry};
pub use tags::TagIndex;
