//! tagcache - An in-process cache engine
//!
//! Key-value caching with TTL expiration, LRU eviction, tag-based
//! invalidation, payload compression, metrics and snapshots, plus a thin
//! HTTP surface for serving one cache instance.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheMetrics, CacheStore, SetEntry};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
