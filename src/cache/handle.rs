//! Cache Handle
//!
//! Thread-safe cache instance owning its store and cleanup scheduler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{CacheMetrics, CacheStore, Codec, GzipCodec, SetEntry};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_cleanup_task;

/// Shared state behind every clone of a [`Cache`].
#[derive(Debug)]
struct Shared<T> {
    store: Arc<RwLock<CacheStore<T>>>,
    cleanup: Mutex<Option<JoinHandle<()>>>,
    config: CacheConfig,
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup.get_mut().take() {
            handle.abort();
        }
    }
}

// == Cache ==
/// A cache instance usable from many tasks at once.
///
/// Each operation takes the store lock once and holds it until the operation
/// completes, so eviction and sweeps never observe a torn store. Values are
/// returned as owned copies. Clones share the same store; the cleanup task is
/// stopped by [`Cache::destroy`] or when the last clone is dropped.
#[derive(Debug)]
pub struct Cache<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Cache<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache with the gzip codec.
    ///
    /// A non-zero `cleanup_interval` starts the sweep task, which requires a
    /// running tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_codec(config, Box::new(GzipCodec::default()))
    }

    /// Creates a cache with a custom compression codec.
    pub fn with_codec(config: CacheConfig, codec: Box<dyn Codec>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(RwLock::new(CacheStore::with_codec(config.clone(), codec)));

        let cleanup = if config.cleanup_interval.is_zero() {
            None
        } else {
            tokio::runtime::Handle::try_current().map_err(|_| {
                CacheError::Internal("cleanup scheduler requires a tokio runtime".to_string())
            })?;
            Some(spawn_cleanup_task(store.clone(), config.cleanup_interval))
        };

        info!(
            max_size = config.max_size,
            default_ttl_ms = config.default_ttl_ms(),
            compression = config.enable_compression,
            scheduler = cleanup.is_some(),
            "Cache created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                cleanup: Mutex::new(cleanup),
                config,
            }),
        })
    }

    /// Configuration the cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.shared.store.write().await.get(key)
    }

    pub async fn set<I, S>(
        &self,
        key: impl Into<String>,
        value: T,
        ttl: Option<Duration>,
        tags: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared
            .store
            .write()
            .await
            .set(key.into(), value, ttl, tags)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.shared.store.write().await.delete(key)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.shared.store.read().await.has(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.shared.store.read().await.keys()
    }

    pub async fn size(&self) -> usize {
        self.shared.store.read().await.len()
    }

    pub async fn get_multiple<S: AsRef<str>>(&self, keys: &[S]) -> HashMap<String, Option<T>> {
        self.shared.store.write().await.get_multiple(keys)
    }

    pub async fn set_multiple(&self, entries: Vec<SetEntry<T>>) -> Result<()> {
        self.shared.store.write().await.set_multiple(entries)
    }

    pub async fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        self.shared.store.write().await.invalidate_by_tags(tags)
    }

    pub async fn clear(&self) {
        self.shared.store.write().await.clear()
    }

    /// Manual sweep, identical to a scheduled one.
    pub async fn cleanup(&self) -> usize {
        self.shared.store.write().await.cleanup_expired()
    }

    pub async fn metrics(&self) -> CacheMetrics {
        self.shared.store.read().await.metrics()
    }

    pub async fn reset_metrics(&self) {
        self.shared.store.write().await.reset_metrics()
    }

    pub async fn export(&self) -> Result<String> {
        self.shared.store.read().await.export()
    }

    pub async fn import(&self, blob: &str) -> bool {
        self.shared.store.write().await.import(blob)
    }

    // == Destroy ==
    /// Stops the cleanup task and clears the store.
    ///
    /// The task is aborted and joined before the store is cleared, so no sweep
    /// runs concurrently with or after this call. Later operations see an
    /// empty cache and writes fail with [`CacheError::Destroyed`].
    pub async fn destroy(&self) {
        let handle = self.shared.cleanup.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        self.shared.store.write().await.destroy();
        info!("Cache destroyed");
    }

    pub async fn is_destroyed(&self) -> bool {
        self.shared.store.read().await.is_destroyed()
    }
}
