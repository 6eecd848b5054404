//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{saturating_millis, CacheStore};

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task sleeps for `interval` between sweeps and holds the store's write
/// lock for the duration of each sweep, so a sweep never interleaves with
/// another operation.
///
/// # Returns
/// A JoinHandle for the spawned task. Aborting it stops further sweeps;
/// awaiting the aborted handle guarantees none is still running.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::<String>::new(CacheConfig::default())));
/// let cleanup_handle = spawn_cleanup_task(store.clone(), Duration::from_secs(1));
/// // Later, during teardown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<T>(store: Arc<RwLock<CacheStore<T>>>, interval: Duration) -> JoinHandle<()>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = saturating_millis(interval), "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut guard = store.write().await;
                if guard.is_destroyed() {
                    break;
                }
                guard.cleanup_expired()
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
