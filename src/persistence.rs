//! Snapshot Persistence
//!
//! Saves and restores cache snapshots to a file. The file is treated as an
//! opaque blob store: whatever `export` produced is handed back to `import`.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::Cache;
use crate::error::Result;

/// Restores `cache` from the snapshot file at `path`.
///
/// Returns `Ok(false)` when the file does not exist or holds an unusable
/// snapshot; the cache is left untouched in both cases.
pub async fn restore_snapshot<T>(cache: &Cache<T>, path: &Path) -> Result<bool>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    if !tokio::fs::try_exists(path).await? {
        info!(path = %path.display(), "No snapshot file to restore");
        return Ok(false);
    }

    let blob = tokio::fs::read_to_string(path).await?;
    let imported = cache.import(&blob).await;
    if imported {
        let entries = cache.size().await;
        info!(path = %path.display(), entries, "Snapshot restored");
    } else {
        warn!(path = %path.display(), "Snapshot file ignored");
    }
    Ok(imported)
}

/// Writes the current snapshot of `cache` to `path`, returning its byte size.
///
/// The blob goes to a sibling temporary file first and is then renamed over
/// `path`, so a crash mid-write never leaves a truncated snapshot behind.
pub async fn save_snapshot<T>(cache: &Cache<T>, path: &Path) -> Result<usize>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let blob = cache.export().await?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, blob.as_bytes()).await?;
    tokio::fs::rename(&tmp_path, path).await?;

    info!(path = %path.display(), bytes = blob.len(), "Snapshot saved");
    Ok(blob.len())
}
