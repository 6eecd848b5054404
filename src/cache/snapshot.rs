//! Snapshot Serializer
//!
//! Self-describing JSON document holding the whole store, the active
//! configuration and a metrics snapshot.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, CacheMetrics};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Format version written by `export` and required by `import`.
pub const SNAPSHOT_VERSION: u32 = 1;

// == Snapshot ==
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: CacheConfig,
    pub metrics: CacheMetrics,
    pub entries: Vec<SnapshotEntry<T>>,
}

/// One stored key with its full entry record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry<T> {
    pub key: String,
    #[serde(flatten)]
    pub entry: CacheEntry<T>,
}

impl<T: Serialize> Snapshot<T> {
    /// Renders the snapshot as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> Snapshot<T> {
    /// Parses and checks a snapshot blob without touching any store.
    pub fn parse(blob: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(blob).map_err(|e| CacheError::Snapshot(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CacheError::Snapshot(format!(
                "unsupported version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        Ok(snapshot)
    }
}
