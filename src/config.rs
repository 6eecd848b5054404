//! Configuration Module
//!
//! Holds the cache engine configuration and the server configuration
//! loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::saturating_millis;
use crate::error::{CacheError, Result};

// == Cache Config ==
/// Cache engine parameters, immutable once a cache is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry-count capacity
    pub max_size: usize,
    /// TTL applied when `set` omits one
    #[serde(with = "duration_ms")]
    pub default_ttl: Duration,
    /// Serialized payload size (bytes) above which compression is attempted
    pub compression_threshold: usize,
    /// Whether oversized payloads are compressed
    pub enable_compression: bool,
    /// Whether the additive counters are maintained
    pub enable_metrics: bool,
    /// Sweep period of the cleanup scheduler, zero disables it
    #[serde(with = "duration_ms")]
    pub cleanup_interval: Duration,
}

impl CacheConfig {
    /// Checks the values the engine cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default_ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Default TTL in whole milliseconds.
    pub fn default_ttl_ms(&self) -> u64 {
        saturating_millis(self.default_ttl)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: Duration::from_secs(300),
            compression_threshold: 1024,
            enable_compression: true,
            enable_metrics: true,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Serializes a `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(super::saturating_millis(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine configuration for the served cache
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
    /// File the snapshot is restored from at startup and written to at shutdown
    pub snapshot_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `COMPRESSION_THRESHOLD` - Compression trigger in bytes (default: 1024)
    /// - `ENABLE_COMPRESSION` - `true`/`false` (default: true)
    /// - `ENABLE_METRICS` - `true`/`false` (default: true)
    /// - `CLEANUP_INTERVAL_MS` - Sweep period in milliseconds, 0 disables (default: 60000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SNAPSHOT_PATH` - Optional snapshot file
    pub fn from_env() -> Self {
        let defaults = CacheConfig::default();

        Self {
            cache: CacheConfig {
                max_size: parse_var("MAX_SIZE").unwrap_or(defaults.max_size),
                default_ttl: parse_var("DEFAULT_TTL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.default_ttl),
                compression_threshold: parse_var("COMPRESSION_THRESHOLD")
                    .unwrap_or(defaults.compression_threshold),
                enable_compression: parse_var("ENABLE_COMPRESSION")
                    .unwrap_or(defaults.enable_compression),
                enable_metrics: parse_var("ENABLE_METRICS").unwrap_or(defaults.enable_metrics),
                cleanup_interval: parse_var("CLEANUP_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.cleanup_interval),
            },
            server_port: parse_var("SERVER_PORT").unwrap_or(3000),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            snapshot_path: None,
        }
    }
}

fn parse_var<V: std::str::FromStr>(name: &str) -> Option<V> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
