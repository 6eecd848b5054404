//! Request DTOs for the cache HTTP surface
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::SetEntry;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl_ms`: Optional TTL in milliseconds (uses the cache default if absent)
/// - `tags`: Optional labels for bulk invalidation
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
    /// Optional tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }

    /// Converts the request into an engine write.
    pub fn into_entry(self) -> SetEntry<Value> {
        let mut entry = SetEntry::new(self.key, self.value).with_tags(self.tags);
        if let Some(ttl_ms) = self.ttl_ms {
            entry = entry.with_ttl(Duration::from_millis(ttl_ms));
        }
        entry
    }
}

/// Request body for the batch SET operation (PUT /mset)
#[derive(Debug, Clone, Deserialize)]
pub struct MultiSetRequest {
    pub entries: Vec<SetRequest>,
}

impl MultiSetRequest {
    /// Returns the first validation failure among the entries.
    pub fn validate(&self) -> Option<String> {
        self.entries.iter().find_map(SetRequest::validate)
    }
}

/// Request body for the batch GET operation (POST /mget)
#[derive(Debug, Clone, Deserialize)]
pub struct MultiGetRequest {
    pub keys: Vec<String>,
}

/// Request body for tag invalidation (POST /invalidate)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub tags: Vec<String>,
}

impl InvalidateRequest {
    pub fn validate(&self) -> Option<String> {
        if self.tags.is_empty() {
            return Some("At least one tag is required".to_string());
        }
        None
    }
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}
