//! Expiration Policy
//!
//! The single staleness predicate shared by `get`, `has`, import and the sweep.

use std::time::Duration;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Returns true when an entry written at `stored_at` with `ttl_ms` is stale at `now`.
///
/// A zero TTL means "immediately stale": the entry is stored but every read
/// path treats it as absent. A clock that moved backwards never makes an entry
/// expire early.
pub fn is_expired(stored_at: u64, ttl_ms: u64, now: u64) -> bool {
    ttl_ms == 0 || now.saturating_sub(stored_at) > ttl_ms
}
