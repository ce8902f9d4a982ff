//! Surface-keyed caching with independent freshness windows.
//!
//! The cache is an optimization, never a correctness dependency: a missing
//! or failing store only makes requests slower. Only the producing surface
//! writes a given key; any component may read through it.

pub mod manager;
pub mod memory;

pub use manager::{CacheConfig, CacheManager, Surface};
pub use memory::MemoryCacheStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached payload with its freshness metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque payload.
    pub payload: serde_json::Value,
    /// When the payload was computed.
    pub computed_at: DateTime<Utc>,
    /// Freshness window in seconds.
    pub ttl_secs: u64,
}

impl CacheEntry {
    /// Whether the entry is still inside its freshness window at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now - self.computed_at;
        age >= chrono::Duration::zero() && age.num_seconds() < self.ttl_secs as i64
    }
}

/// Cache store collaborator. `get` and `set` must be idempotent; a write
/// replaces the entry atomically so no reader ever observes a partial
/// entry. Implementations should swallow backend failures and report
/// absence instead.
pub trait CacheStore: Send + Sync {
    /// Fetch an entry, or absent.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store an entry, replacing any previous value for the key.
    fn set(&self, key: &str, entry: CacheEntry);
}
