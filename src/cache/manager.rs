//! Read-through cache manager with per-surface freshness windows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStore};

/// Per-surface freshness windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether caching is enabled at all.
    pub enabled: bool,
    /// Freshness window for search results.
    pub search_ttl: Duration,
    /// Freshness window for the trending list.
    pub trending_ttl: Duration,
    /// Freshness window for per-user recommendations.
    pub recommendations_ttl: Duration,
    /// Freshness window for explore sections.
    pub explore_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_ttl: Duration::from_secs(120),
            trending_ttl: Duration::from_secs(300),
            recommendations_ttl: Duration::from_secs(600),
            explore_ttl: Duration::from_secs(300),
        }
    }
}

/// The cacheable engine surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Search,
    Trending,
    Recommendations,
    Explore,
}

impl Surface {
    fn key_prefix(&self) -> &'static str {
        match self {
            Surface::Search => "search",
            Surface::Trending => "trending",
            Surface::Recommendations => "recommend",
            Surface::Explore => "explore",
        }
    }

    fn ttl(&self, config: &CacheConfig) -> Duration {
        match self {
            Surface::Search => config.search_ttl,
            Surface::Trending => config.trending_ttl,
            Surface::Recommendations => config.recommendations_ttl,
            Surface::Explore => config.explore_ttl,
        }
    }
}

/// Memoizes expensive surface outputs through a [`CacheStore`].
pub struct CacheManager {
    store: Option<Arc<dyn CacheStore>>,
    config: CacheConfig,
}

impl CacheManager {
    /// Create a manager. Passing `None` as the store disables caching
    /// entirely; the engine stays fully functional.
    pub fn new(store: Option<Arc<dyn CacheStore>>, config: CacheConfig) -> Self {
        let store = if config.enabled { store } else { None };
        Self { store, config }
    }

    /// Fetch a fresh cached value for a surface key, or absent.
    pub fn fetch<T: DeserializeOwned>(
        &self,
        surface: Surface,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let store = self.store.as_ref()?;
        let full_key = format!("{}:{key}", surface.key_prefix());

        let entry = store.get(&full_key)?;
        if !entry.is_fresh(now) {
            debug!(key = %full_key, "cache entry expired");
            return None;
        }

        match serde_json::from_value(entry.payload) {
            Ok(value) => {
                debug!(key = %full_key, "cache hit");
                Some(value)
            }
            Err(error) => {
                warn!(key = %full_key, %error, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a surface value. Best-effort: serialization failures are
    /// logged and swallowed.
    pub fn put<T: Serialize>(&self, surface: Surface, key: &str, value: &T, now: DateTime<Utc>) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let full_key = format!("{}:{key}", surface.key_prefix());

        match serde_json::to_value(value) {
            Ok(payload) => {
                store.set(
                    &full_key,
                    CacheEntry {
                        payload,
                        computed_at: now,
                        ttl_secs: surface.ttl(&self.config).as_secs(),
                    },
                );
            }
            Err(error) => {
                warn!(key = %full_key, %error, "failed to serialize cache payload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;

    fn manager() -> CacheManager {
        CacheManager::new(
            Some(Arc::new(MemoryCacheStore::new())),
            CacheConfig::default(),
        )
    }

    #[test]
    fn test_get_after_set_before_ttl() {
        let manager = manager();
        let now = Utc::now();

        manager.put(Surface::Search, "donate", &vec!["a", "b"], now);
        let fetched: Option<Vec<String>> = manager.fetch(Surface::Search, "donate", now);
        assert_eq!(fetched, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let manager = manager();
        let now = Utc::now();

        manager.put(Surface::Search, "donate", &vec!["a"], now);
        let later = now + chrono::Duration::seconds(121);
        let fetched: Option<Vec<String>> = manager.fetch(Surface::Search, "donate", later);
        assert!(fetched.is_none());
    }

    #[test]
    fn test_surfaces_have_independent_keys() {
        let manager = manager();
        let now = Utc::now();

        manager.put(Surface::Search, "k", &1u32, now);
        let other: Option<u32> = manager.fetch(Surface::Trending, "k", now);
        assert!(other.is_none());
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let manager = CacheManager::new(Some(Arc::new(MemoryCacheStore::new())), config);
        let now = Utc::now();

        manager.put(Surface::Search, "k", &1u32, now);
        let fetched: Option<u32> = manager.fetch(Surface::Search, "k", now);
        assert!(fetched.is_none());
    }

    #[test]
    fn test_absent_store_is_functional() {
        let manager = CacheManager::new(None, CacheConfig::default());
        let now = Utc::now();

        manager.put(Surface::Search, "k", &1u32, now);
        let fetched: Option<u32> = manager.fetch(Surface::Search, "k", now);
        assert!(fetched.is_none());
    }
}
