//! Keyed trending record store with last-computed-wins merge.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Component signals of one trending record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendingSignals {
    pub velocity: f64,
    pub amplification: f64,
    pub quality: f64,
    pub diversity: f64,
    pub compliance: f64,
}

/// A computed trending score for one item. Superseded records are
/// discarded, not versioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingRecord {
    /// Content identifier.
    pub content_id: String,
    /// Component signals.
    pub signals: TrendingSignals,
    /// Combined trending score.
    pub score: f64,
    /// When this record was computed.
    pub computed_at: DateTime<Utc>,
}

/// Shared trending record store. The batch pass and targeted recomputes are
/// independent producers; conflicts resolve by explicit timestamp
/// comparison, never by locking across jobs.
#[derive(Debug, Default)]
pub struct TrendingStore {
    records: RwLock<HashMap<String, TrendingRecord>>,
}

impl TrendingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless a more recently computed one is already
    /// present. Returns whether the record was applied.
    pub fn upsert(&self, record: TrendingRecord) -> bool {
        let mut records = self.records.write();
        match records.get(&record.content_id) {
            Some(existing) if existing.computed_at > record.computed_at => false,
            _ => {
                records.insert(record.content_id.clone(), record);
                true
            }
        }
    }

    /// Remove an item's record, if any.
    pub fn remove(&self, content_id: &str) {
        self.records.write().remove(content_id);
    }

    /// Drop records for items no longer in the candidate set. Returns how
    /// many records were retired.
    pub fn retain_ids(&self, ids: &std::collections::HashSet<String>) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|id, _| ids.contains(id));
        before - records.len()
    }

    /// Fetch one record.
    pub fn get(&self, content_id: &str) -> Option<TrendingRecord> {
        self.records.read().get(content_id).cloned()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// The top records at or above `min_score`, capped at `limit`, ordered
    /// by score descending then content identifier.
    pub fn top(&self, limit: usize, min_score: f64) -> Vec<TrendingRecord> {
        let mut records: Vec<TrendingRecord> = self
            .records
            .read()
            .values()
            .filter(|record| record.score >= min_score)
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        records.truncate(limit);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, score: f64, computed_at: DateTime<Utc>) -> TrendingRecord {
        TrendingRecord {
            content_id: id.to_string(),
            signals: TrendingSignals {
                velocity: score,
                amplification: 0.0,
                quality: 0.0,
                diversity: 0.0,
                compliance: 1.0,
            },
            score,
            computed_at,
        }
    }

    #[test]
    fn test_last_computed_wins() {
        let store = TrendingStore::new();
        let now = Utc::now();

        assert!(store.upsert(record("a", 0.6, now)));
        // A stale write (earlier computed_at) must not replace the record.
        assert!(!store.upsert(record("a", 0.9, now - chrono::Duration::seconds(10))));
        assert_eq!(store.get("a").unwrap().score, 0.6);

        // A newer write wins.
        assert!(store.upsert(record("a", 0.8, now + chrono::Duration::seconds(10))));
        assert_eq!(store.get("a").unwrap().score, 0.8);
    }

    #[test]
    fn test_top_filters_and_caps() {
        let store = TrendingStore::new();
        let now = Utc::now();

        store.upsert(record("low", 0.3, now));
        store.upsert(record("mid", 0.6, now));
        store.upsert(record("high", 0.9, now));

        let top = store.top(10, 0.5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].content_id, "high");

        let capped = store.top(1, 0.5);
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn test_top_deterministic_tie_order() {
        let store = TrendingStore::new();
        let now = Utc::now();

        store.upsert(record("b", 0.7, now));
        store.upsert(record("a", 0.7, now));

        let top = store.top(10, 0.5);
        assert_eq!(top[0].content_id, "a");
        assert_eq!(top[1].content_id, "b");
    }
}
