//! Trending analysis over a rolling time window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compliance::{ComplianceFilter, ViewerContext};
use crate::content::ContentItem;
use crate::error::Result;
use crate::ranking::scorer::quality_score;
use crate::store::{ContentStore, InteractionStore};
use crate::trending::signals::{
    AmplificationCaps, TrendingWeights, amplification_score, compliance_signal, diversity_score,
    velocity_score,
};
use crate::trending::store::{TrendingRecord, TrendingSignals, TrendingStore};

/// Configuration for trending analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingConfig {
    /// Rolling interaction window.
    pub window: Duration,
    /// Lookback horizon bounding the candidate set.
    pub lookback: Duration,
    /// Minimum combined score; items below it are excluded entirely.
    pub min_score: f64,
    /// Cap on the surviving trending set.
    pub max_items: usize,
    /// Signal weights; must sum to 1.0.
    pub weights: TrendingWeights,
    /// Amplification normalization caps.
    pub caps: AmplificationCaps,
    /// Interval between batch passes.
    pub batch_interval: Duration,
    /// Capacity of the targeted-recompute queue.
    pub queue_capacity: usize,
    /// Window count at which a velocity spike triggers a targeted
    /// recompute.
    pub spike_threshold: u64,
    /// Worker threads draining the targeted-recompute queue.
    pub recompute_workers: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(24 * 3600),
            lookback: Duration::from_secs(7 * 24 * 3600),
            min_score: 0.5,
            max_items: 50,
            weights: TrendingWeights::default(),
            caps: AmplificationCaps::default(),
            batch_interval: Duration::from_secs(300),
            queue_capacity: 256,
            spike_threshold: 25,
            recompute_workers: num_cpus::get().clamp(1, 2),
        }
    }
}

impl TrendingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

/// Outcome of one batch pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchStats {
    /// Candidates considered.
    pub candidates: usize,
    /// Records stored at or above the threshold.
    pub stored: usize,
    /// Candidates excluded below the threshold.
    pub excluded: usize,
}

/// Computes trending records from interaction statistics.
pub struct TrendingAnalyzer {
    config: TrendingConfig,
    content: Arc<dyn ContentStore>,
    interactions: Arc<dyn InteractionStore>,
    compliance: Arc<ComplianceFilter>,
    store: Arc<TrendingStore>,
}

impl TrendingAnalyzer {
    /// Create an analyzer over its collaborator stores.
    pub fn new(
        config: TrendingConfig,
        content: Arc<dyn ContentStore>,
        interactions: Arc<dyn InteractionStore>,
        compliance: Arc<ComplianceFilter>,
        store: Arc<TrendingStore>,
    ) -> Self {
        Self {
            config,
            content,
            interactions,
            compliance,
            store,
        }
    }

    /// The shared record store.
    pub fn store(&self) -> Arc<TrendingStore> {
        Arc::clone(&self.store)
    }

    /// The configured analysis window.
    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// Spike threshold for targeted recomputes.
    pub fn spike_threshold(&self) -> u64 {
        self.config.spike_threshold
    }

    /// Candidate set: items active in the window or created within the
    /// lookback horizon.
    fn candidates(&self, now: DateTime<Utc>) -> Vec<ContentItem> {
        let lookback = chrono::Duration::from_std(self.config.lookback).unwrap_or_default();
        let mut items = self.content.created_since(now - lookback, usize::MAX);

        let active = self.interactions.active_ids(self.config.window, now);
        let known: std::collections::HashSet<String> =
            items.iter().map(|item| item.id.clone()).collect();
        let extra: Vec<String> = active.into_iter().filter(|id| !known.contains(id)).collect();
        items.extend(self.content.get_many(&extra));

        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    fn tag_counts(items: &[ContentItem]) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for item in items {
            for tag in &item.tags {
                *counts.entry(tag.name.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Compute one item's trending record relative to the candidate set.
    /// Returns `None` for items below the minimum score.
    fn compute(
        &self,
        item: &ContentItem,
        tag_counts: &HashMap<String, usize>,
        candidate_count: usize,
        now: DateTime<Utc>,
    ) -> Option<TrendingRecord> {
        let stats = self.interactions.stats(&item.id, self.config.window, now);
        let verdict = self
            .compliance
            .evaluate(item, &ViewerContext::anonymous(), now);

        let signals = TrendingSignals {
            velocity: velocity_score(stats.window_count, stats.baseline_count),
            amplification: amplification_score(
                stats.shares,
                stats.mentions,
                stats.cross_surface,
                &self.config.caps,
            ),
            quality: quality_score(item),
            diversity: diversity_score(item, tag_counts, candidate_count),
            compliance: compliance_signal(&verdict),
        };

        let weights = &self.config.weights;
        let score = weights.velocity * signals.velocity
            + weights.amplification * signals.amplification
            + weights.quality * signals.quality
            + weights.diversity * signals.diversity
            + weights.compliance * signals.compliance;

        (score >= self.config.min_score).then(|| TrendingRecord {
            content_id: item.id.clone(),
            signals,
            score,
            computed_at: now,
        })
    }

    /// Recompute every candidate. Records at or above the threshold are
    /// upserted (last-computed-wins); candidates falling below it lose any
    /// previous record.
    pub fn batch_pass(&self, now: DateTime<Utc>) -> BatchStats {
        let candidates = self.candidates(now);
        let tag_counts = Self::tag_counts(&candidates);
        let candidate_count = candidates.len();

        let computed: Vec<(String, Option<TrendingRecord>)> = candidates
            .par_iter()
            .map(|item| {
                (
                    item.id.clone(),
                    self.compute(item, &tag_counts, candidate_count, now),
                )
            })
            .collect();

        let mut stats = BatchStats {
            candidates: candidate_count,
            ..BatchStats::default()
        };
        for (content_id, record) in computed {
            match record {
                Some(record) => {
                    self.store.upsert(record);
                    stats.stored += 1;
                }
                None => {
                    self.store.remove(&content_id);
                    stats.excluded += 1;
                }
            }
        }

        // Items that left the candidate set lose their records too.
        let candidate_ids: std::collections::HashSet<String> =
            candidates.iter().map(|item| item.id.clone()).collect();
        stats.excluded += self.store.retain_ids(&candidate_ids);

        debug!(
            candidates = stats.candidates,
            stored = stats.stored,
            excluded = stats.excluded,
            "trending batch pass complete"
        );
        stats
    }

    /// Targeted recompute of a single item, used by the high-impact
    /// interaction path. Returns whether a record was stored.
    pub fn recompute_item(&self, content_id: &str, now: DateTime<Utc>) -> bool {
        let Some(item) = self.content.get(content_id) else {
            debug!(content_id, "targeted recompute for unknown item");
            return false;
        };

        let candidates = self.candidates(now);
        let tag_counts = Self::tag_counts(&candidates);

        match self.compute(&item, &tag_counts, candidates.len(), now) {
            Some(record) => self.store.upsert(record),
            None => {
                self.store.remove(content_id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::StaticRuleProvider;
    use crate::content::{ContentType, Tag};
    use crate::store::{
        InteractionEvent, InteractionKind, MemoryContentStore, MemoryInteractionStore,
    };

    fn item(id: &str, tag: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type: ContentType::Event,
            title: format!("event {id}"),
            description: Some("a well described event".to_string()),
            tags: vec![Tag::new(tag, "cause")],
            location: None,
            created_at: Utc::now() - chrono::Duration::days(1),
            starts_at: None,
            organization_id: None,
            verified_owner: true,
            moderation: Default::default(),
            age_restricted: false,
            jurisdictions: Vec::new(),
            funding_disclosure: None,
        }
    }

    fn event(id: &str, kind: InteractionKind, hours_ago: i64) -> InteractionEvent {
        InteractionEvent {
            content_id: id.to_string(),
            user_id: None,
            kind,
            tags: Vec::new(),
            at: Utc::now() - chrono::Duration::hours(hours_ago),
        }
    }

    fn analyzer(
        items: Vec<ContentItem>,
        events: Vec<InteractionEvent>,
    ) -> (TrendingAnalyzer, Arc<TrendingStore>) {
        let store = Arc::new(TrendingStore::new());
        let analyzer = TrendingAnalyzer::new(
            TrendingConfig::default(),
            Arc::new(MemoryContentStore::with_items(items)),
            Arc::new(MemoryInteractionStore::with_events(events)),
            Arc::new(ComplianceFilter::new(Arc::new(
                StaticRuleProvider::default(),
            ))),
            Arc::clone(&store),
        );
        (analyzer, store)
    }

    #[test]
    fn test_cold_item_excluded() {
        // No interactions at all: velocity and amplification are 0, so the
        // combined score stays below the 0.5 threshold.
        let (analyzer, store) = analyzer(vec![item("cold", "niche")], Vec::new());
        let stats = analyzer.batch_pass(Utc::now());

        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.stored, 0);
        assert!(store.get("cold").is_none());
    }

    #[test]
    fn test_hot_item_stored() {
        let mut events: Vec<InteractionEvent> = (0..40)
            .map(|i| event("hot", InteractionKind::View, i % 12))
            .collect();
        events.extend((0..30).map(|_| event("hot", InteractionKind::Share, 2)));

        let (analyzer, store) = analyzer(vec![item("hot", "healthcare")], events);
        let stats = analyzer.batch_pass(Utc::now());

        assert_eq!(stats.stored, 1);
        let record = store.get("hot").unwrap();
        assert!(record.score >= 0.5);
        assert!(record.signals.velocity > 0.9);
    }

    #[test]
    fn test_below_threshold_record_is_removed() {
        let events: Vec<InteractionEvent> = (0..40)
            .map(|i| event("fading", InteractionKind::Share, i % 12))
            .collect();
        let (analyzer, store) = analyzer(vec![item("fading", "cause")], events);

        analyzer.batch_pass(Utc::now());
        assert!(store.get("fading").is_some());

        // A later pass where the activity has left the window drops the
        // record entirely.
        let later = Utc::now() + chrono::Duration::days(10);
        analyzer.batch_pass(later);
        assert!(store.get("fading").is_none());
    }

    #[test]
    fn test_targeted_recompute_single_item() {
        let events: Vec<InteractionEvent> = (0..50)
            .map(|_| event("spike", InteractionKind::Share, 1))
            .collect();
        let (analyzer, store) = analyzer(
            vec![item("spike", "housing"), item("quiet", "parks")],
            events,
        );

        assert!(analyzer.recompute_item("spike", Utc::now()));
        assert!(store.get("spike").is_some());
        // Only the targeted item was recomputed.
        assert!(store.get("quiet").is_none());
    }

    #[test]
    fn test_non_compliant_item_scores_zero_compliance() {
        let mut bad = item("bad", "cause");
        bad.moderation = crate::content::ModerationStatus::Removed;
        let events: Vec<InteractionEvent> = (0..50)
            .map(|_| event("bad", InteractionKind::Share, 1))
            .collect();

        let (analyzer, store) = analyzer(vec![bad], events);
        analyzer.batch_pass(Utc::now());

        if let Some(record) = store.get("bad") {
            assert_eq!(record.signals.compliance, 0.0);
        }
    }
}
