//! Recommendation candidate sources.
//!
//! Each source independently scores a subset of content identifiers in
//! [0, 1]. Sources never exclude one another's candidates; blending is the
//! engine's job.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use crate::content::{UserProfile, cosine_overlap};
use crate::error::Result;
use crate::store::{ContentStore, InteractionStore};
use crate::trending::TrendingStore;
use crate::util::clamp01;

/// The five blending sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Tag-similarity to the user's affinity profile.
    ContentBased,
    /// User-similarity collaborative filtering.
    Collaborative,
    /// Currently trending items.
    Trending,
    /// Items near the user's location.
    Location,
    /// Deliberate novelty.
    Serendipity,
}

/// One recommendation source.
pub trait RecommendationSource: Send + Sync {
    /// Which source this is.
    fn kind(&self) -> SourceKind;

    /// Score a subset of content identifiers for the user, each in [0, 1].
    fn candidates<'a>(
        &'a self,
        profile: Option<&'a UserProfile>,
        limit: usize,
    ) -> BoxFuture<'a, Result<HashMap<String, f64>>>;
}

/// Content-based similarity: cosine between the user's affinity vector and
/// each candidate's weighted tag vector. Candidates below the minimum
/// similarity do not qualify.
pub struct ContentBasedSource {
    content: Arc<dyn ContentStore>,
    min_similarity: f64,
}

impl ContentBasedSource {
    /// Create the source.
    pub fn new(content: Arc<dyn ContentStore>, min_similarity: f64) -> Self {
        Self {
            content,
            min_similarity,
        }
    }
}

impl RecommendationSource for ContentBasedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ContentBased
    }

    fn candidates<'a>(
        &'a self,
        profile: Option<&'a UserProfile>,
        limit: usize,
    ) -> BoxFuture<'a, Result<HashMap<String, f64>>> {
        async move {
            let Some(profile) = profile.filter(|p| p.allows_personalization()) else {
                return Ok(HashMap::new());
            };

            let mut scores = HashMap::new();
            for tag in profile.top_tags(5) {
                for item in self.content.by_tag(&tag, limit) {
                    let similarity =
                        cosine_overlap(&profile.tag_affinities, &item.tag_vector());
                    if similarity >= self.min_similarity {
                        let entry = scores.entry(item.id).or_insert(0.0);
                        if similarity > *entry {
                            *entry = similarity;
                        }
                    }
                }
            }
            Ok(scores)
        }
        .boxed()
    }
}

/// Collaborative filtering: score items liked by users whose interaction
/// vectors resemble the requester's.
pub struct CollaborativeSource {
    interactions: Arc<dyn InteractionStore>,
    neighbor_count: usize,
}

impl CollaborativeSource {
    /// Create the source.
    pub fn new(interactions: Arc<dyn InteractionStore>) -> Self {
        Self {
            interactions,
            neighbor_count: 10,
        }
    }

    fn similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
        cosine_overlap(a, b)
    }
}

impl RecommendationSource for CollaborativeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Collaborative
    }

    fn candidates<'a>(
        &'a self,
        profile: Option<&'a UserProfile>,
        limit: usize,
    ) -> BoxFuture<'a, Result<HashMap<String, f64>>> {
        async move {
            let Some(profile) = profile.filter(|p| p.allows_personalization()) else {
                return Ok(HashMap::new());
            };

            let own = self.interactions.user_item_scores(&profile.user_id);
            if own.is_empty() {
                return Ok(HashMap::new());
            }

            // Nearest neighbors by interaction-vector similarity.
            let mut neighbors: Vec<(String, f64)> = self
                .interactions
                .users()
                .into_iter()
                .filter(|user| user != &profile.user_id)
                .filter_map(|user| {
                    let other = self.interactions.user_item_scores(&user);
                    let similarity = Self::similarity(&own, &other);
                    (similarity > 0.0).then_some((user, similarity))
                })
                .collect();
            neighbors.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            neighbors.truncate(self.neighbor_count);

            // Similarity-weighted mean of neighbor preferences for items the
            // user has not interacted with.
            let mut totals: HashMap<String, (f64, f64)> = HashMap::new();
            for (neighbor, similarity) in &neighbors {
                for (item, score) in self.interactions.user_item_scores(neighbor) {
                    if own.contains_key(&item) {
                        continue;
                    }
                    let entry = totals.entry(item).or_insert((0.0, 0.0));
                    entry.0 += similarity * score;
                    entry.1 += similarity;
                }
            }

            let mut scores: Vec<(String, f64)> = totals
                .into_iter()
                .map(|(item, (weighted, total))| (item, clamp01(weighted / total.max(1e-9))))
                .collect();
            scores.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            scores.truncate(limit);

            Ok(scores.into_iter().collect())
        }
        .boxed()
    }
}

/// Trending: the current trending list, scores taken from the records.
pub struct TrendingSource {
    store: Arc<TrendingStore>,
    min_score: f64,
}

impl TrendingSource {
    /// Create the source.
    pub fn new(store: Arc<TrendingStore>, min_score: f64) -> Self {
        Self { store, min_score }
    }
}

impl RecommendationSource for TrendingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Trending
    }

    fn candidates<'a>(
        &'a self,
        _profile: Option<&'a UserProfile>,
        limit: usize,
    ) -> BoxFuture<'a, Result<HashMap<String, f64>>> {
        async move {
            Ok(self
                .store
                .top(limit, self.min_score)
                .into_iter()
                .map(|record| (record.content_id, clamp01(record.score)))
                .collect())
        }
        .boxed()
    }
}

/// Location: items near the user's last known location, scored by
/// proximity.
pub struct LocationSource {
    content: Arc<dyn ContentStore>,
    radius_km: f64,
}

impl LocationSource {
    /// Create the source.
    pub fn new(content: Arc<dyn ContentStore>, radius_km: f64) -> Self {
        Self { content, radius_km }
    }
}

impl RecommendationSource for LocationSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Location
    }

    fn candidates<'a>(
        &'a self,
        profile: Option<&'a UserProfile>,
        limit: usize,
    ) -> BoxFuture<'a, Result<HashMap<String, f64>>> {
        async move {
            let Some(center) = profile.and_then(|p| p.location) else {
                return Ok(HashMap::new());
            };

            Ok(self
                .content
                .near(&center, self.radius_km, limit)
                .into_iter()
                .map(|item| {
                    let distance = item
                        .location
                        .map(|loc| center.distance_to(&loc))
                        .unwrap_or(self.radius_km);
                    let score = clamp01(1.0 - distance / self.radius_km.max(1e-9));
                    (item.id, score)
                })
                .collect())
        }
        .boxed()
    }
}

/// Base score given to serendipity picks; deliberately modest so the source
/// surfaces novelty without dominating.
const SERENDIPITY_SCORE: f64 = 0.6;

/// Serendipity: controlled novelty. Samples items from tags adjacent to but
/// unexplored in the user's profile, plus tags whose recent interaction
/// growth exceeds the configured multiple of baseline.
pub struct SerendipitySource {
    content: Arc<dyn ContentStore>,
    interactions: Arc<dyn InteractionStore>,
    growth_threshold: f64,
    window: std::time::Duration,
    items_per_tag: usize,
}

impl SerendipitySource {
    /// Create the source.
    pub fn new(
        content: Arc<dyn ContentStore>,
        interactions: Arc<dyn InteractionStore>,
        growth_threshold: f64,
        window: std::time::Duration,
    ) -> Self {
        Self {
            content,
            interactions,
            growth_threshold,
            window,
            items_per_tag: 3,
        }
    }
}

impl RecommendationSource for SerendipitySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Serendipity
    }

    fn candidates<'a>(
        &'a self,
        profile: Option<&'a UserProfile>,
        limit: usize,
    ) -> BoxFuture<'a, Result<HashMap<String, f64>>> {
        async move {
            let now = chrono::Utc::now();
            let catalog = self.content.popular_tags(50);

            let explored: std::collections::HashSet<&str> = profile
                .map(|p| p.tag_affinities.keys().map(String::as_str).collect())
                .unwrap_or_default();
            let explored_categories: std::collections::HashSet<&str> = catalog
                .iter()
                .filter(|tag| explored.contains(tag.name.as_str()))
                .map(|tag| tag.category.as_str())
                .collect();

            let mut picked_tags: Vec<&str> = Vec::new();
            for tag in &catalog {
                if explored.contains(tag.name.as_str()) {
                    continue;
                }
                // Adjacent-but-unexplored: same category as a profile tag.
                let adjacent = explored_categories.contains(tag.category.as_str());
                // Growing topic: interaction growth over the threshold.
                let growing = self.interactions.tag_growth(&tag.name, self.window, now)
                    >= self.growth_threshold;
                if adjacent || growing {
                    picked_tags.push(tag.name.as_str());
                }
            }

            let mut rng = rand::rng();
            let mut scores = HashMap::new();
            for tag in picked_tags {
                let pool = self.content.by_tag(tag, self.items_per_tag * 4);
                for item in pool
                    .into_iter()
                    .choose_multiple(&mut rng, self.items_per_tag)
                {
                    scores.entry(item.id).or_insert(SERENDIPITY_SCORE);
                    if scores.len() >= limit {
                        return Ok(scores);
                    }
                }
            }
            Ok(scores)
        }
        .boxed()
    }
}
