//! Recommendation blending engine.
//!
//! Sources run concurrently with independent timeouts and merge by additive
//! accumulation: an identifier's combined score is the sum of
//! `source_score x source_weight` over every source that scored it. Missing
//! coverage contributes zero; it never excludes a candidate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::content::UserProfile;
use crate::error::{PharosError, Result};
use crate::recommend::sources::{RecommendationSource, SourceKind};

/// Per-source blend weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlendWeights {
    pub content_based: f64,
    pub collaborative: f64,
    pub trending: f64,
    pub location: f64,
    pub serendipity: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            content_based: 0.35,
            collaborative: 0.25,
            trending: 0.20,
            location: 0.15,
            serendipity: 0.05,
        }
    }
}

impl BlendWeights {
    /// Weight for one source kind.
    pub fn weight_for(&self, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::ContentBased => self.content_based,
            SourceKind::Collaborative => self.collaborative,
            SourceKind::Trending => self.trending,
            SourceKind::Location => self.location,
            SourceKind::Serendipity => self.serendipity,
        }
    }

    /// Validate that the weights sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let sum = self.content_based
            + self.collaborative
            + self.trending
            + self.location
            + self.serendipity;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(PharosError::invalid_config(format!(
                "blend weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Configuration for recommendation blending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Per-source blend weights.
    pub weights: BlendWeights,
    /// Output cap.
    pub max_results: usize,
    /// Candidates requested from each source.
    pub per_source_limit: usize,
    /// Independent timeout applied to each source.
    pub per_source_timeout: Duration,
    /// Minimum cosine similarity for content-based candidates.
    pub min_similarity: f64,
    /// Interaction growth multiple qualifying a topic for serendipity.
    pub tag_growth_threshold: f64,
    /// Location radius for the location source, in kilometers.
    pub location_radius_km: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            weights: BlendWeights::default(),
            max_results: 100,
            per_source_limit: 100,
            per_source_timeout: Duration::from_millis(800),
            min_similarity: 0.3,
            tag_growth_threshold: 1.5,
            location_radius_km: 100.0,
        }
    }
}

impl RecommendationConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

/// A blended candidate: the accumulated score plus every contributing
/// source's own score. Scores accumulate across sources; they are never
/// overwritten last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    /// Content identifier.
    pub content_id: String,
    /// Accumulated weighted score.
    pub combined: f64,
    /// Per-source raw scores.
    pub source_scores: HashMap<SourceKind, f64>,
}

impl RecommendationCandidate {
    /// The sources that produced a score for this candidate.
    pub fn sources(&self) -> Vec<SourceKind> {
        self.source_scores.keys().copied().collect()
    }
}

/// Outcome of one blend: ordered candidates plus the sources that were lost
/// to timeouts or errors.
#[derive(Debug)]
pub struct BlendOutcome {
    /// Blended candidates, ordered.
    pub candidates: Vec<RecommendationCandidate>,
    /// Sources that contributed nothing due to timeout or error.
    pub degraded: Vec<SourceKind>,
}

/// Blends candidate lists from independent sources.
pub struct RecommendationEngine {
    sources: Vec<Arc<dyn RecommendationSource>>,
    config: RecommendationConfig,
}

impl RecommendationEngine {
    /// Create an engine over a set of sources.
    pub fn new(sources: Vec<Arc<dyn RecommendationSource>>, config: RecommendationConfig) -> Self {
        Self { sources, config }
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Generate blended recommendations for a user.
    ///
    /// All sources run concurrently with independent timeouts; a lost
    /// source degrades the blend. Only when every source is lost does the
    /// call fail.
    pub async fn recommend(&self, profile: Option<&UserProfile>) -> Result<BlendOutcome> {
        if self.sources.is_empty() {
            return Ok(BlendOutcome {
                candidates: Vec::new(),
                degraded: Vec::new(),
            });
        }

        let timeout = self.config.per_source_timeout;
        let limit = self.config.per_source_limit;

        let branches = self.sources.iter().map(|source| async move {
            let kind = source.kind();
            match tokio::time::timeout(timeout, source.candidates(profile, limit)).await {
                Ok(Ok(scores)) => (kind, Some(scores)),
                Ok(Err(error)) => {
                    warn!(source = ?kind, %error, "recommendation source failed");
                    (kind, None)
                }
                Err(_) => {
                    warn!(source = ?kind, "recommendation source timed out");
                    (kind, None)
                }
            }
        });

        let results = futures::future::join_all(branches).await;

        let mut lost = 0;
        let mut degraded = Vec::new();
        let mut merged: HashMap<String, RecommendationCandidate> = HashMap::new();

        for (kind, scores) in results {
            let Some(scores) = scores else {
                lost += 1;
                degraded.push(kind);
                continue;
            };

            let weight = self.config.weights.weight_for(kind);
            if weight <= f64::EPSILON {
                // A zero-weight source cannot influence the output; skip it
                // so its presence or absence is a no-op.
                continue;
            }

            for (content_id, score) in scores {
                let entry = merged
                    .entry(content_id.clone())
                    .or_insert_with(|| RecommendationCandidate {
                        content_id,
                        combined: 0.0,
                        source_scores: HashMap::new(),
                    });
                entry.combined += score * weight;
                entry.source_scores.insert(kind, score);
            }
        }

        if lost == self.sources.len() {
            return Err(PharosError::unavailable(
                "all recommendation sources failed",
            ));
        }

        let mut candidates: Vec<RecommendationCandidate> = merged.into_values().collect();
        candidates.sort_by(|a, b| {
            b.combined
                .partial_cmp(&a.combined)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        candidates.truncate(self.config.max_results);

        Ok(BlendOutcome {
            candidates,
            degraded,
        })
    }
}
