//! Ranking engine combining component scores into one deterministic order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, UserProfile};
use crate::error::Result;
use crate::ranking::scorer::{
    ComponentScores, RankingWeights, freshness_score, personalization_score, popularity_score,
    quality_score, relevance_score,
};
use crate::search::merger::Candidate;

/// Configuration for the ranking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Component weights; must sum to 1.0.
    pub weights: RankingWeights,
    /// Age at which freshness reaches 0.
    pub freshness_horizon_days: u32,
    /// Engagement count scoring popularity 0.5.
    pub popularity_half_saturation: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            freshness_horizon_days: 30,
            popularity_half_saturation: 100.0,
        }
    }
}

impl RankingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

/// One candidate with the collaborator data ranking needs.
#[derive(Debug, Clone)]
pub struct RankingInput {
    /// The merged search candidate.
    pub candidate: Candidate,
    /// The content record behind it.
    pub item: ContentItem,
    /// All-time engagement count.
    pub engagement: u64,
}

/// A ranked result with its score breakdown. Transient, recomputed per
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Content identifier.
    pub content_id: String,
    /// Component scores.
    pub scores: ComponentScores,
    /// Weighted combined score.
    pub combined: f64,
    /// Creation timestamp, kept for tie-breaking and response assembly.
    pub created_at: DateTime<Utc>,
}

/// Scores candidates along independent dimensions and orders them.
pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    /// Create a ranking engine.
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    /// Score and order candidates.
    ///
    /// Ordering is fully deterministic: combined score descending, then
    /// creation timestamp descending, then content identifier ascending.
    pub fn rank(
        &self,
        now: DateTime<Utc>,
        profile: Option<&UserProfile>,
        inputs: Vec<RankingInput>,
    ) -> Vec<ScoredResult> {
        let mut results: Vec<ScoredResult> = inputs
            .into_iter()
            .map(|input| self.score(now, profile, &input))
            .collect();

        results.sort_by(|a, b| {
            b.combined
                .partial_cmp(&a.combined)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        results
    }

    fn score(
        &self,
        now: DateTime<Utc>,
        profile: Option<&UserProfile>,
        input: &RankingInput,
    ) -> ScoredResult {
        let scores = ComponentScores {
            relevance: relevance_score(&input.candidate),
            quality: quality_score(&input.item),
            freshness: freshness_score(
                input.item.created_at,
                now,
                self.config.freshness_horizon_days,
            ),
            popularity: popularity_score(
                input.engagement,
                self.config.popularity_half_saturation,
            ),
            personalization: personalization_score(&input.item, profile),
        };

        ScoredResult {
            content_id: input.item.id.clone(),
            scores,
            combined: self.config.weights.combine(&scores),
            created_at: input.item.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentType, Tag};
    use crate::search::index::{IndexKind, MatchQuality};

    fn input(id: &str, engagement: u64, created_at: DateTime<Utc>) -> RankingInput {
        RankingInput {
            candidate: Candidate {
                content_id: id.to_string(),
                score: 0.8,
                quality: MatchQuality::Exact,
                matched_indices: vec![IndexKind::Content],
                snippet: None,
            },
            item: ContentItem {
                id: id.to_string(),
                content_type: ContentType::Fundraiser,
                title: format!("fundraiser {id}"),
                description: Some("description".to_string()),
                tags: vec![Tag::new("clean energy", "environment")],
                location: None,
                created_at,
                starts_at: None,
                organization_id: None,
                verified_owner: true,
                moderation: Default::default(),
                age_restricted: false,
                jurisdictions: Vec::new(),
                funding_disclosure: None,
            },
            engagement,
        }
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let engine = RankingEngine::new(RankingConfig::default());
        let now = Utc::now();
        let created = now - chrono::Duration::days(1);

        let inputs = vec![
            input("b", 50, created),
            input("a", 50, created),
            input("c", 500, created),
        ];

        let first = engine.rank(now, None, inputs.clone());
        let second = engine.rank(now, None, inputs);
        let order: Vec<&str> = first.iter().map(|r| r.content_id.as_str()).collect();
        let order2: Vec<&str> = second.iter().map(|r| r.content_id.as_str()).collect();

        assert_eq!(order, order2);
        // Higher engagement wins; equal candidates tie-break by id.
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_popularity_breaks_equal_relevance() {
        let engine = RankingEngine::new(RankingConfig::default());
        let now = Utc::now();
        let created = now - chrono::Duration::days(2);

        let results = engine.rank(
            now,
            None,
            vec![input("low", 5, created), input("high", 400, created)],
        );
        assert_eq!(results[0].content_id, "high");
        assert!(results[0].scores.popularity > results[1].scores.popularity);
        assert_eq!(results[0].scores.relevance, results[1].scores.relevance);
    }

    #[test]
    fn test_recency_tie_break_before_id() {
        // Zero out freshness so the combined scores tie exactly and only the
        // tie-break fields decide the order.
        let config = RankingConfig {
            weights: RankingWeights {
                relevance: 0.55,
                quality: 0.20,
                freshness: 0.0,
                popularity: 0.15,
                personalization: 0.10,
            },
            ..RankingConfig::default()
        };
        let engine = RankingEngine::new(config);
        let now = Utc::now();

        // Same engagement and equal combined score; the fresher item must
        // rank first even though its id sorts later.
        let results = engine.rank(
            now,
            None,
            vec![
                input("a", 10, now - chrono::Duration::days(10)),
                input("z", 10, now - chrono::Duration::days(1)),
            ],
        );
        assert_eq!(results[0].combined, results[1].combined);
        assert_eq!(results[0].content_id, "z");
    }

    #[test]
    fn test_combined_is_weighted_sum() {
        let engine = RankingEngine::new(RankingConfig::default());
        let now = Utc::now();
        let results = engine.rank(now, None, vec![input("a", 100, now)]);

        let result = &results[0];
        let weights = RankingWeights::default();
        let expected = weights.combine(&result.scores);
        assert!((result.combined - expected).abs() < 1e-12);
    }
}
