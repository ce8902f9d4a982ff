//! Independent component scorers, each normalized to [0, 1].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, UserProfile, cosine_overlap};
use crate::error::{PharosError, Result};
use crate::search::index::MatchQuality;
use crate::search::merger::Candidate;
use crate::util::clamp01;

/// Per-dimension scores for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Text-match strength against the processed query.
    pub relevance: f64,
    /// Content completeness/credibility proxy.
    pub quality: f64,
    /// Decreasing function of age.
    pub freshness: f64,
    /// Saturating function of engagement.
    pub popularity: f64,
    /// Tag-affinity overlap with the requesting user.
    pub personalization: f64,
}

/// Weights combining component scores. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankingWeights {
    pub relevance: f64,
    pub quality: f64,
    pub freshness: f64,
    pub popularity: f64,
    pub personalization: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            relevance: 0.40,
            quality: 0.20,
            freshness: 0.15,
            popularity: 0.15,
            personalization: 0.10,
        }
    }
}

impl RankingWeights {
    /// Validate that the weights sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let sum = self.relevance
            + self.quality
            + self.freshness
            + self.popularity
            + self.personalization;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(PharosError::invalid_config(format!(
                "ranking weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }

    /// Weighted combination of component scores.
    pub fn combine(&self, scores: &ComponentScores) -> f64 {
        self.relevance * scores.relevance
            + self.quality * scores.quality
            + self.freshness * scores.freshness
            + self.popularity * scores.popularity
            + self.personalization * scores.personalization
    }
}

/// Maximum relevance bonus from matching in multiple indices.
const MULTI_INDEX_BONUS_CAP: f64 = 0.1;

/// Relevance: tiered by match quality so an exact phrase always outranks a
/// fuzzy match, which always outranks a partial term match; the index-local
/// score orders candidates within a tier. Multi-index matches get a flat
/// bonus capped at +0.1.
pub fn relevance_score(candidate: &Candidate) -> f64 {
    let index_score = clamp01(candidate.score as f64);
    let base = match candidate.quality {
        MatchQuality::Exact => 0.75 + 0.25 * index_score,
        MatchQuality::Fuzzy => 0.45 + 0.25 * index_score,
        MatchQuality::Partial => 0.10 + 0.30 * index_score,
    };

    let extra_indices = candidate.matched_indices.len().saturating_sub(1);
    let bonus = (0.05 * extra_indices as f64).min(MULTI_INDEX_BONUS_CAP);

    clamp01(base + bonus)
}

/// Quality: completeness and credibility proxy.
pub fn quality_score(item: &ContentItem) -> f64 {
    let has_description = item
        .description
        .as_ref()
        .map(|d| !d.trim().is_empty())
        .unwrap_or(false);
    let tag_coverage = (item.tags.len() as f64 / 5.0).min(1.0);

    let description_part = if has_description { 0.4 } else { 0.0 };
    let verified_part = if item.verified_owner { 0.3 } else { 0.0 };
    description_part + verified_part + 0.3 * tag_coverage
}

/// Freshness: linear decay reaching 0 at the horizon, never negative.
pub fn freshness_score(created_at: DateTime<Utc>, now: DateTime<Utc>, horizon_days: u32) -> f64 {
    if horizon_days == 0 {
        return 0.0;
    }
    let age_days = (now - created_at).num_seconds() as f64 / 86_400.0;
    if age_days < 0.0 {
        return 1.0;
    }
    clamp01(1.0 - age_days / horizon_days as f64)
}

/// Popularity: saturating in engagement count, never unbounded.
/// `half_saturation` is the engagement level scoring 0.5.
pub fn popularity_score(engagement: u64, half_saturation: f64) -> f64 {
    let engagement = engagement as f64;
    engagement / (engagement + half_saturation.max(1.0))
}

/// Personalization: cosine overlap between the candidate's weighted tag
/// vector and the requester's affinity vector; 0 without user context or
/// when the profile forbids personalization.
pub fn personalization_score(item: &ContentItem, profile: Option<&UserProfile>) -> f64 {
    match profile {
        Some(profile) if profile.allows_personalization() => {
            clamp01(cosine_overlap(&item.tag_vector(), &profile.tag_affinities))
        }
        _ => 0.0,
    }
}
