//! Trending signal computations, each bounded to [0, 1].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceVerdict;
use crate::content::ContentItem;
use crate::util::clamp01;

/// Weights combining the five trending signals. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendingWeights {
    pub velocity: f64,
    pub amplification: f64,
    pub quality: f64,
    pub diversity: f64,
    pub compliance: f64,
}

impl Default for TrendingWeights {
    fn default() -> Self {
        Self {
            velocity: 0.35,
            amplification: 0.25,
            quality: 0.15,
            diversity: 0.15,
            compliance: 0.10,
        }
    }
}

impl TrendingWeights {
    /// Validate that the weights sum to 1.0.
    pub fn validate(&self) -> crate::error::Result<()> {
        let sum = self.velocity
            + self.amplification
            + self.quality
            + self.diversity
            + self.compliance;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(crate::error::PharosError::invalid_config(format!(
                "trending weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Caps normalizing amplification inputs before combination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AmplificationCaps {
    /// Shares counting as full amplification.
    pub shares: u64,
    /// Mentions counting as full amplification.
    pub mentions: u64,
    /// Cross-surface events counting as full amplification.
    pub cross_surface: u64,
}

impl Default for AmplificationCaps {
    fn default() -> Self {
        Self {
            shares: 50,
            mentions: 30,
            cross_surface: 20,
        }
    }
}

/// Velocity: current-window interaction count against the item's own
/// historical baseline, saturated into [0, 1]. A brand-new item with a zero
/// baseline scores high but never unbounded; zero interactions always score
/// exactly 0.
pub fn velocity_score(window_count: u64, baseline: f64) -> f64 {
    if window_count == 0 {
        return 0.0;
    }
    let ratio = window_count as f64 / (baseline.max(0.0) + 1.0);
    ratio / (ratio + 1.0)
}

/// Amplification: weighted combination of normalized shares, mentions, and
/// cross-surface activity, each capped before combination.
pub fn amplification_score(
    shares: u64,
    mentions: u64,
    cross_surface: u64,
    caps: &AmplificationCaps,
) -> f64 {
    let norm = |count: u64, cap: u64| (count as f64 / cap.max(1) as f64).min(1.0);

    0.4 * norm(shares, caps.shares)
        + 0.3 * norm(mentions, caps.mentions)
        + 0.3 * norm(cross_surface, caps.cross_surface)
}

/// Diversity: rewards items whose tags are underrepresented in the current
/// candidate set. Computed relative to that set, not globally.
pub fn diversity_score(
    item: &ContentItem,
    tag_counts: &HashMap<String, usize>,
    candidate_count: usize,
) -> f64 {
    if item.tags.is_empty() || candidate_count == 0 {
        return 0.0;
    }

    let sum: f64 = item
        .tags
        .iter()
        .map(|tag| {
            let share = *tag_counts.get(&tag.name).unwrap_or(&0) as f64 / candidate_count as f64;
            1.0 - share.min(1.0)
        })
        .sum();
    clamp01(sum / item.tags.len() as f64)
}

/// Compliance signal: a failing verdict zeroes the signal; each warning on
/// a passing verdict deducts a step.
pub fn compliance_signal(verdict: &ComplianceVerdict) -> f64 {
    if !verdict.passed {
        return 0.0;
    }
    clamp01(1.0 - 0.1 * verdict.warnings.len() as f64)
}
