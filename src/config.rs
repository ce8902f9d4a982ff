//! Top-level configuration for the discovery engine.
//!
//! Every component owns its own configuration struct; this module aggregates
//! them so an engine can be configured (and serialized) as one unit. All
//! weighting constants are configuration defaults, not validated constants —
//! the only hard invariant is that each weight set sums to 1.0.

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::error::Result;
use crate::explore::ExploreConfig;
use crate::query::QueryProcessorConfig;
use crate::ranking::RankingConfig;
use crate::recommend::RecommendationConfig;
use crate::search::SearchConfig;
use crate::trending::TrendingConfig;

/// Configuration for the whole discovery engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Query processing configuration.
    pub query: QueryProcessorConfig,
    /// Search orchestration configuration.
    pub search: SearchConfig,
    /// Ranking configuration.
    pub ranking: RankingConfig,
    /// Trending analysis configuration.
    pub trending: TrendingConfig,
    /// Recommendation blending configuration.
    pub recommendation: RecommendationConfig,
    /// Explore curation configuration.
    pub explore: ExploreConfig,
    /// Cache freshness configuration.
    pub cache: CacheConfig,
}

impl DiscoveryConfig {
    /// Validate the full configuration, in particular that every weight set
    /// sums to 1.0.
    pub fn validate(&self) -> Result<()> {
        self.ranking.validate()?;
        self.trending.validate()?;
        self.recommendation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DiscoveryConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DiscoveryConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DiscoveryConfig = serde_json::from_str(&json).unwrap();
        assert!(back.validate().is_ok());
    }
}
