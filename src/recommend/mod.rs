//! Multi-source recommendation blending.

pub mod engine;
pub mod sources;

pub use engine::{
    BlendOutcome, BlendWeights, RecommendationCandidate, RecommendationConfig,
    RecommendationEngine,
};
pub use sources::{
    CollaborativeSource, ContentBasedSource, LocationSource, RecommendationSource,
    SerendipitySource, SourceKind, TrendingSource,
};
