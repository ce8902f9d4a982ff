//! Multi-signal candidate ranking.

pub mod engine;
pub mod scorer;

pub use engine::{RankingConfig, RankingEngine, RankingInput, ScoredResult};
pub use scorer::{ComponentScores, RankingWeights};
