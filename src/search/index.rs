//! Search index collaborator boundary.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::ProcessedQuery;

/// The indices a query fans out across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Main content index (events, fundraisers).
    Content,
    /// Tag index.
    Tags,
    /// Organization index.
    Organizations,
    /// Location index.
    Locations,
    /// People index.
    People,
}

impl IndexKind {
    /// All index kinds, in fan-out order.
    pub fn all() -> [IndexKind; 5] {
        [
            IndexKind::Content,
            IndexKind::Tags,
            IndexKind::Organizations,
            IndexKind::Locations,
            IndexKind::People,
        ]
    }
}

/// Strength class of a text match. Exact phrase beats fuzzy beats partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    /// The whole query matched as a phrase.
    Exact,
    /// Terms matched within the fuzziness tolerance.
    Fuzzy,
    /// Only some terms matched.
    Partial,
}

impl MatchQuality {
    /// Ordering rank; higher is a stronger match.
    pub fn rank(&self) -> u8 {
        match self {
            MatchQuality::Exact => 2,
            MatchQuality::Fuzzy => 1,
            MatchQuality::Partial => 0,
        }
    }
}

/// The structured query sent to one index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Primary (sanitized) query text.
    pub text: String,
    /// Disjunctive expansion terms; matching any of them qualifies an item,
    /// never disqualifies one.
    pub expansions: Vec<String>,
    /// Field name -> boost weight.
    pub field_weights: HashMap<String, f32>,
    /// Maximum edit distance tolerated per term.
    pub fuzziness: u32,
    /// Maximum hits requested from the index.
    pub limit: usize,
}

impl StructuredQuery {
    /// Build the per-index query from a processed query.
    pub fn from_processed(query: &ProcessedQuery, limit: usize) -> Self {
        let expansions = query
            .expanded
            .split(" OR ")
            .map(str::trim)
            .filter(|term| !term.is_empty() && *term != query.cleaned)
            .map(str::to_string)
            .collect();

        let mut field_weights = HashMap::new();
        field_weights.insert("title".to_string(), 2.0);
        field_weights.insert("tags".to_string(), 1.5);
        field_weights.insert("description".to_string(), 1.0);

        Self {
            text: query.cleaned.clone(),
            expansions,
            field_weights,
            fuzziness: 1,
            limit,
        }
    }

    /// Whitespace tokens of the primary text.
    pub fn tokens(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

/// A single hit returned by an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHit {
    /// Matched content identifier.
    pub content_id: String,
    /// Index-local match score in [0, 1].
    pub score: f32,
    /// Match strength class.
    pub quality: MatchQuality,
    /// Highlighted snippet, if the index produced one.
    pub snippet: Option<String>,
}

/// One external full-text index. The engine treats implementations as black
/// boxes obeying a latency budget; hits come back unranked relative to other
/// indices.
pub trait SearchIndexClient: Send + Sync {
    /// Which index this client queries.
    fn kind(&self) -> IndexKind;

    /// Execute a structured query against the index.
    fn search<'a>(&'a self, query: &'a StructuredQuery) -> BoxFuture<'a, Result<Vec<IndexHit>>>;
}
