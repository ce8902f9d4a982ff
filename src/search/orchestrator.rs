//! Parallel fan-out of a processed query across all indices.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PharosError, Result};
use crate::query::ProcessedQuery;
use crate::search::index::{IndexKind, SearchIndexClient, StructuredQuery};
use crate::search::merger::{Candidate, merge_hits};

/// Configuration for search orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Independent timeout applied to each index branch.
    pub per_index_timeout: Duration,
    /// Maximum hits requested from each index.
    pub max_hits_per_index: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_index_timeout: Duration::from_millis(800),
            max_hits_per_index: 200,
        }
    }
}

/// Outcome of a fan-out: the merged candidate set plus the branches that
/// were lost to timeouts or errors.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Merged, unranked candidates.
    pub candidates: Vec<Candidate>,
    /// Indices that contributed nothing due to timeout or error.
    pub degraded: Vec<IndexKind>,
}

impl SearchOutcome {
    /// Whether any branch was lost.
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Issues one structured query per index concurrently and merges the hits.
pub struct SearchOrchestrator {
    clients: Vec<Arc<dyn SearchIndexClient>>,
    config: SearchConfig,
}

impl SearchOrchestrator {
    /// Create an orchestrator over a set of index clients.
    pub fn new(clients: Vec<Arc<dyn SearchIndexClient>>, config: SearchConfig) -> Self {
        Self { clients, config }
    }

    /// Number of registered index clients.
    pub fn index_count(&self) -> usize {
        self.clients.len()
    }

    /// Fan a processed query out across every index.
    ///
    /// Each branch has an independent timeout; a lost branch contributes
    /// zero candidates and a logged degradation. Only when every branch is
    /// lost does the call fail, so callers can distinguish "nothing
    /// relevant" from "search unavailable".
    pub async fn dispatch(&self, query: &ProcessedQuery) -> Result<SearchOutcome> {
        if self.clients.is_empty() {
            return Ok(SearchOutcome {
                candidates: Vec::new(),
                degraded: Vec::new(),
            });
        }

        let structured = StructuredQuery::from_processed(query, self.config.max_hits_per_index);
        let timeout = self.config.per_index_timeout;

        let branches = self.clients.iter().map(|client| {
            let structured = &structured;
            async move {
                let kind = client.kind();
                match tokio::time::timeout(timeout, client.search(structured)).await {
                    Ok(Ok(hits)) => (kind, Some(hits)),
                    Ok(Err(error)) => {
                        warn!(index = ?kind, %error, "search index branch failed");
                        (kind, None)
                    }
                    Err(_) => {
                        warn!(index = ?kind, timeout_ms = timeout.as_millis() as u64,
                            "search index branch timed out");
                        (kind, None)
                    }
                }
            }
        });

        let results = futures::future::join_all(branches).await;

        let mut per_index = Vec::new();
        let mut degraded = Vec::new();
        for (kind, hits) in results {
            match hits {
                Some(hits) => per_index.push((kind, hits)),
                None => degraded.push(kind),
            }
        }

        if per_index.is_empty() {
            return Err(PharosError::unavailable(
                "all search index branches failed",
            ));
        }

        Ok(SearchOutcome {
            candidates: merge_hits(per_index),
            degraded,
        })
    }
}
