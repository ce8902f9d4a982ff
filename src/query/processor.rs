//! Query processor: raw string in, [`ProcessedQuery`] out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::GeoPoint;
use crate::error::{PharosError, Result};
use crate::query::entity::{EntityExtractor, KeywordEntityExtractor};
use crate::query::expansion::expand_query;
use crate::query::intent::{QueryIntent, classify_intent};

/// Configuration for query processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryProcessorConfig {
    /// Maximum sanitized query length in characters; longer input is
    /// truncated, not rejected.
    pub max_query_len: usize,
}

impl Default for QueryProcessorConfig {
    fn default() -> Self {
        Self { max_query_len: 256 }
    }
}

/// Per-request caller context consumed by query processing.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// Requesting user, if authenticated.
    pub user_id: Option<String>,
    /// Caller location.
    pub location: Option<GeoPoint>,
    /// Human-readable region label ("Ohio", "Travis County"), used for
    /// location-qualified expansion terms.
    pub region: Option<String>,
}

/// The processed form of a raw query. Created once per request, immutable,
/// discarded after the response.
#[derive(Debug, Clone)]
pub struct ProcessedQuery {
    /// Raw input as received.
    pub original: String,
    /// Sanitized lowercase text.
    pub cleaned: String,
    /// Disjunctive expanded text.
    pub expanded: String,
    /// Detected intent.
    pub intent: QueryIntent,
    /// Extracted entities, in first-occurrence order.
    pub entities: Vec<String>,
    /// Synonyms applied during expansion.
    pub synonyms: Vec<String>,
    /// Processing start time, for latency accounting.
    pub started_at: DateTime<Utc>,
}

impl ProcessedQuery {
    /// An empty query is a valid browse request, routed to the explore
    /// surface instead of search.
    pub fn is_browse(&self) -> bool {
        self.cleaned.is_empty()
    }
}

/// Normalizes and expands raw queries.
pub struct QueryProcessor {
    config: QueryProcessorConfig,
    extractor: Arc<dyn EntityExtractor>,
}

impl QueryProcessor {
    /// Create a processor with the default keyword entity extractor.
    pub fn new(config: QueryProcessorConfig) -> Self {
        Self {
            config,
            extractor: Arc::new(KeywordEntityExtractor::new()),
        }
    }

    /// Replace the entity extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Process a raw query. Deterministic for identical input and context.
    ///
    /// Fails only on malformed input (embedded NUL or replacement
    /// characters, i.e. a non-text payload); an empty query succeeds and is
    /// flagged as a browse request.
    pub fn process(&self, raw: &str, context: &QueryContext) -> Result<ProcessedQuery> {
        if raw.contains('\u{0}') || raw.contains('\u{FFFD}') {
            return Err(PharosError::invalid_input(
                "query is not a text payload",
            ));
        }

        let cleaned = self.sanitize(raw);
        let intent = classify_intent(&cleaned);
        let (expanded, synonyms) = expand_query(&cleaned, intent, context);
        let entities = self.extractor.extract(raw);

        Ok(ProcessedQuery {
            original: raw.to_string(),
            cleaned,
            expanded,
            intent,
            entities,
            synonyms,
            started_at: Utc::now(),
        })
    }

    /// Strip control characters, collapse whitespace, lowercase, and cap
    /// length.
    fn sanitize(&self, raw: &str) -> String {
        let stripped: String = raw
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();

        let collapsed = stripped
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        collapsed.chars().take(self.config.max_query_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> QueryProcessor {
        QueryProcessor::new(QueryProcessorConfig::default())
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        let pq = processor()
            .process("donate\tto   clean\nenergy", &QueryContext::default())
            .unwrap();
        assert_eq!(pq.cleaned, "donate to clean energy");
    }

    #[test]
    fn test_malformed_input_rejected() {
        let result = processor().process("donate\u{0}now", &QueryContext::default());
        assert!(matches!(result, Err(PharosError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_query_is_browse() {
        let pq = processor().process("   ", &QueryContext::default()).unwrap();
        assert!(pq.is_browse());
        assert_eq!(pq.intent, QueryIntent::General);
    }

    #[test]
    fn test_length_cap() {
        let long = "donate ".repeat(100);
        let config = QueryProcessorConfig { max_query_len: 32 };
        let pq = QueryProcessor::new(config)
            .process(&long, &QueryContext::default())
            .unwrap();
        assert!(pq.cleaned.chars().count() <= 32);
    }

    #[test]
    fn test_donate_clean_energy_scenario() {
        let pq = processor()
            .process("donate to clean energy campaign", &QueryContext::default())
            .unwrap();
        assert_eq!(pq.intent, QueryIntent::Donate);
        assert!(pq.entities.contains(&"clean energy".to_string()));
        assert!(pq.expanded.contains("contribute"));
    }

    #[test]
    fn test_expansion_never_narrows() {
        let pq = processor()
            .process("healthcare", &QueryContext::default())
            .unwrap();
        // The cleaned query is always the first disjunct of the expansion.
        assert!(pq.expanded.starts_with(&pq.cleaned));
    }
}
