//! Transport-agnostic response contract.
//!
//! A discovery response is an ordered sequence of content summaries plus a
//! pagination cursor and a total-count estimate. Empty results are valid
//! and distinct from errors.

use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, ContentType};
use crate::error::{PharosError, Result};
use crate::explore::ExploreSection;
use crate::ranking::ComponentScores;

/// One content item in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSummary {
    /// Content identifier.
    pub content_id: String,
    /// Item kind.
    pub content_type: ContentType,
    /// Title.
    pub title: String,
    /// Surface-specific score (combined ranking score, trending score, or
    /// blend score).
    pub score: f64,
    /// Per-dimension score breakdown, when the surface computes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ComponentScores>,
    /// Compliance warnings attached to this item.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ContentSummary {
    /// Build a summary from an item.
    pub fn from_item(item: &ContentItem, score: f64, warnings: Vec<String>) -> Self {
        Self {
            content_id: item.id.clone(),
            content_type: item.content_type,
            title: item.title.clone(),
            score,
            breakdown: None,
            warnings,
        }
    }

    /// Attach a score breakdown.
    pub fn with_breakdown(mut self, breakdown: ComponentScores) -> Self {
        self.breakdown = Some(breakdown);
        self
    }
}

/// An ordered, paginated discovery response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    /// Ranked summaries for the requested page.
    pub results: Vec<ContentSummary>,
    /// Cursor for the next page, absent on the last page.
    pub next_cursor: Option<String>,
    /// Estimated total matching items.
    pub total_estimate: usize,
    /// Whether any retrieval branch was lost to a timeout or error.
    #[serde(default)]
    pub degraded: bool,
}

/// The explore surface response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreResponse {
    /// Non-empty sections, in fixed order.
    pub sections: Vec<ExploreSection>,
}

/// Pagination parameters for a request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Opaque cursor from a previous response.
    pub cursor: Option<String>,
    /// Page size.
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: 20,
        }
    }
}

impl PageRequest {
    /// Decode the cursor into an offset. An absent cursor is offset 0; a
    /// malformed cursor is rejected as caller input error.
    pub fn offset(&self) -> Result<usize> {
        match &self.cursor {
            None => Ok(0),
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| PharosError::invalid_input(format!("malformed cursor: {cursor}"))),
        }
    }
}

/// Slice one page out of an ordered result list.
pub fn paginate(
    summaries: Vec<ContentSummary>,
    offset: usize,
    limit: usize,
    degraded: bool,
) -> DiscoveryResponse {
    let total_estimate = summaries.len();
    let page: Vec<ContentSummary> = summaries.into_iter().skip(offset).take(limit).collect();

    let consumed = offset + page.len();
    let next_cursor = (consumed < total_estimate).then(|| consumed.to_string());

    DiscoveryResponse {
        results: page,
        next_cursor,
        total_estimate,
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, score: f64) -> ContentSummary {
        ContentSummary {
            content_id: id.to_string(),
            content_type: ContentType::Event,
            title: id.to_string(),
            score,
            breakdown: None,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_pagination_cursor_round_trip() {
        let all: Vec<ContentSummary> = (0..5).map(|i| summary(&format!("i{i}"), 0.5)).collect();

        let first = paginate(all.clone(), 0, 2, false);
        assert_eq!(first.results.len(), 2);
        assert_eq!(first.total_estimate, 5);

        let cursor = first.next_cursor.unwrap();
        let page = PageRequest {
            cursor: Some(cursor),
            limit: 2,
        };
        let second = paginate(all, page.offset().unwrap(), page.limit, false);
        assert_eq!(second.results[0].content_id, "i2");
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let all: Vec<ContentSummary> = (0..3).map(|i| summary(&format!("i{i}"), 0.5)).collect();
        let response = paginate(all, 2, 10, false);
        assert_eq!(response.results.len(), 1);
        assert!(response.next_cursor.is_none());
    }

    #[test]
    fn test_malformed_cursor_rejected() {
        let page = PageRequest {
            cursor: Some("not-a-number".to_string()),
            limit: 10,
        };
        assert!(matches!(page.offset(), Err(PharosError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_results_are_valid() {
        let response = paginate(Vec::new(), 0, 10, false);
        assert!(response.results.is_empty());
        assert_eq!(response.total_estimate, 0);
        assert!(response.next_cursor.is_none());
    }
}
