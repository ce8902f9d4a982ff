//! In-memory index client backed by a [`MemoryContentStore`].
//!
//! A naive token matcher standing in for an external full-text index in
//! tests, benches, and the CLI. Matching rewards exact phrase over fuzzy
//! over partial matches, mirroring what a production index would report.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::content::{ContentItem, ContentType};
use crate::error::Result;
use crate::search::index::{IndexHit, IndexKind, MatchQuality, SearchIndexClient, StructuredQuery};
use crate::store::MemoryContentStore;
use crate::util::within_edit_distance;

/// In-memory search index over a content store.
pub struct MemoryIndexClient {
    kind: IndexKind,
    store: Arc<MemoryContentStore>,
}

impl MemoryIndexClient {
    /// Create a client for one index kind.
    pub fn new(kind: IndexKind, store: Arc<MemoryContentStore>) -> Self {
        Self { kind, store }
    }

    /// Clients for all five index kinds over the same store.
    pub fn all(store: Arc<MemoryContentStore>) -> Vec<Arc<dyn SearchIndexClient>> {
        IndexKind::all()
            .into_iter()
            .map(|kind| {
                Arc::new(MemoryIndexClient::new(kind, Arc::clone(&store)))
                    as Arc<dyn SearchIndexClient>
            })
            .collect()
    }

    fn in_scope(&self, item: &ContentItem) -> bool {
        match self.kind {
            IndexKind::Content => matches!(
                item.content_type,
                ContentType::Event | ContentType::Fundraiser
            ),
            IndexKind::Tags => !item.tags.is_empty(),
            IndexKind::Organizations => item.content_type == ContentType::Organization,
            IndexKind::Locations => item.content_type == ContentType::Location,
            IndexKind::People => item.content_type == ContentType::Person,
        }
    }

    fn haystack(&self, item: &ContentItem) -> String {
        match self.kind {
            IndexKind::Tags => item
                .tags
                .iter()
                .map(|t| t.name.to_lowercase())
                .collect::<Vec<_>>()
                .join(" "),
            _ => {
                let mut text = item.title.to_lowercase();
                if let Some(description) = &item.description {
                    text.push(' ');
                    text.push_str(&description.to_lowercase());
                }
                for tag in &item.tags {
                    text.push(' ');
                    text.push_str(&tag.name.to_lowercase());
                }
                text
            }
        }
    }

    fn match_item(&self, query: &StructuredQuery, item: &ContentItem) -> Option<IndexHit> {
        let haystack = self.haystack(item);
        let hay_tokens: Vec<&str> = haystack.split_whitespace().collect();
        let tokens = query.tokens();

        let snippet = item
            .description
            .as_ref()
            .map(|d| d.chars().take(80).collect::<String>());

        // Exact phrase match.
        if !query.text.is_empty() && haystack.contains(&query.text) {
            return Some(IndexHit {
                content_id: item.id.clone(),
                score: 1.0,
                quality: MatchQuality::Exact,
                snippet,
            });
        }

        if !tokens.is_empty() {
            let matched = tokens
                .iter()
                .filter(|t| hay_tokens.contains(*t))
                .count();

            // Every term within the fuzziness tolerance.
            let fuzzy_matched = tokens.iter().all(|t| {
                hay_tokens
                    .iter()
                    .any(|h| within_edit_distance(t, h, query.fuzziness as usize))
            });
            if fuzzy_matched && matched < tokens.len() {
                return Some(IndexHit {
                    content_id: item.id.clone(),
                    score: 0.7,
                    quality: MatchQuality::Fuzzy,
                    snippet,
                });
            }

            if matched > 0 {
                let fraction = matched as f32 / tokens.len() as f32;
                return Some(IndexHit {
                    content_id: item.id.clone(),
                    score: 0.2 + 0.6 * fraction,
                    quality: MatchQuality::Partial,
                    snippet,
                });
            }
        }

        // Expansion terms broaden the match set at a low score.
        let expansion_hit = query.expansions.iter().any(|term| haystack.contains(term));
        if expansion_hit {
            return Some(IndexHit {
                content_id: item.id.clone(),
                score: 0.25,
                quality: MatchQuality::Partial,
                snippet,
            });
        }

        None
    }
}

impl SearchIndexClient for MemoryIndexClient {
    fn kind(&self) -> IndexKind {
        self.kind
    }

    fn search<'a>(&'a self, query: &'a StructuredQuery) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
        async move {
            let mut hits: Vec<IndexHit> = self
                .store
                .snapshot()
                .iter()
                .filter(|item| self.in_scope(item))
                .filter_map(|item| self.match_item(query, item))
                .collect();

            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.content_id.cmp(&b.content_id))
            });
            hits.truncate(query.limit);
            Ok(hits)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    use crate::content::Tag;

    fn item(id: &str, title: &str, tag: &str, content_type: ContentType) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type,
            title: title.to_string(),
            description: Some("a community project".to_string()),
            tags: vec![Tag::new(tag, "cause")],
            location: None,
            created_at: Utc::now(),
            starts_at: None,
            organization_id: None,
            verified_owner: true,
            moderation: Default::default(),
            age_restricted: false,
            jurisdictions: Vec::new(),
            funding_disclosure: None,
        }
    }

    fn query(text: &str) -> StructuredQuery {
        StructuredQuery {
            text: text.to_string(),
            expansions: Vec::new(),
            field_weights: HashMap::new(),
            fuzziness: 1,
            limit: 10,
        }
    }

    #[tokio::test]
    async fn test_exact_beats_partial() {
        let store = Arc::new(MemoryContentStore::with_items(vec![
            item("exact", "clean energy drive", "environment", ContentType::Fundraiser),
            item("partial", "energy policy forum", "education", ContentType::Fundraiser),
        ]));
        let client = MemoryIndexClient::new(IndexKind::Content, store);

        let hits = client.search(&query("clean energy")).await.unwrap();
        assert_eq!(hits[0].content_id, "exact");
        assert_eq!(hits[0].quality, MatchQuality::Exact);
        assert_eq!(hits[1].quality, MatchQuality::Partial);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_fuzzy_match() {
        let store = Arc::new(MemoryContentStore::with_items(vec![item(
            "a",
            "votr registration",
            "voting",
            ContentType::Event,
        )]));
        let client = MemoryIndexClient::new(IndexKind::Content, store);

        let hits = client.search(&query("voter")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].quality, MatchQuality::Fuzzy);
    }

    #[tokio::test]
    async fn test_scope_filtering() {
        let store = Arc::new(MemoryContentStore::with_items(vec![
            item("org", "energy coalition", "energy", ContentType::Organization),
            item("fund", "energy fund", "energy", ContentType::Fundraiser),
        ]));
        let client = MemoryIndexClient::new(IndexKind::Organizations, store);

        let hits = client.search(&query("energy")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content_id, "org");
    }

    #[tokio::test]
    async fn test_expansion_broadens() {
        let store = Arc::new(MemoryContentStore::with_items(vec![item(
            "a",
            "environment summit",
            "parks",
            ContentType::Event,
        )]));
        let client = MemoryIndexClient::new(IndexKind::Content, store);

        let mut q = query("zzz-no-direct-match");
        q.expansions = vec!["environment".to_string()];
        let hits = client.search(&q).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].quality, MatchQuality::Partial);
    }
}
