//! Candidate merging across index hit sets.

use std::collections::HashMap;

use crate::search::index::{IndexHit, IndexKind, MatchQuality};

/// A content item that matched at least one retrieval branch but has not
/// been scored or filtered yet.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Content identifier.
    pub content_id: String,
    /// Highest match score across contributing indices.
    pub score: f32,
    /// Strongest match quality across contributing indices.
    pub quality: MatchQuality,
    /// Indices that returned this candidate.
    pub matched_indices: Vec<IndexKind>,
    /// Best available snippet.
    pub snippet: Option<String>,
}

impl Candidate {
    /// Whether more than one index returned this candidate.
    pub fn is_multi_index(&self) -> bool {
        self.matched_indices.len() > 1
    }
}

/// Union hit sets by content identifier, keeping the highest per-field match
/// metadata. Output is ordered by identifier; ranking imposes the final
/// order.
pub fn merge_hits(per_index: Vec<(IndexKind, Vec<IndexHit>)>) -> Vec<Candidate> {
    let mut merged: HashMap<String, Candidate> = HashMap::new();

    for (kind, hits) in per_index {
        for hit in hits {
            match merged.get_mut(&hit.content_id) {
                Some(existing) => {
                    if hit.score > existing.score {
                        existing.score = hit.score;
                    }
                    if hit.quality.rank() > existing.quality.rank() {
                        existing.quality = hit.quality;
                    }
                    if existing.snippet.is_none() {
                        existing.snippet = hit.snippet;
                    }
                    if !existing.matched_indices.contains(&kind) {
                        existing.matched_indices.push(kind);
                    }
                }
                None => {
                    merged.insert(
                        hit.content_id.clone(),
                        Candidate {
                            content_id: hit.content_id,
                            score: hit.score,
                            quality: hit.quality,
                            matched_indices: vec![kind],
                            snippet: hit.snippet,
                        },
                    );
                }
            }
        }
    }

    let mut candidates: Vec<Candidate> = merged.into_values().collect();
    candidates.sort_by(|a, b| a.content_id.cmp(&b.content_id));
    candidates
}
