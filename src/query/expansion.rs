//! Disjunctive query expansion.
//!
//! Expansion only ever broadens matches: the expanded form is the union of
//! the raw terms, political-domain synonyms, location-qualified variants,
//! and election/campaign temporal terms. Downstream indices treat expansion
//! terms as optional disjuncts, never as required terms.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::query::intent::QueryIntent;
use crate::query::processor::QueryContext;

lazy_static! {
    /// Political-domain synonym table.
    static ref SYNONYMS: HashMap<&'static str, &'static [&'static str]> = {
        let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        map.insert("donate", &["contribute", "give", "support"]);
        map.insert("donation", &["contribution", "gift"]);
        map.insert("fundraiser", &["fundraising", "drive"]);
        map.insert("election", &["ballot", "vote", "voting"]);
        map.insert("candidate", &["nominee", "contender"]);
        map.insert("climate", &["environment", "clean energy"]);
        map.insert("healthcare", &["health care", "medical care"]);
        map.insert("education", &["schools", "students"]);
        map.insert("volunteer", &["canvass", "phone bank"]);
        map.insert("campaign", &["race", "candidacy"]);
        map
    };

    /// Temporal terms relevant to elections and campaign cycles.
    static ref TEMPORAL_TERMS: Vec<&'static str> =
        vec!["upcoming", "this week", "election day", "early voting"];
}

/// Expand a sanitized query. Returns the expanded disjunctive text together
/// with the synonym set that was applied.
pub fn expand_query(
    cleaned: &str,
    intent: QueryIntent,
    context: &QueryContext,
) -> (String, Vec<String>) {
    let mut terms: Vec<String> = Vec::new();
    let mut synonyms: Vec<String> = Vec::new();

    if !cleaned.is_empty() {
        terms.push(cleaned.to_string());
    }

    // Synonym union over individual terms.
    for token in cleaned.split_whitespace() {
        if let Some(alternatives) = SYNONYMS.get(token) {
            for alt in *alternatives {
                if !synonyms.iter().any(|s| s == alt) {
                    synonyms.push((*alt).to_string());
                }
            }
        }
    }
    terms.extend(synonyms.iter().cloned());

    // Location-qualified variants when the caller supplied a region label.
    if let Some(region) = &context.region {
        let region = region.to_lowercase();
        if !cleaned.is_empty() {
            terms.push(format!("{cleaned} {region}"));
        }
        terms.push(region);
    }

    // Temporal terms for election/campaign cycles.
    match intent {
        QueryIntent::Donate | QueryIntent::Event | QueryIntent::Candidate => {
            terms.extend(TEMPORAL_TERMS.iter().map(|t| (*t).to_string()));
        }
        _ => {}
    }

    terms.dedup();
    (terms.join(" OR "), synonyms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> QueryContext {
        QueryContext::default()
    }

    #[test]
    fn test_expansion_contains_raw_query() {
        let (expanded, _) = expand_query("donate healthcare", QueryIntent::Donate, &context());
        assert!(expanded.starts_with("donate healthcare"));
    }

    #[test]
    fn test_synonym_union() {
        let (expanded, synonyms) =
            expand_query("donate healthcare", QueryIntent::Donate, &context());
        assert!(synonyms.contains(&"contribute".to_string()));
        assert!(synonyms.contains(&"health care".to_string()));
        assert!(expanded.contains("contribute"));
    }

    #[test]
    fn test_region_qualified_terms() {
        let ctx = QueryContext {
            region: Some("Ohio".to_string()),
            ..QueryContext::default()
        };
        let (expanded, _) = expand_query("town hall", QueryIntent::Event, &ctx);
        assert!(expanded.contains("town hall ohio"));
    }

    #[test]
    fn test_temporal_terms_only_for_campaign_intents() {
        let (with_temporal, _) = expand_query("rally", QueryIntent::Event, &context());
        assert!(with_temporal.contains("election day"));

        let (without, _) = expand_query("rally", QueryIntent::General, &context());
        assert!(!without.contains("election day"));
    }

    #[test]
    fn test_deterministic_expansion() {
        let a = expand_query("donate", QueryIntent::Donate, &context());
        let b = expand_query("donate", QueryIntent::Donate, &context());
        assert_eq!(a, b);
    }
}
