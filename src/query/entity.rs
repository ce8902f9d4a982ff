//! Pluggable entity extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Extract named entities from query text.
///
/// Implementations must return entities in first-occurrence order and be
/// deterministic for identical input.
pub trait EntityExtractor: Send + Sync {
    /// Extract an ordered sequence of entity strings from `text`.
    fn extract(&self, text: &str) -> Vec<String>;

    /// Extractor name, for logging.
    fn name(&self) -> &str;
}

lazy_static! {
    /// Curated multi-word political topics recognized as entities.
    static ref ENTITY_PHRASES: Vec<&'static str> = vec![
        "clean energy",
        "climate change",
        "health care",
        "gun control",
        "minimum wage",
        "school board",
        "city council",
        "voting rights",
        "campaign finance",
        "public transit",
    ];

    /// Runs of capitalized words ("Jane Doe", "Springfield City Council").
    static ref CAPITALIZED_RUN: Regex =
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("valid regex");
}

/// Default extractor: curated phrase table plus capitalized-run detection.
#[derive(Debug, Default)]
pub struct KeywordEntityExtractor;

impl KeywordEntityExtractor {
    /// Create the default extractor.
    pub fn new() -> Self {
        KeywordEntityExtractor
    }
}

impl EntityExtractor for KeywordEntityExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut entities: Vec<(usize, String)> = Vec::new();

        for phrase in ENTITY_PHRASES.iter() {
            if let Some(pos) = lowered.find(phrase) {
                entities.push((pos, (*phrase).to_string()));
            }
            // Also match the single-token spelling ("healthcare").
            let collapsed = phrase.replace(' ', "");
            if collapsed != *phrase {
                if let Some(pos) = lowered.find(&collapsed) {
                    entities.push((pos, (*phrase).to_string()));
                }
            }
        }

        for cap in CAPITALIZED_RUN.find_iter(text) {
            // Single capitalized words at the start of the query are usually
            // just sentence casing, not names.
            if cap.start() == 0 && !cap.as_str().contains(' ') {
                continue;
            }
            entities.push((cap.start(), cap.as_str().to_lowercase()));
        }

        entities.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut ordered = Vec::new();
        for (_, entity) in entities {
            if !ordered.contains(&entity) {
                ordered.push(entity);
            }
        }
        ordered
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_entities() {
        let extractor = KeywordEntityExtractor::new();
        let entities = extractor.extract("donate to clean energy campaign");
        assert!(entities.contains(&"clean energy".to_string()));
    }

    #[test]
    fn test_collapsed_spelling() {
        let extractor = KeywordEntityExtractor::new();
        let entities = extractor.extract("healthcare for all");
        assert!(entities.contains(&"health care".to_string()));
    }

    #[test]
    fn test_capitalized_runs() {
        let extractor = KeywordEntityExtractor::new();
        let entities = extractor.extract("events with Jane Doe in Springfield");
        assert!(entities.contains(&"jane doe".to_string()));
        assert!(entities.contains(&"springfield".to_string()));
    }

    #[test]
    fn test_first_occurrence_order() {
        let extractor = KeywordEntityExtractor::new();
        let entities = extractor.extract("gun control and clean energy");
        let gun = entities.iter().position(|e| e == "gun control").unwrap();
        let energy = entities.iter().position(|e| e == "clean energy").unwrap();
        assert!(gun < energy);
    }

    #[test]
    fn test_deterministic() {
        let extractor = KeywordEntityExtractor::new();
        let a = extractor.extract("Clean Energy rally with Jane Doe");
        let b = extractor.extract("Clean Energy rally with Jane Doe");
        assert_eq!(a, b);
    }
}
