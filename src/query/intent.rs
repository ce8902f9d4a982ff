//! Keyword-based query intent classification.
//!
//! Intents are decided by an ordered rule list: the first rule with a
//! matching keyword wins, and a query matching no rule is GENERAL. Rules are
//! matched against the sanitized lowercase query.

use serde::{Deserialize, Serialize};

/// Coarse classification of query purpose, used to bias downstream
/// expansion and ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Looking to contribute money.
    Donate,
    /// Looking for an event to attend.
    Event,
    /// Looking for a candidate or office-holder.
    Candidate,
    /// Looking for a cause or issue.
    Cause,
    /// Looking for an organization.
    Organization,
    /// Looking for something nearby.
    Local,
    /// No recognizable intent.
    General,
}

impl QueryIntent {
    /// Stable lowercase name, used in cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Donate => "donate",
            QueryIntent::Event => "event",
            QueryIntent::Candidate => "candidate",
            QueryIntent::Cause => "cause",
            QueryIntent::Organization => "organization",
            QueryIntent::Local => "local",
            QueryIntent::General => "general",
        }
    }
}

/// Ordered intent rules; first match wins.
const INTENT_RULES: &[(QueryIntent, &[&str])] = &[
    (
        QueryIntent::Donate,
        &["donate", "donation", "contribute", "give to", "fundraise", "chip in"],
    ),
    (
        QueryIntent::Event,
        &["event", "rally", "town hall", "canvass", "phone bank", "volunteer"],
    ),
    (
        QueryIntent::Candidate,
        &[
            "candidate",
            "senator",
            "representative",
            "governor",
            "mayor",
            "running for",
        ],
    ),
    (
        QueryIntent::Organization,
        &["organization", "nonprofit", "committee", "pac", "coalition"],
    ),
    (
        QueryIntent::Local,
        &["near me", "nearby", "local", "in my area"],
    ),
    (
        QueryIntent::Cause,
        &["cause", "issue", "policy", "reform", "rights", "justice"],
    ),
];

/// Classify a sanitized query by the first matching keyword rule.
pub fn classify_intent(cleaned: &str) -> QueryIntent {
    for (intent, keywords) in INTENT_RULES {
        for keyword in *keywords {
            if contains_term(cleaned, keyword) {
                return *intent;
            }
        }
    }
    QueryIntent::General
}

/// Whole-word containment check; multi-word keywords match as phrases.
fn contains_term(haystack: &str, term: &str) -> bool {
    if term.contains(' ') {
        return haystack.contains(term);
    }
    haystack.split_whitespace().any(|word| word == term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        // "donate" and "event" both appear; DONATE is the earlier rule.
        assert_eq!(
            classify_intent("donate at the event tonight"),
            QueryIntent::Donate
        );
    }

    #[test]
    fn test_phrase_keywords() {
        assert_eq!(classify_intent("town hall this week"), QueryIntent::Event);
        assert_eq!(classify_intent("fundraisers near me"), QueryIntent::Local);
    }

    #[test]
    fn test_no_match_is_general() {
        assert_eq!(classify_intent("clean energy"), QueryIntent::General);
        assert_eq!(classify_intent(""), QueryIntent::General);
    }

    #[test]
    fn test_whole_word_matching() {
        // "giveaway" must not match the "give to" phrase or a "give" keyword.
        assert_eq!(classify_intent("giveaway raffle"), QueryIntent::General);
    }

    #[test]
    fn test_donate_scenario() {
        assert_eq!(
            classify_intent("donate to clean energy campaign"),
            QueryIntent::Donate
        );
    }
}
