//! Stateless per-(item, viewer) compliance checks.
//!
//! Each rule is an independent named predicate; the filter combines them
//! with AND semantics while collecting every warning, so borderline passing
//! items still carry their soft warnings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, ContentType, ModerationStatus};

/// The requesting user's compliance-relevant context.
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    /// Requesting user, if authenticated.
    pub user_id: Option<String>,
    /// Verified age, if known.
    pub age: Option<u8>,
    /// Jurisdiction code ("US-OH"), if known.
    pub jurisdiction: Option<String>,
}

impl ViewerContext {
    /// Context of an unauthenticated viewer.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// An election-law blackout window during which donation surfaces must not
/// show fundraising content for the affected jurisdiction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackoutWindow {
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end.
    pub end: DateTime<Utc>,
    /// Affected jurisdiction; `None` applies everywhere.
    pub jurisdiction: Option<String>,
}

/// Rule data supplied by the compliance collaborator. The legal substance
/// behind these values is out of scope; only the evaluation contract
/// matters here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRules {
    /// Minimum verified age for age-restricted items.
    pub min_age_for_restricted: u8,
    /// Jurisdictions content is never served to.
    pub blocked_jurisdictions: Vec<String>,
    /// Whether fundraisers must carry a funding disclosure.
    pub require_funding_disclosure: bool,
    /// Active and upcoming blackout windows.
    pub blackout_windows: Vec<BlackoutWindow>,
    /// Lead time before a blackout in which items are annotated but still
    /// served.
    pub blackout_warning_hours: i64,
}

impl Default for ComplianceRules {
    fn default() -> Self {
        Self {
            min_age_for_restricted: 18,
            blocked_jurisdictions: Vec::new(),
            require_funding_disclosure: true,
            blackout_windows: Vec::new(),
            blackout_warning_hours: 72,
        }
    }
}

/// Supplies rule data to the filter.
pub trait ComplianceRuleProvider: Send + Sync {
    /// Current rule set.
    fn rules(&self) -> ComplianceRules;
}

/// Rule provider serving a fixed rule set.
#[derive(Debug, Default)]
pub struct StaticRuleProvider {
    rules: ComplianceRules,
}

impl StaticRuleProvider {
    /// Create a provider over a fixed rule set.
    pub fn new(rules: ComplianceRules) -> Self {
        Self { rules }
    }
}

impl ComplianceRuleProvider for StaticRuleProvider {
    fn rules(&self) -> ComplianceRules {
        self.rules.clone()
    }
}

/// Pass/fail result of evaluating one item for one viewer, with the ordered
/// warnings collected from every check. Attached to a result, never stored
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    /// Whether every check passed.
    pub passed: bool,
    /// Warnings from failing and borderline checks, in check order.
    pub warnings: Vec<String>,
}

enum CheckOutcome {
    Pass,
    /// Compliant, but worth annotating.
    Warn(String),
    /// Non-compliant; the warning explains why.
    Fail(String),
}

/// Age restriction: restricted items require a verified adult viewer.
fn check_age_restriction(
    item: &ContentItem,
    viewer: &ViewerContext,
    rules: &ComplianceRules,
) -> CheckOutcome {
    if !item.age_restricted {
        return CheckOutcome::Pass;
    }
    match viewer.age {
        Some(age) if age >= rules.min_age_for_restricted => CheckOutcome::Pass,
        Some(_) => CheckOutcome::Fail("viewer below minimum age for restricted content".into()),
        None => CheckOutcome::Fail("age-restricted content requires a verified age".into()),
    }
}

/// Geographic eligibility: the item must be eligible in the viewer's
/// jurisdiction, and the jurisdiction must not be globally blocked.
fn check_geographic_eligibility(
    item: &ContentItem,
    viewer: &ViewerContext,
    rules: &ComplianceRules,
) -> CheckOutcome {
    match &viewer.jurisdiction {
        Some(jurisdiction) => {
            if rules.blocked_jurisdictions.contains(jurisdiction) {
                return CheckOutcome::Fail(format!(
                    "content unavailable in jurisdiction {jurisdiction}"
                ));
            }
            if !item.jurisdictions.is_empty() && !item.jurisdictions.contains(jurisdiction) {
                return CheckOutcome::Fail(format!(
                    "item not eligible in jurisdiction {jurisdiction}"
                ));
            }
            CheckOutcome::Pass
        }
        None if !item.jurisdictions.is_empty() => {
            CheckOutcome::Warn("jurisdiction-limited item served to unverified location".into())
        }
        None => CheckOutcome::Pass,
    }
}

/// Funding disclosure: fundraisers must disclose their funding; disclosures
/// from unverified owners are annotated.
fn check_funding_disclosure(item: &ContentItem, rules: &ComplianceRules) -> CheckOutcome {
    if item.content_type != ContentType::Fundraiser || !rules.require_funding_disclosure {
        return CheckOutcome::Pass;
    }
    match &item.funding_disclosure {
        None => CheckOutcome::Fail("fundraiser is missing its funding disclosure".into()),
        Some(text) if text.trim().is_empty() => {
            CheckOutcome::Fail("fundraiser is missing its funding disclosure".into())
        }
        Some(_) if !item.verified_owner => {
            CheckOutcome::Warn("funding disclosure from an unverified organization".into())
        }
        Some(_) => CheckOutcome::Pass,
    }
}

/// Moderation status: only approved items are served.
fn check_moderation_status(item: &ContentItem) -> CheckOutcome {
    match item.moderation {
        ModerationStatus::Approved => CheckOutcome::Pass,
        ModerationStatus::Pending => CheckOutcome::Fail("item is pending moderation review".into()),
        ModerationStatus::Removed => CheckOutcome::Fail("item was removed by moderation".into()),
    }
}

/// Election blackout: fundraising content inside an applicable blackout
/// window is dropped; an approaching window is annotated.
fn check_election_blackout(
    item: &ContentItem,
    viewer: &ViewerContext,
    rules: &ComplianceRules,
    now: DateTime<Utc>,
) -> CheckOutcome {
    if item.content_type != ContentType::Fundraiser {
        return CheckOutcome::Pass;
    }

    for window in &rules.blackout_windows {
        let applies = match &window.jurisdiction {
            Some(jurisdiction) => {
                viewer.jurisdiction.as_deref() == Some(jurisdiction.as_str())
                    || item.jurisdictions.contains(jurisdiction)
            }
            None => true,
        };
        if !applies {
            continue;
        }

        if now >= window.start && now < window.end {
            return CheckOutcome::Fail("fundraising is in an election-law blackout window".into());
        }
        let lead = chrono::Duration::hours(rules.blackout_warning_hours);
        if now < window.start && window.start - now <= lead {
            return CheckOutcome::Warn("election-law blackout window approaching".into());
        }
    }

    CheckOutcome::Pass
}

/// The terminal compliance gate.
pub struct ComplianceFilter {
    provider: Arc<dyn ComplianceRuleProvider>,
}

impl ComplianceFilter {
    /// Create a filter over a rule provider.
    pub fn new(provider: Arc<dyn ComplianceRuleProvider>) -> Self {
        Self { provider }
    }

    /// Evaluate one item for one viewer.
    pub fn evaluate(
        &self,
        item: &ContentItem,
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> ComplianceVerdict {
        let rules = self.provider.rules();

        let outcomes = [
            check_age_restriction(item, viewer, &rules),
            check_geographic_eligibility(item, viewer, &rules),
            check_funding_disclosure(item, &rules),
            check_moderation_status(item),
            check_election_blackout(item, viewer, &rules, now),
        ];

        let mut passed = true;
        let mut warnings = Vec::new();
        for outcome in outcomes {
            match outcome {
                CheckOutcome::Pass => {}
                CheckOutcome::Warn(warning) => warnings.push(warning),
                CheckOutcome::Fail(warning) => {
                    passed = false;
                    warnings.push(warning);
                }
            }
        }

        ComplianceVerdict { passed, warnings }
    }

    /// Drop non-compliant items, keeping each survivor's warnings.
    pub fn filter(
        &self,
        items: Vec<ContentItem>,
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> Vec<(ContentItem, Vec<String>)> {
        items
            .into_iter()
            .filter_map(|item| {
                let verdict = self.evaluate(&item, viewer, now);
                verdict.passed.then(|| (item, verdict.warnings))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Tag;

    fn filter() -> ComplianceFilter {
        ComplianceFilter::new(Arc::new(StaticRuleProvider::default()))
    }

    fn filter_with(rules: ComplianceRules) -> ComplianceFilter {
        ComplianceFilter::new(Arc::new(StaticRuleProvider::new(rules)))
    }

    fn fundraiser(id: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type: ContentType::Fundraiser,
            title: "fundraiser".to_string(),
            description: None,
            tags: vec![Tag::new("healthcare", "health")],
            location: None,
            created_at: Utc::now(),
            starts_at: None,
            organization_id: Some("org".to_string()),
            verified_owner: true,
            moderation: ModerationStatus::Approved,
            age_restricted: false,
            jurisdictions: Vec::new(),
            funding_disclosure: Some("funded by org pac".to_string()),
        }
    }

    #[test]
    fn test_compliant_item_passes_clean() {
        let verdict = filter().evaluate(&fundraiser("a"), &ViewerContext::anonymous(), Utc::now());
        assert!(verdict.passed);
        assert!(verdict.warnings.is_empty());
    }

    #[test]
    fn test_missing_disclosure_fails() {
        let mut item = fundraiser("a");
        item.funding_disclosure = None;
        let verdict = filter().evaluate(&item, &ViewerContext::anonymous(), Utc::now());
        assert!(!verdict.passed);
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_unverified_disclosure_warns_but_passes() {
        let mut item = fundraiser("a");
        item.verified_owner = false;
        let verdict = filter().evaluate(&item, &ViewerContext::anonymous(), Utc::now());
        assert!(verdict.passed);
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_age_restriction() {
        let mut item = fundraiser("a");
        item.age_restricted = true;

        let anonymous = filter().evaluate(&item, &ViewerContext::anonymous(), Utc::now());
        assert!(!anonymous.passed);

        let minor = ViewerContext {
            age: Some(16),
            ..ViewerContext::default()
        };
        assert!(!filter().evaluate(&item, &minor, Utc::now()).passed);

        let adult = ViewerContext {
            age: Some(30),
            ..ViewerContext::default()
        };
        assert!(filter().evaluate(&item, &adult, Utc::now()).passed);
    }

    #[test]
    fn test_geographic_eligibility() {
        let mut item = fundraiser("a");
        item.jurisdictions = vec!["US-OH".to_string()];

        let ohio = ViewerContext {
            jurisdiction: Some("US-OH".to_string()),
            ..ViewerContext::default()
        };
        assert!(filter().evaluate(&item, &ohio, Utc::now()).passed);

        let texas = ViewerContext {
            jurisdiction: Some("US-TX".to_string()),
            ..ViewerContext::default()
        };
        assert!(!filter().evaluate(&item, &texas, Utc::now()).passed);

        // Unknown jurisdiction: served, but annotated.
        let verdict = filter().evaluate(&item, &ViewerContext::anonymous(), Utc::now());
        assert!(verdict.passed);
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_moderation_gate() {
        let mut item = fundraiser("a");
        item.moderation = ModerationStatus::Pending;
        assert!(!filter().evaluate(&item, &ViewerContext::anonymous(), Utc::now()).passed);

        item.moderation = ModerationStatus::Removed;
        assert!(!filter().evaluate(&item, &ViewerContext::anonymous(), Utc::now()).passed);
    }

    #[test]
    fn test_blackout_window() {
        let now = Utc::now();
        let rules = ComplianceRules {
            blackout_windows: vec![BlackoutWindow {
                start: now - chrono::Duration::hours(1),
                end: now + chrono::Duration::hours(24),
                jurisdiction: None,
            }],
            ..ComplianceRules::default()
        };
        let verdict = filter_with(rules).evaluate(
            &fundraiser("a"),
            &ViewerContext::anonymous(),
            now,
        );
        assert!(!verdict.passed);
    }

    #[test]
    fn test_approaching_blackout_warns() {
        let now = Utc::now();
        let rules = ComplianceRules {
            blackout_windows: vec![BlackoutWindow {
                start: now + chrono::Duration::hours(24),
                end: now + chrono::Duration::hours(48),
                jurisdiction: None,
            }],
            ..ComplianceRules::default()
        };
        let verdict = filter_with(rules).evaluate(
            &fundraiser("a"),
            &ViewerContext::anonymous(),
            now,
        );
        assert!(verdict.passed);
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_failing_checks_all_contribute_warnings() {
        let mut item = fundraiser("a");
        item.funding_disclosure = None;
        item.moderation = ModerationStatus::Pending;

        let verdict = filter().evaluate(&item, &ViewerContext::anonymous(), Utc::now());
        assert!(!verdict.passed);
        assert_eq!(verdict.warnings.len(), 2);
    }

    #[test]
    fn test_filter_drops_non_compliant() {
        let mut bad = fundraiser("bad");
        bad.funding_disclosure = None;
        let good = fundraiser("good");

        let kept = filter().filter(vec![bad, good], &ViewerContext::anonymous(), Utc::now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0.id, "good");
    }
}
