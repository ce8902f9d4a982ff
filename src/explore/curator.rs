//! Explore surface: a fixed ordered set of independently computed sections.
//!
//! Every section is independently empty-able; a section with no qualifying
//! items is omitted from the response entirely, never returned as an empty
//! placeholder. All section content passes the compliance gate here, before
//! it ever reaches a caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::compliance::{ComplianceFilter, ViewerContext};
use crate::content::{ContentItem, ContentType, UserProfile};
use crate::response::ContentSummary;
use crate::store::ContentStore;
use crate::trending::TrendingStore;

/// The fixed section order of the explore surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Trending,
    Local,
    CauseBased,
    Upcoming,
    NewOrganizations,
    Seasonal,
}

impl SectionKind {
    /// Display title for the section.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Trending => "Trending now",
            SectionKind::Local => "Near you",
            SectionKind::CauseBased => "For your causes",
            SectionKind::Upcoming => "Coming up",
            SectionKind::NewOrganizations => "New organizations",
            SectionKind::Seasonal => "In season",
        }
    }
}

/// One named, independently computed section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreSection {
    /// Section identity.
    pub kind: SectionKind,
    /// Display title.
    pub title: String,
    /// Compliance-filtered items.
    pub items: Vec<ContentSummary>,
}

/// Configuration for explore curation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    /// Items per section.
    pub section_size: usize,
    /// Number of affinity tags backing the cause section.
    pub cause_tag_count: usize,
    /// Items fetched per cause tag.
    pub items_per_cause_tag: usize,
    /// Radius for the local section, in kilometers.
    pub local_radius_km: f64,
    /// Horizon for the upcoming-events section.
    pub upcoming_horizon: Duration,
    /// Age limit for the new-organizations section.
    pub new_org_horizon: Duration,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            section_size: 10,
            cause_tag_count: 3,
            items_per_cause_tag: 5,
            local_radius_km: 50.0,
            upcoming_horizon: Duration::from_secs(14 * 24 * 3600),
            new_org_horizon: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

lazy_static! {
    /// Month number -> seasonal tag names.
    static ref SEASONAL_TAGS: HashMap<u32, Vec<&'static str>> = {
        let mut map = HashMap::new();
        map.insert(1, vec!["legislative session"]);
        map.insert(3, vec!["primary", "early voting"]);
        map.insert(4, vec!["tax policy", "earth day"]);
        map.insert(6, vec!["primary"]);
        map.insert(9, vec!["voter registration"]);
        map.insert(10, vec!["election", "early voting"]);
        map.insert(11, vec!["election", "get out the vote"]);
        map
    };
}

/// Assembles the explore surface.
pub struct ExploreCurator {
    config: ExploreConfig,
    content: Arc<dyn ContentStore>,
    trending: Arc<TrendingStore>,
    compliance: Arc<ComplianceFilter>,
    trending_min_score: f64,
}

impl ExploreCurator {
    /// Create a curator over its collaborators.
    pub fn new(
        config: ExploreConfig,
        content: Arc<dyn ContentStore>,
        trending: Arc<TrendingStore>,
        compliance: Arc<ComplianceFilter>,
        trending_min_score: f64,
    ) -> Self {
        Self {
            config,
            content,
            trending,
            compliance,
            trending_min_score,
        }
    }

    /// Assemble all sections for a viewer. Empty sections are omitted.
    pub fn curate(
        &self,
        profile: Option<&UserProfile>,
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> Vec<ExploreSection> {
        let builders: [(SectionKind, Vec<(ContentItem, f64)>); 6] = [
            (SectionKind::Trending, self.trending_items()),
            (SectionKind::Local, self.local_items(profile)),
            (SectionKind::CauseBased, self.cause_items(profile)),
            (SectionKind::Upcoming, self.upcoming_items(now)),
            (SectionKind::NewOrganizations, self.new_org_items(now)),
            (SectionKind::Seasonal, self.seasonal_items(now)),
        ];

        builders
            .into_iter()
            .filter_map(|(kind, scored_items)| self.build_section(kind, scored_items, viewer, now))
            .collect()
    }

    fn build_section(
        &self,
        kind: SectionKind,
        scored_items: Vec<(ContentItem, f64)>,
        viewer: &ViewerContext,
        now: DateTime<Utc>,
    ) -> Option<ExploreSection> {
        let scores: HashMap<String, f64> = scored_items
            .iter()
            .map(|(item, score)| (item.id.clone(), *score))
            .collect();
        let items: Vec<ContentItem> = scored_items.into_iter().map(|(item, _)| item).collect();

        let mut summaries: Vec<ContentSummary> = self
            .compliance
            .filter(items, viewer, now)
            .into_iter()
            .take(self.config.section_size)
            .map(|(item, warnings)| {
                let score = scores.get(&item.id).copied().unwrap_or(0.0);
                ContentSummary::from_item(&item, score, warnings)
            })
            .collect();

        if summaries.is_empty() {
            return None;
        }
        summaries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });

        Some(ExploreSection {
            kind,
            title: kind.title().to_string(),
            items: summaries,
        })
    }

    fn trending_items(&self) -> Vec<(ContentItem, f64)> {
        let records = self
            .trending
            .top(self.config.section_size * 2, self.trending_min_score);
        records
            .into_iter()
            .filter_map(|record| {
                self.content
                    .get(&record.content_id)
                    .map(|item| (item, record.score))
            })
            .collect()
    }

    /// Local section: requires a user location; omitted without one.
    fn local_items(&self, profile: Option<&UserProfile>) -> Vec<(ContentItem, f64)> {
        let Some(center) = profile.and_then(|p| p.location) else {
            return Vec::new();
        };
        self.content
            .near(&center, self.config.local_radius_km, self.config.section_size * 2)
            .into_iter()
            .map(|item| {
                let score = item
                    .location
                    .map(|loc| 1.0 - center.distance_to(&loc) / self.config.local_radius_km)
                    .unwrap_or(0.0)
                    .clamp(0.0, 1.0);
                (item, score)
            })
            .collect()
    }

    /// Cause section: the user's top affinity tags, or platform-popular
    /// tags without a user.
    fn cause_items(&self, profile: Option<&UserProfile>) -> Vec<(ContentItem, f64)> {
        let tags: Vec<String> = match profile {
            Some(profile) if !profile.tag_affinities.is_empty() => {
                profile.top_tags(self.config.cause_tag_count)
            }
            _ => self
                .content
                .popular_tags(self.config.cause_tag_count)
                .into_iter()
                .map(|tag| tag.name)
                .collect(),
        };

        let mut seen = std::collections::HashSet::new();
        let mut items = Vec::new();
        for tag in tags {
            for item in self.content.by_tag(&tag, self.config.items_per_cause_tag) {
                if seen.insert(item.id.clone()) {
                    items.push((item, 0.0));
                }
            }
        }
        items
    }

    fn upcoming_items(&self, now: DateTime<Utc>) -> Vec<(ContentItem, f64)> {
        self.content
            .upcoming_events(now, self.config.upcoming_horizon, self.config.section_size * 2)
            .into_iter()
            .map(|item| (item, 0.0))
            .collect()
    }

    fn new_org_items(&self, now: DateTime<Utc>) -> Vec<(ContentItem, f64)> {
        let horizon = chrono::Duration::from_std(self.config.new_org_horizon).unwrap_or_default();
        self.content
            .created_since(now - horizon, self.config.section_size * 4)
            .into_iter()
            .filter(|item| item.content_type == ContentType::Organization)
            .map(|item| (item, 0.0))
            .collect()
    }

    fn seasonal_items(&self, now: DateTime<Utc>) -> Vec<(ContentItem, f64)> {
        let Some(tags) = SEASONAL_TAGS.get(&now.month()) else {
            return Vec::new();
        };

        let mut seen = std::collections::HashSet::new();
        let mut items = Vec::new();
        for tag in tags {
            for item in self.content.by_tag(tag, self.config.items_per_cause_tag) {
                if seen.insert(item.id.clone()) {
                    items.push((item, 0.0));
                }
            }
        }
        items
    }
}
