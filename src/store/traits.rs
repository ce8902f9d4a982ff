//! Collaborator store traits.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, GeoPoint, Tag, UserProfile};

/// Read access to the platform's content records.
pub trait ContentStore: Send + Sync {
    /// Fetch a single item by identifier.
    fn get(&self, id: &str) -> Option<ContentItem>;

    /// Fetch many items; missing identifiers are silently skipped.
    fn get_many(&self, ids: &[String]) -> Vec<ContentItem>;

    /// Items carrying the given tag name, most recent first.
    fn by_tag(&self, tag: &str, limit: usize) -> Vec<ContentItem>;

    /// Items created at or after `since`, most recent first.
    fn created_since(&self, since: DateTime<Utc>, limit: usize) -> Vec<ContentItem>;

    /// Items within `radius_km` of `center`, nearest first.
    fn near(&self, center: &GeoPoint, radius_km: f64, limit: usize) -> Vec<ContentItem>;

    /// Events starting between `now` and `now + horizon`, soonest first.
    fn upcoming_events(&self, now: DateTime<Utc>, horizon: Duration, limit: usize)
    -> Vec<ContentItem>;

    /// Most frequently used tags across the catalog, descending.
    fn popular_tags(&self, limit: usize) -> Vec<Tag>;
}

/// A single user interaction with a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Content acted on.
    pub content_id: String,
    /// Acting user, if authenticated.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Kind of interaction.
    pub kind: InteractionKind,
    /// Tag names of the content at interaction time.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the interaction happened.
    pub at: DateTime<Utc>,
}

/// Kinds of interaction events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Item was viewed.
    View,
    /// Item was clicked through.
    Click,
    /// Item was shared.
    Share,
    /// Item was mentioned elsewhere on the platform.
    Mention,
    /// Item surfaced activity on another surface (feed, notification).
    CrossSurface,
    /// A donation was made through the item.
    Donation,
}

impl InteractionKind {
    /// Relative strength of this interaction as a preference signal, in
    /// [0, 1].
    pub fn signal_strength(&self) -> f64 {
        match self {
            InteractionKind::View => 0.2,
            InteractionKind::CrossSurface => 0.4,
            InteractionKind::Click => 0.5,
            InteractionKind::Mention => 0.6,
            InteractionKind::Donation => 0.9,
            InteractionKind::Share => 1.0,
        }
    }
}

/// Windowed interaction statistics for one content item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionStats {
    /// Interactions in the current window.
    pub window_count: u64,
    /// Average interactions over equal-length preceding windows.
    pub baseline_count: f64,
    /// Shares in the current window.
    pub shares: u64,
    /// Mentions in the current window.
    pub mentions: u64,
    /// Cross-surface activity in the current window.
    pub cross_surface: u64,
}

/// Read/append access to the platform's interaction log.
pub trait InteractionStore: Send + Sync {
    /// Record one interaction event. At-least-once semantics.
    fn record(&self, event: InteractionEvent);

    /// Windowed statistics for one item at `now`.
    fn stats(&self, content_id: &str, window: Duration, now: DateTime<Utc>) -> InteractionStats;

    /// All-time engagement count for one item.
    fn total_engagement(&self, content_id: &str) -> u64;

    /// Identifiers of items with any interaction inside the window.
    fn active_ids(&self, window: Duration, now: DateTime<Utc>) -> Vec<String>;

    /// Ratio of current-window interaction count to baseline for a tag.
    /// Returns the raw current count when no baseline exists.
    fn tag_growth(&self, tag: &str, window: Duration, now: DateTime<Utc>) -> f64;

    /// All user identifiers present in the log.
    fn users(&self) -> Vec<String>;

    /// Per-item preference scores for one user, each in [0, 1].
    fn user_item_scores(&self, user_id: &str) -> HashMap<String, f64>;
}

/// Read access to user profiles. The engine never writes back.
pub trait ProfileProvider: Send + Sync {
    /// Snapshot of a user's profile.
    fn profile(&self, user_id: &str) -> Option<UserProfile>;
}
