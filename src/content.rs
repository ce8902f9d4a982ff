//! Core content data model shared by every engine component.
//!
//! Content items are owned by their producing surface and are read-only to
//! the discovery engine; the engine only ever emits their identifiers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PharosError, Result};

/// The kind of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// A campaign event (rally, town hall, ...).
    Event,
    /// A fundraiser accepting donations.
    Fundraiser,
    /// A political organization.
    Organization,
    /// A person (candidate, organizer, ...).
    Person,
    /// A geographic location page.
    Location,
}

/// Moderation state of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    /// Approved for display.
    #[default]
    Approved,
    /// Awaiting review.
    Pending,
    /// Removed by moderation.
    Removed,
}

/// A geographical point with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographical point.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PharosError::invalid_input(format!(
                "Invalid latitude: {lat} (must be between -90 and 90)"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(PharosError::invalid_input(format!(
                "Invalid longitude: {lon} (must be between -180 and 180)"
            )));
        }

        Ok(GeoPoint { lat, lon })
    }

    /// Calculate the Haversine distance to another point in kilometers.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// A shared tag. Read-only to the discovery engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag identifier.
    pub id: String,
    /// Display name; also the key used in affinity profiles.
    pub name: String,
    /// Category the tag belongs to (e.g. "environment", "economy").
    pub category: String,
    /// Importance weight, 0-100.
    pub importance: u8,
    /// Depth in the category hierarchy (0 = top level).
    pub depth: u8,
}

impl Tag {
    /// Create a tag with default importance and depth.
    pub fn new<S: Into<String>>(name: S, category: S) -> Self {
        let name = name.into();
        Tag {
            id: name.clone(),
            name,
            category: category.into(),
            importance: 50,
            depth: 0,
        }
    }

    /// Set the importance weight (clamped to 0-100).
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance.min(100);
        self
    }

    /// Set the category depth level.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Effective weight of this tag in similarity computations:
    /// `(importance / 100) * 0.8 ^ depth`.
    pub fn weight(&self) -> f64 {
        (self.importance as f64 / 100.0) * 0.8f64.powi(self.depth as i32)
    }
}

/// A content item as seen by the discovery engine. Immutable once created;
/// updated by its owning surface, never by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Content identifier.
    pub id: String,
    /// Item kind.
    pub content_type: ContentType,
    /// Title.
    pub title: String,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tag set.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Geolocation, if the item is place-bound.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Start time, for events.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Owning organization identifier.
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Whether the owning organization is verified.
    #[serde(default)]
    pub verified_owner: bool,
    /// Moderation state.
    #[serde(default)]
    pub moderation: ModerationStatus,
    /// Whether the item is restricted to adult viewers.
    #[serde(default)]
    pub age_restricted: bool,
    /// Jurisdictions the item is eligible in. Empty = unrestricted.
    #[serde(default)]
    pub jurisdictions: Vec<String>,
    /// Funding disclosure text, required for fundraisers.
    #[serde(default)]
    pub funding_disclosure: Option<String>,
}

impl ContentItem {
    /// Weighted tag vector of this item, keyed by tag name.
    pub fn tag_vector(&self) -> HashMap<String, f64> {
        self.tags
            .iter()
            .map(|tag| (tag.name.clone(), tag.weight()))
            .collect()
    }

    /// Tag names of this item.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|tag| tag.name.as_str()).collect()
    }
}

/// Privacy level of a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    /// Full personalization allowed.
    #[default]
    Public,
    /// Personalization allowed, profile hidden from other features.
    Limited,
    /// No personalization signals may be used.
    Private,
}

/// Snapshot of a user's profile, read once per request from the profile
/// subsystem and never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub user_id: String,
    /// Tag name -> affinity weight. Insertion order is irrelevant.
    #[serde(default)]
    pub tag_affinities: HashMap<String, f64>,
    /// Last known location.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Ordered political-issue priorities.
    #[serde(default)]
    pub issue_priorities: Vec<String>,
    /// Privacy level governing personalization.
    #[serde(default)]
    pub privacy: PrivacyLevel,
}

impl UserProfile {
    /// Create an empty profile for a user.
    pub fn new<S: Into<String>>(user_id: S) -> Self {
        UserProfile {
            user_id: user_id.into(),
            tag_affinities: HashMap::new(),
            location: None,
            issue_priorities: Vec::new(),
            privacy: PrivacyLevel::default(),
        }
    }

    /// Whether personalization signals may be derived from this profile.
    pub fn allows_personalization(&self) -> bool {
        self.privacy != PrivacyLevel::Private
    }

    /// The user's top-N affinity tags, strongest first; ties broken by tag
    /// name for deterministic output.
    pub fn top_tags(&self, n: usize) -> Vec<String> {
        let mut tags: Vec<(&String, &f64)> = self.tag_affinities.iter().collect();
        tags.sort_by(|a, b| {
            b.1.partial_cmp(a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        tags.into_iter().take(n).map(|(name, _)| name.clone()).collect()
    }
}

/// Cosine similarity between two sparse weighted tag vectors.
///
/// Returns 0.0 when either vector is empty or has zero norm.
pub fn cosine_overlap(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .filter_map(|(key, weight)| b.get(key).map(|other| weight * other))
        .sum();
    let norm_a: f64 = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(40.7, -74.0).is_ok());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 181.0).is_err());
    }

    #[test]
    fn test_haversine_distance() {
        let nyc = GeoPoint::new(40.7128, -74.0060).unwrap();
        let philly = GeoPoint::new(39.9526, -75.1652).unwrap();
        let distance = nyc.distance_to(&philly);

        // NYC to Philadelphia is roughly 130 km.
        assert!(distance > 120.0 && distance < 140.0);
        assert!(nyc.distance_to(&nyc) < 0.001);
    }

    #[test]
    fn test_tag_weight() {
        let tag = Tag::new("clean energy", "environment")
            .with_importance(80)
            .with_depth(1);
        assert!((tag.weight() - 0.8 * 0.8).abs() < 1e-9);

        let top_level = Tag::new("economy", "economy").with_importance(100);
        assert_eq!(top_level.weight(), 1.0);
    }

    #[test]
    fn test_cosine_overlap() {
        let mut a = HashMap::new();
        a.insert("healthcare".to_string(), 0.9);
        a.insert("education".to_string(), 0.4);

        let mut same = HashMap::new();
        same.insert("healthcare".to_string(), 0.9);
        same.insert("education".to_string(), 0.4);
        assert!((cosine_overlap(&a, &same) - 1.0).abs() < 1e-9);

        let disjoint: HashMap<String, f64> =
            [("economy".to_string(), 1.0)].into_iter().collect();
        assert_eq!(cosine_overlap(&a, &disjoint), 0.0);
        assert_eq!(cosine_overlap(&a, &HashMap::new()), 0.0);
    }

    #[test]
    fn test_top_tags_deterministic_ties() {
        let mut profile = UserProfile::new("u1");
        profile.tag_affinities.insert("b-tag".to_string(), 0.5);
        profile.tag_affinities.insert("a-tag".to_string(), 0.5);
        profile.tag_affinities.insert("c-tag".to_string(), 0.9);

        assert_eq!(profile.top_tags(2), vec!["c-tag", "a-tag"]);
    }
}
