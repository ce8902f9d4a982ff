//! In-memory store implementations for tests, benches, and the CLI.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::content::{ContentItem, ContentType, GeoPoint, Tag, UserProfile};
use crate::store::traits::{
    ContentStore, InteractionEvent, InteractionStats, InteractionStore, ProfileProvider,
};

/// Number of preceding windows averaged into the interaction baseline.
const BASELINE_WINDOWS: i32 = 3;

/// In-memory content catalog.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    items: RwLock<HashMap<String, ContentItem>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `items`.
    pub fn with_items(items: Vec<ContentItem>) -> Self {
        let store = Self::new();
        for item in items {
            store.insert(item);
        }
        store
    }

    /// Insert or replace an item.
    pub fn insert(&self, item: ContentItem) {
        self.items.write().insert(item.id.clone(), item);
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Snapshot of every item, ordered by identifier for determinism.
    pub fn snapshot(&self) -> Vec<ContentItem> {
        let mut items: Vec<ContentItem> = self.items.read().values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }
}

impl ContentStore for MemoryContentStore {
    fn get(&self, id: &str) -> Option<ContentItem> {
        self.items.read().get(id).cloned()
    }

    fn get_many(&self, ids: &[String]) -> Vec<ContentItem> {
        let items = self.items.read();
        ids.iter().filter_map(|id| items.get(id).cloned()).collect()
    }

    fn by_tag(&self, tag: &str, limit: usize) -> Vec<ContentItem> {
        let mut matches: Vec<ContentItem> = self
            .items
            .read()
            .values()
            .filter(|item| item.tags.iter().any(|t| t.name == tag))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(limit);
        matches
    }

    fn created_since(&self, since: DateTime<Utc>, limit: usize) -> Vec<ContentItem> {
        let mut matches: Vec<ContentItem> = self
            .items
            .read()
            .values()
            .filter(|item| item.created_at >= since)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(limit);
        matches
    }

    fn near(&self, center: &GeoPoint, radius_km: f64, limit: usize) -> Vec<ContentItem> {
        let mut matches: Vec<(f64, ContentItem)> = self
            .items
            .read()
            .values()
            .filter_map(|item| {
                let location = item.location.as_ref()?;
                let distance = center.distance_to(location);
                (distance <= radius_km).then(|| (distance, item.clone()))
            })
            .collect();
        matches.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        matches.into_iter().take(limit).map(|(_, item)| item).collect()
    }

    fn upcoming_events(
        &self,
        now: DateTime<Utc>,
        horizon: Duration,
        limit: usize,
    ) -> Vec<ContentItem> {
        let end = now + chrono::Duration::from_std(horizon).unwrap_or_default();
        let mut matches: Vec<ContentItem> = self
            .items
            .read()
            .values()
            .filter(|item| {
                item.content_type == ContentType::Event
                    && item
                        .starts_at
                        .map(|starts| starts >= now && starts <= end)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(limit);
        matches
    }

    fn popular_tags(&self, limit: usize) -> Vec<Tag> {
        let items = self.items.read();
        let mut counts: HashMap<String, (u64, Tag)> = HashMap::new();
        for item in items.values() {
            for tag in &item.tags {
                counts
                    .entry(tag.name.clone())
                    .and_modify(|(count, _)| *count += 1)
                    .or_insert((1, tag.clone()));
            }
        }
        let mut tags: Vec<(u64, Tag)> = counts.into_values().collect();
        tags.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
        tags.into_iter().take(limit).map(|(_, tag)| tag).collect()
    }
}

/// In-memory interaction log.
#[derive(Debug, Default)]
pub struct MemoryInteractionStore {
    events: RwLock<Vec<InteractionEvent>>,
}

impl MemoryInteractionStore {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log pre-populated with `events`.
    pub fn with_events(events: Vec<InteractionEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    fn window_count(
        events: &[InteractionEvent],
        content_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> u64 {
        events
            .iter()
            .filter(|e| e.content_id == content_id && e.at >= start && e.at < end)
            .count() as u64
    }
}

impl InteractionStore for MemoryInteractionStore {
    fn record(&self, event: InteractionEvent) {
        self.events.write().push(event);
    }

    fn stats(&self, content_id: &str, window: Duration, now: DateTime<Utc>) -> InteractionStats {
        let window = chrono::Duration::from_std(window).unwrap_or_default();
        let events = self.events.read();
        let window_start = now - window;

        let mut baseline_total = 0u64;
        for i in 1..=BASELINE_WINDOWS {
            let end = now - window * i;
            let start = now - window * (i + 1);
            baseline_total += Self::window_count(&events, content_id, start, end);
        }

        let in_window = |e: &&InteractionEvent| {
            e.content_id == content_id && e.at >= window_start && e.at < now
        };

        InteractionStats {
            window_count: events.iter().filter(in_window).count() as u64,
            baseline_count: baseline_total as f64 / BASELINE_WINDOWS as f64,
            shares: events
                .iter()
                .filter(in_window)
                .filter(|e| e.kind == super::traits::InteractionKind::Share)
                .count() as u64,
            mentions: events
                .iter()
                .filter(in_window)
                .filter(|e| e.kind == super::traits::InteractionKind::Mention)
                .count() as u64,
            cross_surface: events
                .iter()
                .filter(in_window)
                .filter(|e| e.kind == super::traits::InteractionKind::CrossSurface)
                .count() as u64,
        }
    }

    fn total_engagement(&self, content_id: &str) -> u64 {
        self.events
            .read()
            .iter()
            .filter(|e| e.content_id == content_id)
            .count() as u64
    }

    fn active_ids(&self, window: Duration, now: DateTime<Utc>) -> Vec<String> {
        let window = chrono::Duration::from_std(window).unwrap_or_default();
        let start = now - window;
        let mut ids: Vec<String> = self
            .events
            .read()
            .iter()
            .filter(|e| e.at >= start && e.at < now)
            .map(|e| e.content_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    fn tag_growth(&self, tag: &str, window: Duration, now: DateTime<Utc>) -> f64 {
        let window = chrono::Duration::from_std(window).unwrap_or_default();
        let events = self.events.read();

        let count_in = |start: DateTime<Utc>, end: DateTime<Utc>| {
            events
                .iter()
                .filter(|e| e.at >= start && e.at < end && e.tags.iter().any(|t| t == tag))
                .count() as f64
        };

        let current = count_in(now - window, now);
        let mut baseline = 0.0;
        for i in 1..=BASELINE_WINDOWS {
            baseline += count_in(now - window * (i + 1), now - window * i);
        }
        baseline /= BASELINE_WINDOWS as f64;

        if baseline == 0.0 { current } else { current / baseline }
    }

    fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .events
            .read()
            .iter()
            .filter_map(|e| e.user_id.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }

    fn user_item_scores(&self, user_id: &str) -> HashMap<String, f64> {
        let mut scores: HashMap<String, f64> = HashMap::new();
        for event in self.events.read().iter() {
            if event.user_id.as_deref() != Some(user_id) {
                continue;
            }
            let strength = event.kind.signal_strength();
            let entry = scores.entry(event.content_id.clone()).or_insert(0.0);
            if strength > *entry {
                *entry = strength;
            }
        }
        scores
    }
}

/// In-memory profile provider.
#[derive(Debug, Default)]
pub struct MemoryProfileProvider {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryProfileProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider pre-populated with `profiles`.
    pub fn with_profiles(profiles: Vec<UserProfile>) -> Self {
        let provider = Self::new();
        for profile in profiles {
            provider.insert(profile);
        }
        provider
    }

    /// Insert or replace a profile.
    pub fn insert(&self, profile: UserProfile) {
        self.profiles
            .write()
            .insert(profile.user_id.clone(), profile);
    }
}

impl ProfileProvider for MemoryProfileProvider {
    fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles.read().get(user_id).cloned()
    }
}
