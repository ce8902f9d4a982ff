//! The discovery engine facade.
//!
//! Owns every component and the shared stores, wires the search, trending,
//! recommendation, and explore surfaces together, and guarantees the
//! compliance invariant: no content identifier leaves the engine without
//! passing the compliance gate for the requesting context.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::cache::{CacheManager, CacheStore, MemoryCacheStore, Surface};
use crate::compliance::{ComplianceFilter, ComplianceRuleProvider, StaticRuleProvider, ViewerContext};
use crate::config::DiscoveryConfig;
use crate::content::{ContentItem, GeoPoint, UserProfile};
use crate::error::Result;
use crate::explore::ExploreCurator;
use crate::query::{QueryContext, QueryProcessor};
use crate::ranking::{RankingEngine, RankingInput};
use crate::recommend::{
    CollaborativeSource, ContentBasedSource, LocationSource, RecommendationEngine,
    RecommendationSource, SerendipitySource, TrendingSource,
};
use crate::response::{ContentSummary, DiscoveryResponse, ExploreResponse, PageRequest, paginate};
use crate::search::{MemoryIndexClient, SearchIndexClient, SearchOrchestrator};
use crate::store::{
    ContentStore, InteractionEvent, InteractionStore, MemoryContentStore, MemoryInteractionStore,
    MemoryProfileProvider, ProfileProvider,
};
use crate::trending::{BatchStats, TrendingAnalyzer, TrendingScheduler, TrendingStore};

/// One discovery request, transport-agnostic.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    /// Raw query text; empty means browse.
    pub query: String,
    /// Requesting user, if authenticated.
    pub user_id: Option<String>,
    /// Caller location.
    pub location: Option<GeoPoint>,
    /// Region label for location-qualified expansion.
    pub region: Option<String>,
    /// Verified age, if known.
    pub age: Option<u8>,
    /// Jurisdiction code, if known.
    pub jurisdiction: Option<String>,
    /// Pagination.
    pub page: PageRequest,
}

impl DiscoveryRequest {
    /// Create a request for a query.
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Set the requesting user.
    pub fn with_user<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the caller's jurisdiction.
    pub fn with_jurisdiction<S: Into<String>>(mut self, jurisdiction: S) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    /// Set pagination.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    fn query_context(&self) -> QueryContext {
        QueryContext {
            user_id: self.user_id.clone(),
            location: self.location,
            region: self.region.clone(),
        }
    }

    fn viewer_context(&self) -> ViewerContext {
        ViewerContext {
            user_id: self.user_id.clone(),
            age: self.age,
            jurisdiction: self.jurisdiction.clone(),
        }
    }
}

/// External collaborators the engine is built over.
pub struct Collaborators {
    /// One client per search index.
    pub index_clients: Vec<Arc<dyn SearchIndexClient>>,
    /// Content records.
    pub content: Arc<dyn ContentStore>,
    /// Interaction log.
    pub interactions: Arc<dyn InteractionStore>,
    /// Profile snapshots.
    pub profiles: Arc<dyn ProfileProvider>,
    /// Compliance rule data.
    pub rules: Arc<dyn ComplianceRuleProvider>,
    /// Cache store; `None` disables caching.
    pub cache_store: Option<Arc<dyn CacheStore>>,
}

/// Result of a discovery call: ranked results for a query, or the explore
/// surface for an empty (browse) query.
#[derive(Debug)]
pub enum Discovery {
    /// Ranked search results.
    Ranked(DiscoveryResponse),
    /// Browse sections for an empty query.
    Browse(ExploreResponse),
}

/// The assembled discovery engine.
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    processor: QueryProcessor,
    orchestrator: SearchOrchestrator,
    ranking: RankingEngine,
    recommender: RecommendationEngine,
    curator: ExploreCurator,
    compliance: Arc<ComplianceFilter>,
    cache: CacheManager,
    trending_store: Arc<TrendingStore>,
    analyzer: Arc<TrendingAnalyzer>,
    scheduler: TrendingScheduler,
    content: Arc<dyn ContentStore>,
    interactions: Arc<dyn InteractionStore>,
    profiles: Arc<dyn ProfileProvider>,
}

impl DiscoveryEngine {
    /// Assemble an engine from its configuration and collaborators.
    pub fn new(config: DiscoveryConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            index_clients,
            content,
            interactions,
            profiles,
            rules,
            cache_store,
        } = collaborators;

        let compliance = Arc::new(ComplianceFilter::new(rules));
        let trending_store = Arc::new(TrendingStore::new());

        let analyzer = Arc::new(TrendingAnalyzer::new(
            config.trending.clone(),
            Arc::clone(&content),
            Arc::clone(&interactions),
            Arc::clone(&compliance),
            Arc::clone(&trending_store),
        ));
        let scheduler = TrendingScheduler::new(
            Arc::clone(&analyzer),
            Arc::clone(&interactions),
            config.trending.queue_capacity,
            config.trending.batch_interval,
            config.trending.recompute_workers,
        );

        let sources: Vec<Arc<dyn RecommendationSource>> = vec![
            Arc::new(ContentBasedSource::new(
                Arc::clone(&content),
                config.recommendation.min_similarity,
            )),
            Arc::new(CollaborativeSource::new(Arc::clone(&interactions))),
            Arc::new(TrendingSource::new(
                Arc::clone(&trending_store),
                config.trending.min_score,
            )),
            Arc::new(LocationSource::new(
                Arc::clone(&content),
                config.recommendation.location_radius_km,
            )),
            Arc::new(SerendipitySource::new(
                Arc::clone(&content),
                Arc::clone(&interactions),
                config.recommendation.tag_growth_threshold,
                config.trending.window,
            )),
        ];

        Ok(Self {
            processor: QueryProcessor::new(config.query.clone()),
            orchestrator: SearchOrchestrator::new(index_clients, config.search.clone()),
            ranking: RankingEngine::new(config.ranking.clone()),
            recommender: RecommendationEngine::new(sources, config.recommendation.clone()),
            curator: ExploreCurator::new(
                config.explore.clone(),
                Arc::clone(&content),
                Arc::clone(&trending_store),
                Arc::clone(&compliance),
                config.trending.min_score,
            ),
            cache: CacheManager::new(cache_store, config.cache.clone()),
            compliance,
            trending_store,
            analyzer,
            scheduler,
            content,
            interactions,
            profiles,
            config,
        })
    }

    /// Assemble a fully in-memory engine, for tests, benches, and the CLI.
    pub fn in_memory(
        config: DiscoveryConfig,
        items: Vec<ContentItem>,
        profiles: Vec<UserProfile>,
        events: Vec<InteractionEvent>,
    ) -> Result<Self> {
        let content = Arc::new(MemoryContentStore::with_items(items));
        Self::new(
            config,
            Collaborators {
                index_clients: MemoryIndexClient::all(Arc::clone(&content)),
                content,
                interactions: Arc::new(MemoryInteractionStore::with_events(events)),
                profiles: Arc::new(MemoryProfileProvider::with_profiles(profiles)),
                rules: Arc::new(StaticRuleProvider::default()),
                cache_store: Some(Arc::new(MemoryCacheStore::new())),
            },
        )
    }

    /// Run a discovery request: search for a query, explore for an empty
    /// one.
    pub async fn discover(&self, request: &DiscoveryRequest) -> Result<Discovery> {
        let query_context = request.query_context();
        let viewer = request.viewer_context();
        let processed = self.processor.process(&request.query, &query_context)?;

        if processed.is_browse() {
            return Ok(Discovery::Browse(self.explore(request)?));
        }

        let now = Utc::now();
        let offset = request.page.offset()?;
        let cache_key = format!(
            "{}|{}|{}|{offset}|{}",
            processed.intent.as_str(),
            processed.cleaned,
            request.user_id.as_deref().unwrap_or("-"),
            request.page.limit,
        );

        if let Some(cached) = self
            .cache
            .fetch::<DiscoveryResponse>(Surface::Search, &cache_key, now)
        {
            return Ok(Discovery::Ranked(cached));
        }

        let outcome = self.orchestrator.dispatch(&processed).await?;
        let degraded = outcome.is_degraded();

        let profile = request
            .user_id
            .as_deref()
            .and_then(|id| self.profiles.profile(id));

        let mut items_by_id: HashMap<String, ContentItem> = HashMap::new();
        let inputs: Vec<RankingInput> = outcome
            .candidates
            .into_iter()
            .filter_map(|candidate| {
                let Some(item) = self.content.get(&candidate.content_id) else {
                    debug!(content_id = %candidate.content_id, "candidate missing from content store");
                    return None;
                };
                let engagement = self.interactions.total_engagement(&candidate.content_id);
                items_by_id.insert(item.id.clone(), item.clone());
                Some(RankingInput {
                    candidate,
                    item,
                    engagement,
                })
            })
            .collect();

        let scored = self.ranking.rank(now, profile.as_ref(), inputs);

        // The mandatory compliance gate.
        let mut summaries = Vec::with_capacity(scored.len());
        for result in scored {
            let Some(item) = items_by_id.get(&result.content_id) else {
                continue;
            };
            let verdict = self.compliance.evaluate(item, &viewer, now);
            if !verdict.passed {
                continue;
            }
            summaries.push(
                ContentSummary::from_item(item, result.combined, verdict.warnings)
                    .with_breakdown(result.scores),
            );
        }

        let response = paginate(summaries, offset, request.page.limit, degraded);
        info!(
            query = %processed.cleaned,
            intent = processed.intent.as_str(),
            results = response.results.len(),
            total = response.total_estimate,
            degraded,
            latency_ms = (Utc::now() - processed.started_at).num_milliseconds(),
            "search request served"
        );

        self.cache.put(Surface::Search, &cache_key, &response, now);
        Ok(Discovery::Ranked(response))
    }

    /// Blended recommendations for a user.
    pub async fn recommend(
        &self,
        user_id: &str,
        viewer: &ViewerContext,
        limit: usize,
    ) -> Result<DiscoveryResponse> {
        let now = Utc::now();
        let cache_key = format!("{user_id}|{limit}");

        if let Some(cached) =
            self.cache
                .fetch::<DiscoveryResponse>(Surface::Recommendations, &cache_key, now)
        {
            return Ok(cached);
        }

        let profile = self.profiles.profile(user_id);
        let outcome = self.recommender.recommend(profile.as_ref()).await?;
        let degraded = !outcome.degraded.is_empty();

        let mut summaries = Vec::new();
        for candidate in outcome.candidates {
            let Some(item) = self.content.get(&candidate.content_id) else {
                continue;
            };
            let verdict = self.compliance.evaluate(&item, viewer, now);
            if !verdict.passed {
                continue;
            }
            summaries.push(ContentSummary::from_item(
                &item,
                candidate.combined,
                verdict.warnings,
            ));
        }

        let response = paginate(summaries, 0, limit, degraded);
        self.cache
            .put(Surface::Recommendations, &cache_key, &response, now);
        Ok(response)
    }

    /// The current trending list.
    pub fn trending(&self, viewer: &ViewerContext, limit: usize) -> Result<DiscoveryResponse> {
        let now = Utc::now();
        let cache_key = format!(
            "{}|{limit}",
            viewer.jurisdiction.as_deref().unwrap_or("-")
        );

        if let Some(cached) =
            self.cache
                .fetch::<DiscoveryResponse>(Surface::Trending, &cache_key, now)
        {
            return Ok(cached);
        }

        let records = self
            .trending_store
            .top(self.config.trending.max_items, self.config.trending.min_score);

        let mut summaries = Vec::new();
        for record in records {
            let Some(item) = self.content.get(&record.content_id) else {
                continue;
            };
            let verdict = self.compliance.evaluate(&item, viewer, now);
            if !verdict.passed {
                continue;
            }
            summaries.push(ContentSummary::from_item(
                &item,
                record.score,
                verdict.warnings,
            ));
        }

        let response = paginate(summaries, 0, limit, false);
        self.cache.put(Surface::Trending, &cache_key, &response, now);
        Ok(response)
    }

    /// The explore surface for a browse request.
    pub fn explore(&self, request: &DiscoveryRequest) -> Result<ExploreResponse> {
        let now = Utc::now();
        let viewer = request.viewer_context();
        let cache_key = request.user_id.clone().unwrap_or_else(|| "-".to_string());

        if let Some(cached) = self
            .cache
            .fetch::<ExploreResponse>(Surface::Explore, &cache_key, now)
        {
            return Ok(cached);
        }

        let profile = request
            .user_id
            .as_deref()
            .and_then(|id| self.profiles.profile(id));

        let sections = self.curator.curate(profile.as_ref(), &viewer, now);
        let response = ExploreResponse { sections };

        self.cache.put(Surface::Explore, &cache_key, &response, now);
        Ok(response)
    }

    /// Ingest one interaction event; high-impact events trigger an
    /// asynchronous targeted trending recompute.
    pub fn observe_interaction(&self, event: InteractionEvent) {
        self.scheduler.observe_interaction(event);
    }

    /// Run one synchronous trending batch pass.
    pub fn run_trending_pass(&self) -> BatchStats {
        self.analyzer.batch_pass(Utc::now())
    }

    /// Start background trending recomputation.
    pub fn start_background(&self) -> Result<()> {
        self.scheduler.start()
    }

    /// Stop background trending recomputation.
    pub fn shutdown(&self) {
        self.scheduler.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::content::{ContentType, Tag};

    fn item(id: &str, title: &str, tag: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type: ContentType::Fundraiser,
            title: title.to_string(),
            description: Some("a fundraiser for the cause".to_string()),
            tags: vec![Tag::new(tag, "cause")],
            location: None,
            created_at: Utc::now() - chrono::Duration::days(1),
            starts_at: None,
            organization_id: Some("org".to_string()),
            verified_owner: true,
            moderation: Default::default(),
            age_restricted: false,
            jurisdictions: Vec::new(),
            funding_disclosure: Some("disclosure".to_string()),
        }
    }

    fn engine(items: Vec<ContentItem>) -> DiscoveryEngine {
        DiscoveryEngine::in_memory(DiscoveryConfig::default(), items, Vec::new(), Vec::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_query_routes_to_browse() {
        let engine = engine(vec![item("a", "healthcare drive", "healthcare")]);
        let discovery = engine
            .discover(&DiscoveryRequest::new(""))
            .await
            .unwrap();
        assert!(matches!(discovery, Discovery::Browse(_)));
    }

    #[tokio::test]
    async fn test_query_returns_ranked_results() {
        let engine = engine(vec![item("a", "healthcare drive", "healthcare")]);
        let discovery = engine
            .discover(&DiscoveryRequest::new("healthcare"))
            .await
            .unwrap();

        match discovery {
            Discovery::Ranked(response) => {
                assert_eq!(response.results.len(), 1);
                assert_eq!(response.results[0].content_id, "a");
                assert!(response.results[0].breakdown.is_some());
            }
            Discovery::Browse(_) => panic!("expected ranked results"),
        }
    }

    #[tokio::test]
    async fn test_non_compliant_item_never_returned() {
        let mut bad = item("bad", "healthcare drive", "healthcare");
        bad.funding_disclosure = None;

        let engine = engine(vec![bad, item("good", "healthcare rally", "healthcare")]);
        let discovery = engine
            .discover(&DiscoveryRequest::new("healthcare"))
            .await
            .unwrap();

        match discovery {
            Discovery::Ranked(response) => {
                assert!(response.results.iter().all(|r| r.content_id != "bad"));
                assert!(response.results.iter().any(|r| r.content_id == "good"));
            }
            Discovery::Browse(_) => panic!("expected ranked results"),
        }
    }

    #[tokio::test]
    async fn test_no_matches_is_empty_success() {
        let engine = engine(vec![item("a", "healthcare drive", "healthcare")]);
        let discovery = engine
            .discover(&DiscoveryRequest::new("zebra migration"))
            .await
            .unwrap();

        match discovery {
            Discovery::Ranked(response) => {
                assert!(response.results.is_empty());
                assert_eq!(response.total_estimate, 0);
            }
            Discovery::Browse(_) => panic!("expected ranked results"),
        }
    }

    #[tokio::test]
    async fn test_trending_surface_gated() {
        let mut bad = item("bad", "drive", "cause");
        bad.funding_disclosure = None;
        let engine = engine(vec![bad]);

        // Force a record into the store to prove the serve-time gate drops
        // it regardless of trending score.
        engine.trending_store.upsert(crate::trending::TrendingRecord {
            content_id: "bad".to_string(),
            signals: crate::trending::TrendingSignals {
                velocity: 1.0,
                amplification: 1.0,
                quality: 1.0,
                diversity: 1.0,
                compliance: 1.0,
            },
            score: 0.9,
            computed_at: Utc::now(),
        });

        let response = engine.trending(&ViewerContext::anonymous(), 10).unwrap();
        assert!(response.results.is_empty());
    }
}
