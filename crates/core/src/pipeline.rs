//! Tiered data acquisition: metrics lane, analysis lane, and fallback.
//!
//! `get_widget_data` never fails. The metrics lane is served from cache while
//! fresh, otherwise refetched through the [`PlaceLookup`] chain and, when that
//! yields nothing, replaced by synthesized data. The analysis lane is only
//! read here; generating analysis is the separate, explicit `run_analysis`
//! path so slow AI calls never block the metrics path.
//!
//! Overlapping calls for the same key are not de-duplicated; each runs its
//! own fetch and the later write wins.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{
    analysis_key, metrics_key, CacheEntry, CacheLane, CacheStore, FreshnessPolicy, SESSION_KEY,
};
use crate::catalog;
use crate::clock::{Clock, SystemClock};
use crate::config::sanitize_credential;
use crate::domain::analysis::AnalysisResult;
use crate::domain::business::BusinessRecord;
use crate::domain::tier::Tier;
use crate::errors::{AnalysisError, StoreError};
use crate::identifier;
use crate::ports::{PlaceLookup, ReviewSummarizer, SummaryRequest};
use crate::synth::ReviewSynthesizer;

#[derive(Clone, Copy, Debug)]
pub struct WidgetRequest<'a> {
    pub business_id: &'a str,
    pub tier: Tier,
    /// Free-text search; blank means "look up by business id".
    pub query: &'a str,
    /// Places API key supplied by the caller, if any.
    pub credentials: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WidgetData {
    pub record: BusinessRecord,
    pub analysis: Option<AnalysisResult>,
}

/// Last authenticated tier and selected business, kept across invocations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub tier: Tier,
    pub business_id: String,
    pub business_name: Option<String>,
}

pub struct WidgetDataService<S, L, A, C = SystemClock> {
    store: S,
    lookup: L,
    summarizer: A,
    clock: C,
    policy: FreshnessPolicy,
    synthesizer: ReviewSynthesizer,
}

impl<S, L, A> WidgetDataService<S, L, A, SystemClock> {
    pub fn new(store: S, lookup: L, summarizer: A) -> Self {
        Self::with_clock(store, lookup, summarizer, SystemClock)
    }
}

impl<S, L, A, C> WidgetDataService<S, L, A, C> {
    pub fn with_clock(store: S, lookup: L, summarizer: A, clock: C) -> Self {
        Self {
            store,
            lookup,
            summarizer,
            clock,
            policy: FreshnessPolicy::default(),
            synthesizer: ReviewSynthesizer::new(),
        }
    }

    pub fn with_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<S, L, A, C> WidgetDataService<S, L, A, C>
where
    S: CacheStore,
    L: PlaceLookup,
    A: ReviewSummarizer,
    C: Clock,
{
    pub async fn get_widget_data(&self, request: WidgetRequest<'_>) -> WidgetData {
        let credentials = request.credentials.and_then(sanitize_credential);
        let record = self.load_metrics(&request, credentials.as_deref()).await;
        let analysis = self.load_analysis(&record.id, request.tier).await;

        WidgetData { record, analysis }
    }

    /// Always calls the summarizer and overwrites the analysis lane on success.
    pub async fn run_analysis(
        &self,
        record: &BusinessRecord,
        tier: Tier,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!(
            event_name = "widget.analysis.requested",
            business_id = %record.id,
            tier = tier.as_str(),
            review_count = record.reviews.len(),
            "running review summarization"
        );

        let request = SummaryRequest {
            business_name: &record.name,
            reviews: &record.reviews,
            known_services: &record.known_products_or_services,
            tier,
        };
        let draft = self.summarizer.summarize(request).await.map_err(|error| {
            warn!(
                event_name = "widget.analysis.failed",
                business_id = %record.id,
                tier = tier.as_str(),
                error_class = error.error_class(),
                error = %error,
                "review summarization failed"
            );
            error
        })?;

        let analysis = AnalysisResult::from_draft(draft, self.clock.now());
        let entry = CacheEntry::new(analysis.clone(), analysis.last_updated);
        self.write_entry(&analysis_key(&record.id, tier), &entry).await;

        info!(
            event_name = "widget.analysis.generated",
            business_id = %record.id,
            tier = tier.as_str(),
            services = analysis.services.len(),
            loves = analysis.loves.len(),
            "analysis generated and cached"
        );
        Ok(analysis)
    }

    /// Discard all cached state in both lanes, session included.
    pub async fn clear_cache(&self) -> Result<(), StoreError> {
        self.store.clear().await?;
        info!(event_name = "widget.cache.cleared", "cleared all cached widget state");
        Ok(())
    }

    pub async fn save_session(&self, session: &SessionState) -> Result<(), StoreError> {
        let blob = CacheEntry::new(session, self.clock.now()).encode()?;
        self.store.put(SESSION_KEY, blob).await
    }

    pub async fn restore_session(&self) -> Option<SessionState> {
        self.read_entry::<SessionState>(SESSION_KEY).await.map(|entry| entry.data)
    }

    /// Forget the session and everything cached under it.
    pub async fn end_session(&self) -> Result<(), StoreError> {
        self.store.remove(SESSION_KEY).await?;
        self.clear_cache().await
    }

    async fn load_metrics(
        &self,
        request: &WidgetRequest<'_>,
        credentials: Option<&str>,
    ) -> BusinessRecord {
        let key = metrics_key(request.business_id, request.query);
        let now = self.clock.now();

        if let Some(entry) = self.read_entry::<BusinessRecord>(&key).await {
            let fresh = self.policy.is_fresh(CacheLane::Metrics, entry.written_at, now);
            let upgrade = credentials.is_some() && entry.data.is_mock;
            if fresh && !upgrade {
                debug!(
                    event_name = "widget.metrics.cache_hit",
                    business_id = request.business_id,
                    provenance = entry.data.provenance(),
                    "serving cached business metrics"
                );
                return entry.data;
            }
            let reason = if fresh { "mock_upgrade" } else { "stale" };
            debug!(
                event_name = "widget.metrics.cache_invalid",
                business_id = request.business_id,
                reason,
                "cached business metrics will be refetched"
            );
        }

        let record = match self.fetch_live(request, credentials).await {
            Some(record) => record,
            None => {
                info!(
                    event_name = "widget.metrics.fallback_mock",
                    business_id = request.business_id,
                    tier = request.tier.as_str(),
                    "serving synthesized business metrics"
                );
                self.synthesizer.synthesize_record(request.business_id, request.tier, now)
            }
        };

        self.write_entry(&key, &CacheEntry::new(record.clone(), self.clock.now())).await;
        record
    }

    async fn fetch_live(
        &self,
        request: &WidgetRequest<'_>,
        credentials: Option<&str>,
    ) -> Option<BusinessRecord> {
        let Some(credentials) = credentials else {
            debug!(business_id = request.business_id, "no places credentials; skipping lookup");
            return None;
        };
        let target = lookup_target(request.business_id, request.query)?;

        let Some(resource_name) = self.lookup.resolve_identifier(target, Some(credentials)).await
        else {
            warn!(
                event_name = "widget.metrics.lookup_unresolved",
                business_id = request.business_id,
                "place lookup returned no match"
            );
            return None;
        };

        let record =
            self.lookup.fetch_details(&resource_name, Some(credentials), self.clock.now()).await;
        match &record {
            Some(record) => info!(
                event_name = "widget.metrics.fetched_live",
                business_id = request.business_id,
                resource_name = %resource_name,
                review_count = record.reviews.len(),
                "fetched live business metrics"
            ),
            None => warn!(
                event_name = "widget.metrics.details_unavailable",
                business_id = request.business_id,
                resource_name = %resource_name,
                "place details fetch returned nothing"
            ),
        }
        record
    }

    async fn load_analysis(&self, business_id: &str, tier: Tier) -> Option<AnalysisResult> {
        let entry = self.read_entry::<AnalysisResult>(&analysis_key(business_id, tier)).await?;
        if self.policy.is_fresh(CacheLane::Analysis, entry.written_at, self.clock.now()) {
            return Some(entry.data);
        }
        debug!(business_id, tier = tier.as_str(), "cached analysis is stale");
        None
    }

    async fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let blob = match self.store.get(key).await {
            Ok(blob) => blob?,
            Err(error) => {
                warn!(key, error = %error, "cache read failed; treating as miss");
                return None;
            }
        };
        match CacheEntry::decode(blob) {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(key, error = %error, "cache entry undecodable; treating as miss");
                None
            }
        }
    }

    async fn write_entry<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        let result = match entry.encode() {
            Ok(blob) => self.store.put(key, blob).await,
            Err(error) => Err(error),
        };
        if let Err(error) = result {
            warn!(key, error = %error, "cache write failed; continuing without caching");
        }
    }
}

/// Text handed to the lookup chain, or `None` when nothing is searchable.
///
/// A blank query falls back to the business id, except for demo catalog ids
/// that are not place identifiers.
pub fn lookup_target<'a>(business_id: &'a str, query: &'a str) -> Option<&'a str> {
    let query = query.trim();
    if !query.is_empty() {
        return Some(query);
    }

    let business_id = business_id.trim();
    if business_id.is_empty() {
        return None;
    }
    if catalog::find(business_id).is_some() && !identifier::is_place_id(business_id) {
        return None;
    }
    Some(business_id)
}
